use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::warn;

use crate::config::{BackupConfig, Pattern};

/// Runtime filter compiled from include / exclude pattern lists.
///
/// Applied to paths relative to the tree root, so patterns are written
/// against `sub/dir/file.ext` shapes.
#[derive(Debug, Clone)]
pub struct PathFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl PathFilter {
    /// Build a filter from lists. An empty include list means "include all".
    /// Patterns that fail to compile are skipped with a warning.
    pub fn new(include: &[Pattern], exclude: &[Pattern]) -> Self {
        Self {
            include: compile(include, "include"),
            exclude: compile(exclude, "exclude"),
        }
    }

    pub fn from_config(cfg: &BackupConfig) -> Self {
        Self::new(&cfg.include, &cfg.exclude)
    }

    /// A filter that lets every path through.
    pub fn all() -> Self {
        Self::new(&[], &[])
    }

    /// Whether a relative path takes part in the sync.
    pub fn allows<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = path.as_ref();
        let included = self.include.is_empty() || self.include.is_match(path);
        included && !self.exclude.is_match(path)
    }
}

fn compile(patterns: &[Pattern], kind: &str) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        match Glob::new(&pat.0) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(err) => warn!(pattern = %pat.0, %err, "skipping bad {kind} pattern"),
        }
    }
    builder.build().unwrap_or_else(|_| GlobSet::empty())
}
