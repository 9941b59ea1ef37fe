use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::error::Result;

/// One local entry found under a sync root.
#[derive(Debug, Clone)]
pub struct LocalEntry {
    pub abs_path: PathBuf,
    /// Path relative to the walk root; what filters and remote joins use.
    pub rel_path: PathBuf,
    pub is_dir:   bool,
    pub is_file:  bool,
}

/// Collect the tree under `root`, depth-first, parents before children.
/// The root itself is not part of the listing. Symlinks, sockets and other
/// special files are skipped with a warning; an unreadable entry fails the
/// whole walk so a partial tree is never mistaken for the full one.
pub fn walk_tree(root: &Path) -> Result<Vec<LocalEntry>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        let file_type = entry.file_type();
        if !file_type.is_file() && !file_type.is_dir() {
            warn!(path = %entry.path().display(), "skipping special file");
            continue;
        }
        let abs_path = entry.into_path();
        let rel_path = abs_path
            .strip_prefix(root)
            .unwrap_or(&abs_path)
            .to_path_buf();
        entries.push(LocalEntry {
            abs_path,
            rel_path,
            is_dir: file_type.is_dir(),
            is_file: file_type.is_file(),
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parents_come_before_children() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/f.txt"), b"x").unwrap();
        fs::write(root.join("top.txt"), b"y").unwrap();

        let entries = walk_tree(root).unwrap();
        let rels: Vec<String> = entries
            .iter()
            .map(|e| e.rel_path.to_string_lossy().replace('\\', "/"))
            .collect();
        let pos = |name: &str| rels.iter().position(|r| r == name).unwrap();
        assert!(pos("a") < pos("a/b"));
        assert!(pos("a/b") < pos("a/b/f.txt"));
        assert!(rels.contains(&"top.txt".to_string()));
        assert_eq!(entries.len(), 4);
        let b = entries.iter().find(|e| e.rel_path.ends_with("b")).unwrap();
        assert!(b.is_dir && !b.is_file);
    }

    #[test]
    fn missing_root_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(walk_tree(&tmp.path().join("nope")).is_err());
    }
}
