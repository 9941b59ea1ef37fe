use std::num::NonZeroU32;

use tracing::{debug, error, info};

use crate::error::{Result, SyncError};
use crate::remote::RemoteFs;

/// Counters for one retention pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RetentionReport {
    /// Files considered; directories are never candidates.
    pub examined: usize,
    /// Files deleted as beyond the limit.
    pub removed:  usize,
}

/// Delete the oldest files in `dir` until at most `limit` remain.
///
/// Subdirectories are left alone. Each deletion is independent: one failure
/// does not stop the pass, and the collected failure count surfaces as
/// `RetentionIncomplete` after every candidate has been attempted.
pub async fn enforce_retention<R: RemoteFs + ?Sized>(
    remote: &R,
    dir: &str,
    limit: NonZeroU32,
) -> Result<RetentionReport> {
    let mut files: Vec<_> = remote
        .list(dir)
        .await?
        .into_iter()
        .filter(|e| !e.is_dir)
        .collect();
    let examined = files.len();

    // Newest first; everything past the limit goes.
    files.sort_by(|a, b| b.recency_key().cmp(&a.recency_key()));
    let keep = (limit.get() as usize).min(files.len());
    let doomed = files.split_off(keep);

    let mut failed = 0usize;
    let mut removed = 0usize;
    for entry in &doomed {
        match remote.remove(&entry.path).await {
            Ok(()) => {
                debug!(path = %entry.path, "pruned old archive");
                removed += 1;
            }
            Err(err) => {
                error!(path = %entry.path, %err, "failed to prune");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(SyncError::RetentionIncomplete {
            dir: dir.to_string(),
            failed,
            attempted: doomed.len(),
        });
    }
    if removed > 0 {
        info!(dir, removed, kept = keep, "retention enforced");
    }
    Ok(RetentionReport { examined, removed })
}
