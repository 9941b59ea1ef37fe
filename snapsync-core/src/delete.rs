use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::remote::RemoteFs;

/// Counters for one recursive delete.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeleteReport {
    pub files: usize,
    pub dirs:  usize,
}

/// Remove `root` and everything under it, children before parents.
///
/// A missing root counts as already done. Entries that vanish while the
/// walk runs are tolerated; any other failure stops the walk so that a
/// half-deleted tree surfaces as an error instead of a silent success.
pub async fn remove_tree<R: RemoteFs + ?Sized>(remote: &R, root: &str) -> Result<DeleteReport> {
    match remote.stat(root).await {
        Ok(entry) if entry.is_dir => {}
        Ok(_) => return Err(SyncError::NotADirectory(root.to_string())),
        Err(SyncError::NotFound(_)) => {
            warn!(root, "nothing to delete");
            return Ok(DeleteReport::default());
        }
        Err(err) => return Err(err),
    }

    // Iterative post-order: a directory is listed on first visit and
    // removed on the second, after its children are gone.
    let mut report = DeleteReport::default();
    let mut stack: Vec<(String, bool)> = vec![(root.to_string(), false)];
    while let Some((dir, visited)) = stack.pop() {
        if visited {
            match remote.rmdir(&dir).await {
                Ok(()) => report.dirs += 1,
                // Someone else finished this directory for us.
                Err(SyncError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
            continue;
        }
        stack.push((dir.clone(), true));
        let entries = match remote.list(&dir).await {
            Ok(entries) => entries,
            Err(SyncError::NotFound(_)) => continue,
            Err(err) => return Err(err),
        };
        for entry in entries {
            if entry.is_dir {
                stack.push((entry.path, false));
            } else {
                match remote.remove(&entry.path).await {
                    Ok(()) => report.files += 1,
                    Err(SyncError::NotFound(_)) => {}
                    Err(err) => return Err(err),
                }
            }
        }
    }
    debug!(root, files = report.files, dirs = report.dirs, "tree removed");
    Ok(report)
}
