use std::io;
use std::path::Path;

use tracing::{debug, info};

use crate::ensure::DirEnsurer;
use crate::error::{Result, SyncError};
use crate::filter::PathFilter;
use crate::remote::RemoteFs;
use crate::utils::{join_remote_rel, remote_parent};
use crate::walk::walk_tree;

/// Counters for one tree sync.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Files copied to the remote this run.
    pub uploaded:     usize,
    /// Files whose name was already present remotely.
    pub skipped:      usize,
    /// Files the include/exclude filter kept out.
    pub excluded:     usize,
    /// Remote directories created this run.
    pub dirs_created: usize,
}

/// Mirror the tree under `local_root` into `remote_root`.
///
/// Directory structure is recreated, empty directories included. A file is
/// uploaded only when nothing with its name exists remotely; presence is
/// judged by name, so a locally modified file is not re-sent. The filter
/// applies to files, via their root-relative paths.
pub async fn sync_tree<R: RemoteFs + ?Sized>(
    remote: &R,
    local_root: &Path,
    remote_root: &str,
    filter: &PathFilter,
) -> Result<SyncReport> {
    match tokio::fs::metadata(local_root).await {
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(SyncError::NotFound(local_root.display().to_string()))
        }
        Err(err) => return Err(err.into()),
        Ok(meta) if !meta.is_dir() => {
            return Err(SyncError::NotADirectory(local_root.display().to_string()))
        }
        Ok(_) => {}
    }

    let entries = walk_tree(local_root)?;
    let mut ensurer = DirEnsurer::new(remote);
    ensurer.ensure(remote_root).await?;

    let mut report = SyncReport::default();
    for entry in entries {
        let rel = &entry.rel_path;
        if entry.is_dir {
            ensurer.ensure(&join_remote_rel(remote_root, rel)).await?;
            continue;
        }
        if !filter.allows(rel) {
            report.excluded += 1;
            continue;
        }
        let remote_path = join_remote_rel(remote_root, rel);
        match remote.stat(&remote_path).await {
            Ok(_) => {
                debug!(path = %remote_path, "already present, skipping");
                report.skipped += 1;
            }
            Err(SyncError::NotFound(_)) => {
                if let Some(parent) = remote_parent(&remote_path) {
                    ensurer.ensure(parent).await?;
                }
                remote.put(&entry.abs_path, &remote_path).await?;
                info!(local = %entry.abs_path.display(), remote = %remote_path, "uploaded");
                report.uploaded += 1;
            }
            Err(err) => return Err(err),
        }
    }
    report.dirs_created = ensurer.created();
    info!(
        uploaded = report.uploaded,
        skipped = report.skipped,
        excluded = report.excluded,
        dirs_created = report.dirs_created,
        "sync finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Pattern;
    use crate::testing::MemRemote;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        fs::create_dir(tmp.path().join("empty")).unwrap();
        fs::write(tmp.path().join("a/b/f.txt"), b"deep").unwrap();
        fs::write(tmp.path().join("top.txt"), b"shallow").unwrap();
        tmp
    }

    #[tokio::test]
    async fn mirrors_structure_and_uploads() {
        let tmp = tree();
        let remote = MemRemote::new();
        let report = sync_tree(&remote, tmp.path(), "mirror", &PathFilter::all())
            .await
            .unwrap();

        assert_eq!(report.uploaded, 2);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.dirs_created, 4); // mirror, a, a/b, empty
        assert_eq!(remote.contents("mirror/a/b/f.txt").unwrap(), b"deep");
        assert_eq!(remote.contents("mirror/top.txt").unwrap(), b"shallow");
        assert!(remote.exists("mirror/empty"));
    }

    #[tokio::test]
    async fn second_run_uploads_nothing() {
        let tmp = tree();
        let remote = MemRemote::new();
        sync_tree(&remote, tmp.path(), "mirror", &PathFilter::all())
            .await
            .unwrap();
        let puts_before = remote.puts();

        let report = sync_tree(&remote, tmp.path(), "mirror", &PathFilter::all())
            .await
            .unwrap();
        assert_eq!(report.uploaded, 0);
        assert_eq!(report.skipped, 2);
        assert_eq!(remote.puts(), puts_before);
    }

    #[tokio::test]
    async fn changed_file_is_not_resent() {
        let tmp = tree();
        let remote = MemRemote::new();
        sync_tree(&remote, tmp.path(), "mirror", &PathFilter::all())
            .await
            .unwrap();

        fs::write(tmp.path().join("top.txt"), b"edited").unwrap();
        let report = sync_tree(&remote, tmp.path(), "mirror", &PathFilter::all())
            .await
            .unwrap();
        assert_eq!(report.uploaded, 0);
        assert_eq!(remote.contents("mirror/top.txt").unwrap(), b"shallow");
    }

    #[tokio::test]
    async fn filter_excludes_files_not_dirs() {
        let tmp = tree();
        let remote = MemRemote::new();
        let filter = PathFilter::new(&[], &[Pattern("**/*.txt".into())]);
        let report = sync_tree(&remote, tmp.path(), "mirror", &filter).await.unwrap();

        assert_eq!(report.uploaded, 0);
        assert_eq!(report.excluded, 2);
        assert!(remote.exists("mirror/a/b"), "structure is still mirrored");
        assert!(!remote.exists("mirror/top.txt"));
    }

    #[tokio::test]
    async fn local_root_preconditions() {
        let tmp = tempfile::tempdir().unwrap();
        let remote = MemRemote::new();

        let missing = tmp.path().join("nope");
        let err = sync_tree(&remote, &missing, "m", &PathFilter::all())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));

        let file = tmp.path().join("f");
        fs::write(&file, b"x").unwrap();
        let err = sync_tree(&remote, &file, "m", &PathFilter::all())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotADirectory(_)));
        assert!(remote.ops().is_empty(), "no remote traffic before checks pass");
    }
}
