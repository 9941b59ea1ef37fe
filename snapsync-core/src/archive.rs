use std::io;
use std::num::NonZeroU32;
use std::path::PathBuf;

use tracing::info;

use crate::ensure::DirEnsurer;
use crate::error::{Result, SyncError};
use crate::remote::RemoteFs;
use crate::retention::{enforce_retention, RetentionReport};
use crate::utils::join_remote;

/// A local archive destined for one remote directory.
#[derive(Debug, Clone)]
pub struct BackupArchive {
    pub local_path: PathBuf,
    pub remote_dir: String,
}

impl BackupArchive {
    pub fn new(local_path: impl Into<PathBuf>, remote_dir: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            remote_dir: remote_dir.into(),
        }
    }

    /// Name under the remote directory, taken from the local file name.
    pub fn file_name(&self) -> Result<&str> {
        self.local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SyncError::InvalidPath(self.local_path.display().to_string()))
    }

    pub fn remote_path(&self) -> Result<String> {
        Ok(join_remote(&self.remote_dir, self.file_name()?))
    }
}

/// Result of one archive upload.
#[derive(Debug, Clone)]
pub struct ArchiveReport {
    /// Where the archive landed.
    pub remote_path: String,
    pub retention:   RetentionReport,
}

/// Upload one archive, then prune old ones in the same directory.
///
/// The remote directory chain is created as needed. A name collision fails
/// `AlreadyExists` before any byte is sent; snapshot names are expected to
/// be unique. Retention runs only after a successful upload, so a failed
/// transfer never deletes anything.
pub async fn upload_archive<R: RemoteFs + ?Sized>(
    remote: &R,
    archive: &BackupArchive,
    limit: NonZeroU32,
) -> Result<ArchiveReport> {
    let meta = tokio::fs::metadata(&archive.local_path)
        .await
        .map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => {
                SyncError::NotFound(archive.local_path.display().to_string())
            }
            _ => err.into(),
        })?;
    if !meta.is_file() {
        return Err(SyncError::InvalidPath(
            archive.local_path.display().to_string(),
        ));
    }

    let remote_path = archive.remote_path()?;
    let mut ensurer = DirEnsurer::new(remote);
    ensurer.ensure(&archive.remote_dir).await?;

    match remote.stat(&remote_path).await {
        Ok(_) => return Err(SyncError::AlreadyExists(remote_path)),
        Err(SyncError::NotFound(_)) => {}
        Err(err) => return Err(err),
    }
    remote.put(&archive.local_path, &remote_path).await?;
    info!(remote = %remote_path, size = meta.len(), "archive uploaded");

    let retention = enforce_retention(remote, &archive.remote_dir, limit).await?;
    Ok(ArchiveReport {
        remote_path,
        retention,
    })
}
