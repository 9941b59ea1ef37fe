use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, SyncError};
use crate::remote::{RemoteEntry, RemoteFs};

/// Newest file in `dir`, by modification time with the name as tie-breaker.
///
/// Directories are ignored. Fails `NoBackupsFound` when no file is present.
pub async fn latest_entry<R: RemoteFs + ?Sized>(remote: &R, dir: &str) -> Result<RemoteEntry> {
    remote
        .list(dir)
        .await?
        .into_iter()
        .filter(|e| !e.is_dir)
        .max_by(|a, b| a.recency_key().cmp(&b.recency_key()))
        .ok_or_else(|| SyncError::NoBackupsFound(dir.to_string()))
}

/// Download the newest file in `dir` into `dest_dir`, creating that
/// directory as needed. Returns the chosen entry and where it landed.
///
/// The entry name is server-supplied; anything but a bare file name fails
/// `InvalidPath` before the destination is touched.
pub async fn download_latest<R: RemoteFs + ?Sized>(
    remote: &R,
    dir: &str,
    dest_dir: &Path,
) -> Result<(RemoteEntry, PathBuf)> {
    let entry = latest_entry(remote, dir).await?;
    check_entry_name(&entry.name)?;
    tokio::fs::create_dir_all(dest_dir).await?;
    let local = dest_dir.join(&entry.name);
    remote.get(&entry.path, &local).await?;
    info!(remote = %entry.path, local = %local.display(), "downloaded latest backup");
    Ok((entry, local))
}

// Listing names reach a local join; only a bare file name is allowed
// through. A separator or dot entry would land the write outside
// `dest_dir`.
fn check_entry_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
    {
        return Err(SyncError::InvalidPath(name.to_string()));
    }
    Ok(())
}
