use std::path::Path;
use std::time::SystemTime;

use async_trait::async_trait;

use crate::error::Result;

/// One entry of a remote listing or stat.
///
/// A snapshot of server state at the time of the call; nothing prevents the
/// server side from changing before the entry is acted upon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Final path segment.
    pub name: String,
    /// Full remote path, `/`-separated.
    pub path: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: SystemTime,
}

impl RemoteEntry {
    /// Ordering key for "which entry is newer": modification time first,
    /// lexicographic name as the deterministic tie-breaker (greater name
    /// counts as newer, which matches timestamp-named archives).
    pub fn recency_key(&self) -> (SystemTime, &str) {
        (self.modified, self.name.as_str())
    }
}

/// Primitive operations of one authenticated remote session.
///
/// Implementations issue one blocking round-trip per call; the engine drives
/// at most one operation at a time per session. The listing order of `list`
/// is implementation-defined; callers that care sort by [`RemoteEntry::recency_key`].
#[async_trait]
pub trait RemoteFs: Send + Sync {
    /// Attributes of a single path. Fails `NotFound` for a missing path,
    /// which several callers use as a cheap existence probe.
    async fn stat(&self, path: &str) -> Result<RemoteEntry>;

    /// Create one directory. The parent must already exist. Fails
    /// `AlreadyExists` when the path is already a directory; callers that
    /// ensure paths treat that as success.
    async fn mkdir(&self, path: &str) -> Result<()>;

    /// Entries directly under `dir`, without `.`/`..`.
    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>>;

    /// Upload one local file to `remote`. Overwrites; collision policy is
    /// the caller's job (see the archive uploader).
    async fn put(&self, local: &Path, remote: &str) -> Result<()>;

    /// Download one remote file to `local`, creating or truncating it.
    async fn get(&self, remote: &str, local: &Path) -> Result<()>;

    /// Remove one file. Fails `NotFound` for a missing path.
    async fn remove(&self, path: &str) -> Result<()>;

    /// Remove one empty directory. Fails `NotEmpty` when children remain.
    async fn rmdir(&self, dir: &str) -> Result<()>;

    /// Release the session. Best-effort and safe to call more than once;
    /// dropping the session releases it as well.
    async fn close(&self) -> Result<()>;
}
