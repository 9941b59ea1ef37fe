use std::collections::HashSet;

use tracing::debug;

use crate::error::{Result, SyncError};
use crate::remote::RemoteFs;
use crate::utils::remote_prefixes;

/// Creates remote directory chains on demand, remembering which prefixes
/// are already known to exist so repeated ensures of sibling paths cost
/// nothing.
///
/// Scoped to one session. A new session starts with an empty memo because
/// the server may have changed in between.
pub struct DirEnsurer<'a, R: RemoteFs + ?Sized> {
    remote:  &'a R,
    known:   HashSet<String>,
    created: usize,
}

impl<'a, R: RemoteFs + ?Sized> DirEnsurer<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self {
            remote,
            known: HashSet::new(),
            created: 0,
        }
    }

    /// Directories created through this ensurer so far.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Make sure `dir` and every ancestor exist, creating the missing tail.
    ///
    /// A concurrent writer may create a prefix between the probe and the
    /// mkdir; that mkdir reports `AlreadyExists` and counts as success here.
    /// A prefix occupied by a file fails `NotADirectory`.
    pub async fn ensure(&mut self, dir: &str) -> Result<()> {
        for prefix in remote_prefixes(dir) {
            if self.known.contains(&prefix) {
                continue;
            }
            match self.remote.stat(&prefix).await {
                Ok(entry) if entry.is_dir => {}
                Ok(_) => return Err(SyncError::NotADirectory(prefix)),
                Err(SyncError::NotFound(_)) => match self.remote.mkdir(&prefix).await {
                    Ok(()) => {
                        debug!(dir = %prefix, "created remote directory");
                        self.created += 1;
                    }
                    // Lost a race against another writer; the directory is there.
                    Err(SyncError::AlreadyExists(_)) => {}
                    Err(err) => return Err(err),
                },
                Err(err) => return Err(err),
            }
            self.known.insert(prefix);
        }
        Ok(())
    }
}
