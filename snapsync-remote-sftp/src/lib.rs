//! SFTP implementation of the snapsync remote, built on russh and
//! russh-sftp. One session carries one SSH connection with a single SFTP
//! subsystem channel; the engine drives it one operation at a time.

mod ssh_client;
mod translate;

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use russh::client::{AuthResult, Handle};
use russh::Disconnect;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::{FileAttributes, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};

use snapsync_core::utils::{join_remote, remote_name};
use snapsync_core::{RemoteEntry, RemoteFs, Result, SyncError};

use crate::ssh_client::ClientHandler;
use crate::translate::{status_is, translate};

// Cap on the teardown traffic after a deadline fires or on close; a dead
// server must not stall the goodbye too.
const DISCONNECT_CAP: Duration = Duration::from_secs(5);

pub struct SftpRemote {
    handle:  Handle<ClientHandler>,
    sftp:    SftpSession,
    timeout: Duration,
}

impl SftpRemote {
    /// Open a session: TCP, host key check, password auth, SFTP subsystem.
    /// The whole sequence shares one deadline.
    pub async fn connect(
        host: &str,
        port: u16,
        user: &str,
        password: Option<&str>,
        allowed_fingerprints: Option<Vec<String>>,
        timeout: Duration,
    ) -> Result<Self> {
        let secs = timeout.as_secs();
        let sequence = async {
            let config = Arc::new(russh::client::Config::default());
            let handler = ClientHandler {
                pinned: allowed_fingerprints,
            };
            let mut handle = russh::client::connect(config, (host, port), handler)
                .await
                .map_err(|err| SyncError::Connection(err.to_string()))?;
            let auth = handle
                .authenticate_password(user, password.unwrap_or(""))
                .await
                .map_err(|err| SyncError::Connection(err.to_string()))?;
            if let AuthResult::Failure {
                remaining_methods,
                partial_success,
            } = auth
            {
                return Err(SyncError::Connection(format!(
                    "authentication failed, remaining methods: {remaining_methods:?}, partial success: {partial_success}"
                )));
            }
            let channel = handle
                .channel_open_session()
                .await
                .map_err(|err| SyncError::Connection(err.to_string()))?;
            channel
                .request_subsystem(true, "sftp")
                .await
                .map_err(|err| SyncError::Connection(err.to_string()))?;
            let sftp = SftpSession::new(channel.into_stream())
                .await
                .map_err(|err| SyncError::Connection(err.to_string()))?;
            if let Ok(cwd) = sftp.canonicalize(".").await {
                debug!(%cwd, host, port, "sftp session established");
            }
            Ok(Self {
                handle,
                sftp,
                timeout,
            })
        };
        match tokio::time::timeout(timeout, sequence).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::Timeout { secs }),
        }
    }

    /// Run one operation under the session deadline. A reply that never
    /// arrives leaves the channel in an unknown state, so the session is
    /// torn down before the timeout is reported.
    async fn with_deadline<T, F>(&self, op: &'static str, path: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                let secs = self.timeout.as_secs();
                error!(op, path, secs, "deadline exceeded, dropping the session");
                let _ = tokio::time::timeout(
                    DISCONNECT_CAP,
                    self.handle
                        .disconnect(Disconnect::ByApplication, "operation deadline exceeded", "en"),
                )
                .await;
                Err(SyncError::Timeout { secs })
            }
        }
    }
}

fn make_entry(name: String, path: String, attrs: &FileAttributes) -> RemoteEntry {
    RemoteEntry {
        name,
        path,
        is_dir: attrs.is_dir(),
        size: attrs.size.unwrap_or(0),
        modified: UNIX_EPOCH + Duration::from_secs(u64::from(attrs.mtime.unwrap_or(0))),
    }
}

#[async_trait]
impl RemoteFs for SftpRemote {
    async fn stat(&self, path: &str) -> Result<RemoteEntry> {
        self.with_deadline("stat", path, async {
            let attrs = self
                .sftp
                .metadata(path)
                .await
                .map_err(|err| translate(path, err))?;
            Ok(make_entry(
                remote_name(path).to_string(),
                path.to_string(),
                &attrs,
            ))
        })
        .await
    }

    async fn mkdir(&self, path: &str) -> Result<()> {
        self.with_deadline("mkdir", path, async {
            match self.sftp.create_dir(path).await {
                Ok(()) => Ok(()),
                // SFTPv3 reports an occupied path as a bare Failure; a
                // follow-up stat decides which case it actually was.
                Err(err) if status_is(&err, StatusCode::Failure) => {
                    match self.sftp.metadata(path).await {
                        Ok(attrs) if attrs.is_dir() => {
                            Err(SyncError::AlreadyExists(path.to_string()))
                        }
                        Ok(_) => Err(SyncError::NotADirectory(path.to_string())),
                        Err(_) => Err(translate(path, err)),
                    }
                }
                Err(err) => Err(translate(path, err)),
            }
        })
        .await
    }

    async fn list(&self, dir: &str) -> Result<Vec<RemoteEntry>> {
        self.with_deadline("list", dir, async {
            let entries = self
                .sftp
                .read_dir(dir)
                .await
                .map_err(|err| translate(dir, err))?;
            let mut out = Vec::new();
            for entry in entries {
                let name = entry.file_name();
                if name == "." || name == ".." {
                    continue;
                }
                let path = join_remote(dir, &name);
                out.push(make_entry(name, path, &entry.metadata()));
            }
            Ok(out)
        })
        .await
    }

    async fn put(&self, local: &Path, remote: &str) -> Result<()> {
        self.with_deadline("put", remote, async {
            let mut src = tokio::fs::File::open(local).await?;
            let mut dst = self
                .sftp
                .create(remote)
                .await
                .map_err(|err| translate(remote, err))?;
            tokio::io::copy(&mut src, &mut dst).await?;
            dst.shutdown().await?;
            Ok(())
        })
        .await
    }

    async fn get(&self, remote: &str, local: &Path) -> Result<()> {
        self.with_deadline("get", remote, async {
            let mut src = self
                .sftp
                .open(remote)
                .await
                .map_err(|err| translate(remote, err))?;
            let mut dst = tokio::fs::File::create(local).await?;
            tokio::io::copy(&mut src, &mut dst).await?;
            dst.flush().await?;
            Ok(())
        })
        .await
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.with_deadline("remove", path, async {
            self.sftp
                .remove_file(path)
                .await
                .map_err(|err| translate(path, err))
        })
        .await
    }

    async fn rmdir(&self, dir: &str) -> Result<()> {
        self.with_deadline("rmdir", dir, async {
            match self.sftp.remove_dir(dir).await {
                Ok(()) => Ok(()),
                // A bare Failure with the directory still present means it
                // has children.
                Err(err) if status_is(&err, StatusCode::Failure) => {
                    match self.sftp.metadata(dir).await {
                        Ok(_) => Err(SyncError::NotEmpty(dir.to_string())),
                        Err(_) => Err(translate(dir, err)),
                    }
                }
                Err(err) => Err(translate(dir, err)),
            }
        })
        .await
    }

    async fn close(&self) -> Result<()> {
        // Best effort; the server may already be gone and a second close is
        // harmless.
        let _ = tokio::time::timeout(
            DISCONNECT_CAP,
            self.handle
                .disconnect(Disconnect::ByApplication, "session finished", "en"),
        )
        .await;
        Ok(())
    }
}
