use thiserror::Error;

/// Error taxonomy shared by the engine and every remote backend.
///
/// Protocol-level failures are translated into these variants exactly once,
/// inside the remote implementation; the engine and callers match on this
/// enum and never see raw status codes.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("remote session is no longer connected")]
    NotConnected,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("directory not empty: {0}")]
    NotEmpty(String),

    #[error("operation timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("no backups found in {0}")]
    NoBackupsFound(String),

    #[error("retention: {failed} of {attempted} deletions failed in {dir}")]
    RetentionIncomplete {
        dir: String,
        failed: usize,
        attempted: usize,
    },

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("remote protocol error: {0}")]
    Protocol(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
