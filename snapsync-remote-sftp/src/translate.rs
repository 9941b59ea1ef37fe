use russh_sftp::client::error::Error;
use russh_sftp::protocol::StatusCode;
use snapsync_core::SyncError;

/// Map one protocol failure onto the engine taxonomy.
///
/// Applied at every call site in this crate, so raw status codes never
/// escape to the engine. A bare `Failure` stays generic here; the call
/// sites that can disambiguate it (mkdir, rmdir) do so with a follow-up
/// stat before falling back to this mapping.
pub(crate) fn translate(path: &str, err: Error) -> SyncError {
    match &err {
        Error::Status(status) => match status.status_code {
            StatusCode::NoSuchFile => SyncError::NotFound(path.to_string()),
            StatusCode::PermissionDenied => SyncError::PermissionDenied(path.to_string()),
            StatusCode::NoConnection | StatusCode::ConnectionLost => SyncError::NotConnected,
            _ => {
                let msg = if status.error_message.is_empty() {
                    format!("{:?}", status.status_code)
                } else {
                    status.error_message.clone()
                };
                SyncError::Protocol(format!("{path}: {msg}"))
            }
        },
        _ => SyncError::Protocol(format!("{path}: {err}")),
    }
}

pub(crate) fn status_is(err: &Error, code: StatusCode) -> bool {
    matches!(err, Error::Status(status) if status.status_code == code)
}
