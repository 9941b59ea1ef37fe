//! Core library for snapsync – snapshot backup and mirror engine over a
//! pluggable remote filesystem.

mod archive;
mod config;
mod delete;
mod ensure;
mod error;
mod filter;
mod remote;
mod retention;
mod select;
mod sync;
#[cfg(test)]
mod testing;
pub mod utils;
mod walk;

pub use archive::{upload_archive, ArchiveReport, BackupArchive};
pub use config::{BackupConfig, HookCfg, Pattern, RemoteCfg};
pub use delete::{remove_tree, DeleteReport};
pub use ensure::DirEnsurer;
pub use error::{Result, SyncError};
pub use filter::PathFilter;
pub use remote::{RemoteEntry, RemoteFs};
pub use retention::{enforce_retention, RetentionReport};
pub use select::{download_latest, latest_entry};
pub use sync::{sync_tree, SyncReport};
pub use walk::{walk_tree, LocalEntry};
