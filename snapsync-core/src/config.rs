use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::PathBuf;

/// Glob pattern (wrapper type for clarity)
/// Stored as plain String; compilation to `globset::Glob` happens when the
/// path filter is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern(pub String);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RemoteCfg {
    /// SFTP remote endpoint
    Sftp {
        host: String,
        #[serde(default = "RemoteCfg::default_port")]
        port: u16,
        user: String,
        password: Option<String>,
        #[serde(default)]
        fingerprints: Option<Vec<String>>, // allowed host key fingerprints or base64 keys
        /// Deadline for the whole connect sequence and for each operation.
        #[serde(default = "RemoteCfg::default_timeout_secs")]
        timeout_secs: u64,
    },
    // Future variants: WebDav { ... }, S3 { ... }
}

impl RemoteCfg {
    fn default_port() -> u16 { 22 }
    fn default_timeout_secs() -> u64 { 300 }
}

/// External commands run around an archive's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookCfg {
    /// Argv producing a snapshot archive; its last non-empty stdout line is
    /// taken as the archive path.
    #[serde(default)]
    pub create:  Option<Vec<String>>,
    /// Argv applying a downloaded archive; the archive path is appended as
    /// the final argument.
    #[serde(default)]
    pub restore: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    pub remote:     RemoteCfg,
    /// Remote directory archives are uploaded into.
    pub remote_dir: String,
    /// Route uploads to a separate directory instead of the real one.
    #[serde(default)]
    pub debug:      bool,
    #[serde(default)]
    pub debug_remote_dir: Option<String>,
    /// Number of newest archives kept after each upload.
    #[serde(default = "BackupConfig::default_retention")]
    pub retention:  NonZeroU32,
    #[serde(default = "BackupConfig::default_restore_dir")]
    pub restore_dir: PathBuf,
    #[serde(default)]
    pub include:    Vec<Pattern>,
    #[serde(default)]
    pub exclude:    Vec<Pattern>,
    #[serde(default)]
    pub snapshot:   Option<HookCfg>,
}

impl BackupConfig {
    fn default_retention() -> NonZeroU32 { NonZeroU32::new(10).unwrap() }
    fn default_restore_dir() -> PathBuf { PathBuf::from("./restores") }

    /// Upload directory after applying debug routing: the configured
    /// override, or the real directory with a `-debug` suffix.
    pub fn effective_remote_dir(&self) -> String {
        if !self.debug {
            return self.remote_dir.clone();
        }
        match &self.debug_remote_dir {
            Some(dir) => dir.clone(),
            None => format!("{}-debug", self.remote_dir.trim_end_matches('/')),
        }
    }
}
