use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use snapsync_core::HookCfg;
use tokio::process::Command;
use tracing::{info, warn};

/// A produced snapshot archive, ready for upload.
#[derive(Debug)]
pub struct Snapshot {
    pub path: PathBuf,
    pub name: String,
}

impl Snapshot {
    /// Wrap an archive path, taking the upload name from its final component.
    fn from_path(path: PathBuf) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("{} has no usable file name", path.display()))?
            .to_string();
        Ok(Self { path, name })
    }
}

/// Runs the configured external commands that produce and apply snapshot
/// archives. Commands are argv lists executed without a shell; anything
/// that needs elevation carries it in the argv itself.
pub struct SnapshotHook<'a> {
    cfg: &'a HookCfg,
}

impl<'a> SnapshotHook<'a> {
    pub fn new(cfg: &'a HookCfg) -> Self {
        Self { cfg }
    }

    /// Run the create hook; its last non-empty stdout line names the
    /// archive it produced.
    pub async fn create_snapshot(&self) -> Result<Snapshot> {
        let argv = self
            .cfg
            .create
            .as_deref()
            .context("no snapshot create command configured")?;
        let (program, args) = split_argv(argv)?;
        info!(command = %argv.join(" "), "running snapshot hook");
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .with_context(|| format!("failed to run {program}"))?;
        if !output.status.success() {
            bail!(
                "snapshot hook failed ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let path = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .context("snapshot hook printed no archive path")?;
        let path = PathBuf::from(path);
        if !path.is_file() {
            bail!(
                "snapshot hook reported {}, which is not a file",
                path.display()
            );
        }
        Snapshot::from_path(path)
    }

    /// Run the restore hook with the downloaded archive appended as the
    /// final argument.
    pub async fn restore_snapshot(&self, archive: &Path) -> Result<()> {
        let argv = self
            .cfg
            .restore
            .as_deref()
            .context("no snapshot restore command configured")?;
        let (program, args) = split_argv(argv)?;
        info!(command = %argv.join(" "), archive = %archive.display(), "running restore hook");
        let status = Command::new(program)
            .args(args)
            .arg(archive)
            .status()
            .await
            .with_context(|| format!("failed to run {program}"))?;
        if !status.success() {
            bail!("restore hook failed ({status})");
        }
        Ok(())
    }
}

/// The archive a backup will upload: the explicit path when one was given,
/// otherwise whatever the create hook produces. The flag reports whether
/// the hook ran, meaning the file is ours to remove after the upload.
/// Takes no session; backups resolve their archive before connecting.
pub async fn resolve_archive(
    snapshot: Option<&HookCfg>,
    explicit: Option<PathBuf>,
) -> Result<(Snapshot, bool)> {
    match explicit {
        Some(path) => Ok((Snapshot::from_path(path)?, false)),
        None => {
            let cfg = snapshot.context("no --archive given and no snapshot hook configured")?;
            let produced = SnapshotHook::new(cfg).create_snapshot().await?;
            Ok((produced, true))
        }
    }
}

/// Consume a downloaded archive: run the restore hook when one is
/// configured, then drop the local copy unless `keep_archive` says
/// otherwise. A failed hook returns before any removal, leaving the
/// archive in place for a manual retry. Reports whether a hook ran.
pub async fn apply_archive(
    snapshot: Option<&HookCfg>,
    archive: &Path,
    keep_archive: bool,
) -> Result<bool> {
    let cfg = match snapshot.filter(|h| h.restore.is_some()) {
        Some(cfg) => cfg,
        None => return Ok(false),
    };
    SnapshotHook::new(cfg).restore_snapshot(archive).await?;
    if !keep_archive {
        remove_local(archive).await;
    }
    Ok(true)
}

/// Best-effort removal; a missing file is fine, anything else warns.
pub async fn remove_local(path: &Path) {
    if let Err(err) = tokio::fs::remove_file(path).await {
        if err.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), %err, "could not remove local archive");
        }
    }
}

fn split_argv(argv: &[String]) -> Result<(&String, &[String])> {
    match argv.split_first() {
        Some(split) => Ok(split),
        None => bail!("hook command is empty"),
    }
}
