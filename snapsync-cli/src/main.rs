mod hook;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use snapsync_core::{
    download_latest, remove_tree, sync_tree, upload_archive, BackupArchive, BackupConfig,
    PathFilter, RemoteCfg, RemoteFs,
};
use snapsync_remote_sftp::SftpRemote;

use crate::hook::{apply_archive, remove_local, resolve_archive};

#[derive(Parser)]
#[command(name = "snapsync", version, about = "snapsync – snapshot backups over SFTP")]
struct Cli {
    /// Path to config file (JSON / YAML)
    #[arg(short, long, default_value = "config.yaml")]
    config: String,
    /// Route uploads to the debug directory regardless of the config
    #[arg(long)]
    debug: bool,
    /// Prompt for the remote password instead of reading the config
    #[arg(long)]
    ask_pass: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce an archive via the snapshot hook, upload it, prune old ones
    Backup {
        /// Upload this archive instead of running the snapshot hook
        #[arg(long)]
        archive: Option<PathBuf>,
        /// Keep the hook-produced archive on disk after a successful upload
        #[arg(long)]
        keep_local: bool,
    },
    /// Download the newest archive and run the restore hook if configured
    Restore {
        /// Download here instead of the configured restore dir
        #[arg(long)]
        output: Option<PathBuf>,
        /// Keep the downloaded archive after a successful restore hook
        #[arg(long)]
        keep_archive: bool,
    },
    /// Mirror a local directory into the remote one
    Sync {
        /// Local directory to mirror
        local: PathBuf,
        /// Remote target; defaults to the configured remote dir
        #[arg(long)]
        remote_dir: Option<String>,
    },
    /// Recursively delete a remote directory
    Purge {
        /// Remote directory to delete
        remote_dir: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = load_config(&cli.config)?;
    if cli.debug {
        cfg.debug = true;
    }
    if cli.ask_pass {
        let pass = rpassword::prompt_password("remote password: ")?;
        let RemoteCfg::Sftp { password, .. } = &mut cfg.remote;
        *password = Some(pass);
    }

    match cli.command {
        Commands::Backup {
            archive,
            keep_local,
        } => backup(&cfg, archive, keep_local).await,
        Commands::Restore {
            output,
            keep_archive,
        } => restore(&cfg, output, keep_archive).await,
        Commands::Sync { local, remote_dir } => sync(&cfg, &local, remote_dir).await,
        Commands::Purge { remote_dir } => purge(&cfg, &remote_dir).await,
    }
}

fn load_config(path: &str) -> Result<BackupConfig> {
    let text = fs::read_to_string(path).map_err(|e| anyhow!("read config {path} failed: {e}"))?;

    // Detect format by extension
    let ext = Path::new(path)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let cfg = match ext {
        "json" => serde_json::from_str(&text)?,
        "yaml" | "yml" => serde_yaml::from_str(&text)?,
        _ => serde_yaml::from_str(&text)?, // default to yaml
    };
    Ok(cfg)
}

async fn connect(cfg: &BackupConfig) -> Result<SftpRemote> {
    let RemoteCfg::Sftp {
        host,
        port,
        user,
        password,
        fingerprints,
        timeout_secs,
    } = &cfg.remote;
    let remote = SftpRemote::connect(
        host,
        *port,
        user,
        password.as_deref(),
        fingerprints.clone(),
        Duration::from_secs(*timeout_secs),
    )
    .await?;
    Ok(remote)
}

async fn backup(cfg: &BackupConfig, archive: Option<PathBuf>, keep_local: bool) -> Result<()> {
    // Produce the archive before touching the network; a failing hook
    // should not cost a connection.
    let (snapshot, from_hook) = resolve_archive(cfg.snapshot.as_ref(), archive).await?;

    let remote = connect(cfg).await?;
    let outcome = upload_archive(
        &remote,
        &BackupArchive::new(&snapshot.path, cfg.effective_remote_dir()),
        cfg.retention,
    )
    .await;
    let _ = remote.close().await;
    let report = outcome?;

    if from_hook && !keep_local {
        remove_local(&snapshot.path).await;
    }
    if report.retention.removed > 0 {
        info!(pruned = report.retention.removed, "old archives pruned");
    }
    println!("uploaded {} -> {}", snapshot.name, report.remote_path);
    Ok(())
}

async fn restore(cfg: &BackupConfig, output: Option<PathBuf>, keep_archive: bool) -> Result<()> {
    let dest_dir = output.unwrap_or_else(|| cfg.restore_dir.clone());
    let dir = cfg.effective_remote_dir();

    let remote = connect(cfg).await?;
    let outcome = download_latest(&remote, &dir, &dest_dir).await;
    let _ = remote.close().await;
    let (entry, local) = outcome?;
    println!("downloaded {} -> {}", entry.path, local.display());

    if apply_archive(cfg.snapshot.as_ref(), &local, keep_archive).await? {
        println!("restore hook finished");
    }
    Ok(())
}

async fn sync(cfg: &BackupConfig, local: &Path, remote_dir: Option<String>) -> Result<()> {
    let target = remote_dir.unwrap_or_else(|| cfg.effective_remote_dir());
    let filter = PathFilter::from_config(cfg);

    let remote = connect(cfg).await?;
    let outcome = sync_tree(&remote, local, &target, &filter).await;
    let _ = remote.close().await;
    let report = outcome?;
    println!(
        "synced {} -> {}: {} uploaded, {} already present, {} excluded, {} dirs created",
        local.display(),
        target,
        report.uploaded,
        report.skipped,
        report.excluded,
        report.dirs_created
    );
    Ok(())
}

async fn purge(cfg: &BackupConfig, remote_dir: &str) -> Result<()> {
    let remote = connect(cfg).await?;
    let outcome = remove_tree(&remote, remote_dir).await;
    let _ = remote.close().await;
    let report = outcome?;
    println!(
        "purged {remote_dir}: {} files, {} dirs",
        report.files, report.dirs
    );
    Ok(())
}
