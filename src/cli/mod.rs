//! Command-line interface for the JNU exam-material downloader.
//!
//! # Available Commands
//!
//! ## Browsing and Downloading
//! - `sources` - List the listing mirrors
//! - `ls` - Show a directory of a mirror's listing, or search it
//! - `download` - Download one file from a mirror
//!
//! ## Self-Update
//! - `check-update` - Show whether a newer version is published
//! - `upgrade` - Install the newer version and restart
//! - `checksum` - Print the SHA-256 of a file, as published in update metadata
//!
//! # Global Options
//!
//! All commands support these global options:
//! - `--verbose` - Enable debug output
//! - `--quiet` - Suppress all logging
//! - `--no-progress` - Disable progress bars and spinners
//! - `--config` - Path to a custom config file
//!
//! # Example
//!
//! ```bash
//! jnu-exam ls cloudflare 高等数学
//! jnu-exam ls github --search 期末
//! jnu-exam download cloudflare 高等数学/2023/final.pdf -o ~/Downloads
//! jnu-exam upgrade --yes
//! ```
//!
//! Before any command runs, a background task removes the `.old` executable a
//! previous upgrade left behind; the CLI waits for it before exiting.

mod browse;
mod check_update;
mod checksum;
mod download;
mod sources;
mod upgrade;


use crate::app::App;
use crate::config::AppConfig;
use crate::constants::{CONFIG_PATH_ENV, NO_PROGRESS_ENV};
use crate::utils::TerminalSink;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Runtime configuration derived from the global flags.
///
/// Kept separate from [`Cli`] so tests can inspect what a command line
/// would configure without touching the process environment.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter, e.g. `"debug"`. `None` disables logging.
    ///
    /// `RUST_LOG`, when set, takes precedence.
    pub log_level: Option<String>,

    /// Hide progress bars and spinners (`JNU_EXAM_NO_PROGRESS`).
    pub no_progress: bool,

    /// Config file to load instead of the default location (`JNU_EXAM_CONFIG`).
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Export the settings other modules read from the environment.
    ///
    /// # Safety
    ///
    /// Mutates the process environment. Call before any other thread exists,
    /// in particular before the async runtime is built.
    pub unsafe fn apply_to_env(&self) {
        if self.no_progress {
            unsafe { std::env::set_var(NO_PROGRESS_ENV, "1") };
        }

        if let Some(ref path) = self.config_path {
            unsafe { std::env::set_var(CONFIG_PATH_ENV, path) };
        }
    }

    /// Install the global `tracing` subscriber on stderr.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if let Some(level) = &self.log_level {
            EnvFilter::new(level)
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Browse and download exam materials, and keep this tool up to date.
#[derive(Parser)]
#[command(
    name = "jnu-exam",
    about = "Browse and download JNU exam materials",
    version,
    long_about = "Lists the exam-material mirrors, downloads files from them with progress, and upgrades itself in place."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress logging
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a custom config file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Disable progress bars and spinners
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available listing mirrors.
    Sources(sources::SourcesCommand),

    /// Show a directory of a mirror's listing, or search it.
    Ls(browse::LsCommand),

    /// Download one file from a mirror.
    Download(download::DownloadCommand),

    /// Check whether a newer version is published.
    CheckUpdate(check_update::CheckUpdateCommand),

    /// Download and install the newer version, then restart.
    Upgrade(upgrade::UpgradeCommand),

    /// Print the SHA-256 checksum of a file.
    Checksum(checksum::ChecksumCommand),
}

impl Cli {
    /// Build a [`CliConfig`] from the parsed flags.
    ///
    /// `--verbose` selects `debug`, `--quiet` disables logging, and the default
    /// is `info`.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("info".to_string())
        };

        CliConfig {
            log_level,
            no_progress: self.no_progress,
            config_path: self.config.clone(),
        }
    }

    /// Load configuration, run the command, and wait for the backup reaper.
    pub async fn execute(self) -> Result<()> {
        let config = AppConfig::load_with_optional(self.config.clone())
            .await
            .context("Failed to load configuration")?;
        let app = App::new(config, Arc::new(TerminalSink::new()))?;

        app.start_reaper();
        let result = self.command.execute(&app).await;
        app.wait_for_reaper().await;

        result
    }
}

impl Commands {
    async fn execute(self, app: &App) -> Result<()> {
        match self {
            Self::Sources(cmd) => cmd.execute(app).await,
            Self::Ls(cmd) => cmd.execute(app).await,
            Self::Download(cmd) => cmd.execute(app).await,
            Self::CheckUpdate(cmd) => cmd.execute(app).await,
            Self::Upgrade(cmd) => cmd.execute(app).await,
            Self::Checksum(cmd) => cmd.execute().await,
        }
    }
}
