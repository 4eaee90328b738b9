//! `jnu-exam upgrade`
//!
//! Checks the metadata document and, when an update applies, downloads it,
//! swaps it in and restarts. A non-forced update is only reported unless
//! `--yes` is given; a forced one is always applied.

use super::check_update::print_check_result;
use crate::app::App;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct UpgradeCommand {
    /// Install without asking
    #[arg(short, long)]
    pub yes: bool,
}

impl UpgradeCommand {
    pub async fn execute(self, app: &App) -> Result<()> {
        let result = app.check_update().await.context("Failed to check for updates")?;
        print_check_result(&result);

        if !result.has_update {
            return Ok(());
        }
        if !self.yes && !result.is_force {
            return Ok(());
        }

        println!("{}", format!("Upgrading to {}...", result.remote_ver).cyan());
        // The swap creates a new backup; the startup reaper must be done first.
        app.wait_for_reaper().await;
        let updater = app.updater()?;
        let installed = updater
            .apply_update(&result.download_url, &result.checksum)
            .await
            .context("Upgrade failed")?;

        println!("{}", "Upgrade installed, restarting".green());
        match crate::upgrade::SelfUpdater::restart(&installed)? {}
    }
}
