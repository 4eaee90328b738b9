//! `jnu-exam check-update`

use crate::app::App;
use crate::upgrade::CheckResult;
use crate::utils::spinner_with_message;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct CheckUpdateCommand {
    /// Print the check result as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckUpdateCommand {
    pub async fn execute(self, app: &App) -> Result<()> {
        let spinner = spinner_with_message("Checking for updates");
        let result = app.check_update().await;
        spinner.finish_and_clear();
        let result = result.context("Failed to check for updates")?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_check_result(&result);
        }
        Ok(())
    }
}

/// Human-readable summary of a check, shared with `upgrade`.
pub(super) fn print_check_result(result: &CheckResult) {
    if result.notice.show && !result.notice.content.is_empty() {
        println!("{} {}", "Notice:".cyan().bold(), result.notice.title.bold());
        println!("  {}", result.notice.content);
        println!();
    }

    if result.has_update {
        let kind = if result.is_force { "Required update" } else { "Update available" };
        println!(
            "{}: {} -> {}",
            kind.green().bold(),
            result.current_ver.yellow(),
            result.remote_ver.green().bold()
        );
        if !result.update_desc.is_empty() {
            println!("  {}", result.update_desc);
        }
        println!("  Run {} to install it", "jnu-exam upgrade --yes".cyan().bold());
    } else {
        println!(
            "{}",
            format!("You are on the latest version ({})", result.current_ver).green()
        );
    }
}
