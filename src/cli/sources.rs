//! `jnu-exam sources`

use crate::app::App;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct SourcesCommand {
    /// Print the sources as JSON
    #[arg(long)]
    pub json: bool,
}

impl SourcesCommand {
    pub async fn execute(self, app: &App) -> Result<()> {
        let sources = app.sources().await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&sources)?);
            return Ok(());
        }

        let default = &app.config().default_source;
        for (name, source) in &sources {
            let marker = if name == default { "*" } else { " " };
            println!(
                "{} {:<12} {} {}",
                marker.green(),
                name.bold(),
                source.json_url,
                format!("({})", source.file_key).dimmed()
            );
        }
        Ok(())
    }
}
