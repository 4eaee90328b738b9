//! `jnu-exam download`

use crate::app::App;
use crate::core::DownloaderError;
use crate::listing::Node;
use crate::utils::platform::{default_download_dir, sanitize_filename};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct DownloadCommand {
    /// Mirror to download from
    pub source: String,

    /// Path of the file inside the listing
    pub path: String,

    /// Output file, or an existing directory to save into
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

impl DownloadCommand {
    pub async fn execute(self, app: &App) -> Result<()> {
        let source = app.source(&self.source).await?;
        let tree = app
            .fetch_directory(&source.json_url)
            .await
            .with_context(|| format!("Failed to load listing for '{}'", self.source))?;

        let file = match tree.find(&self.path) {
            Some(Node::File(file)) => file,
            Some(Node::Directory(_)) => {
                anyhow::bail!("'{}' is a directory; pass the path of a file", self.path)
            }
            None => {
                return Err(DownloaderError::NotFound {
                    what: format!("File '{}' in source '{}'", self.path, self.source),
                }
                .into());
            }
        };

        let url = file.url_for(&source.file_key).ok_or_else(|| DownloaderError::NotFound {
            what: format!("Download URL '{}' for '{}'", source.file_key, file.path),
        })?;

        let save_path = resolve_output(self.output.as_deref(), &file.name, &file.path);
        let downloaded = app.download_file(url, &save_path).await?;

        println!("{} {}", "Saved".green().bold(), downloaded.path.display());
        println!("{}", format!("sha256 {}", downloaded.sha256).dimmed());
        Ok(())
    }
}

/// Where to save `name`: into `output` if it is a directory, as `output` if it
/// is any other path, or into the user's download directory.
///
/// A name that sanitizes to nothing falls back to the last segment of the
/// listing path, then to `download`.
fn resolve_output(output: Option<&Path>, name: &str, listing_path: &str) -> PathBuf {
    let file_name = [name, listing_path.rsplit(['/', '\\']).next().unwrap_or_default()]
        .into_iter()
        .map(sanitize_filename)
        .find(|candidate| !candidate.is_empty())
        .unwrap_or_else(|| "download".to_string());
    match output {
        Some(path) if path.is_dir() => path.join(file_name),
        Some(path) => path.to_path_buf(),
        None => default_download_dir().join(file_name),
    }
}
