//! `jnu-exam ls`

use crate::app::App;
use crate::listing::{FileEntry, Node, format_size};
use crate::utils::spinner_with_message;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct LsCommand {
    /// Mirror to browse (see `jnu-exam sources`)
    pub source: String,

    /// Directory inside the listing; the root when omitted
    #[arg(default_value = "")]
    pub path: String,

    /// List every file below PATH whose name contains this text
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,
}

impl LsCommand {
    pub async fn execute(self, app: &App) -> Result<()> {
        let source = app.source(&self.source).await?;

        let spinner = spinner_with_message(format!("Fetching {} listing", self.source));
        let tree = app.fetch_directory(&source.json_url).await;
        spinner.finish_and_clear();
        let tree = tree.with_context(|| format!("Failed to load listing for '{}'", self.source))?;

        let node = tree.find(&self.path).ok_or_else(|| crate::core::DownloaderError::NotFound {
            what: format!("Path '{}' in source '{}'", self.path, self.source),
        })?;

        match &self.search {
            Some(query) => print_matches(&node.search(query)),
            None => print_directory(node),
        }
        Ok(())
    }
}

fn size_column(size: Option<u64>) -> String {
    size.map(format_size).unwrap_or_default()
}

fn print_directory(node: &Node) {
    match node {
        Node::File(file) => print_matches(&[file]),
        Node::Directory(dir) => {
            for child in &dir.children {
                match child {
                    Node::Directory(sub) => println!("{}/", sub.name.blue().bold()),
                    Node::File(file) => {
                        println!("{:<48} {:>10}", file.name, size_column(file.size).dimmed());
                    }
                }
            }
        }
    }
}

fn print_matches(files: &[&FileEntry]) {
    if files.is_empty() {
        println!("{}", "No matching files".yellow());
        return;
    }
    for file in files {
        println!("{:<64} {:>10}", file.path, size_column(file.size).dimmed());
    }
}
