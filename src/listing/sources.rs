//! Listing sources.
//!
//! A source is one mirror of the listing: where its directory document lives
//! and which `*_url` field of each file entry points at that mirror.

use crate::core::{DownloaderError, Result};
use crate::http;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// One listing mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the directory document.
    #[serde(default)]
    pub json_url: String,
    /// Field of each file entry that holds this mirror's download URL.
    #[serde(default)]
    pub file_key: String,
    /// Legacy name for `json_url` used by older source lists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir_url: Option<String>,
}

impl SourceConfig {
    pub fn new(json_url: impl Into<String>, file_key: impl Into<String>) -> Self {
        Self {
            json_url: json_url.into(),
            file_key: file_key.into(),
            dir_url: None,
        }
    }

    /// Fill an empty `json_url` from `dir_url`.
    fn normalize(&mut self) {
        if self.json_url.is_empty()
            && let Some(dir_url) = self.dir_url.as_deref().filter(|url| !url.is_empty())
        {
            self.json_url = dir_url.to_string();
        }
    }
}

/// Decode a source list document and normalize its entries.
pub fn parse_source_list(body: &[u8]) -> Result<BTreeMap<String, SourceConfig>> {
    let mut sources: BTreeMap<String, SourceConfig> = serde_json::from_slice(body)
        .map_err(|e| DownloaderError::decode("source list", e))?;
    for source in sources.values_mut() {
        source.normalize();
    }
    Ok(sources)
}

/// Fetch a remote source list.
pub async fn fetch_source_list(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<BTreeMap<String, SourceConfig>> {
    info!("Fetching source list from {}", url);
    let mut sources: BTreeMap<String, SourceConfig> =
        http::get_json(client, url, timeout, "fetch source list").await?;
    for source in sources.values_mut() {
        source.normalize();
    }
    debug!("Source list has {} entries", sources.len());
    Ok(sources)
}
