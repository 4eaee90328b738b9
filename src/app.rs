//! Application facade.
//!
//! [`App`] owns what every command shares: the loaded [`AppConfig`], one HTTP
//! client, the directory cache, and the progress sink. Front ends (the CLI, or
//! anything embedding the library) go through it rather than wiring the
//! pieces together themselves.

use crate::cache::DirectoryCache;
use crate::config::AppConfig;
use crate::core::{DownloaderError, Result};
use crate::download::{self, DownloadOptions, Downloaded};
use crate::http;
use crate::listing::{self, Node, SourceConfig};
use crate::progress::EventSink;
use crate::upgrade::{CheckResult, ReapOutcome, SelfUpdater, UpdateChecker, UpdatePaths, spawn_reaper};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct App {
    config: AppConfig,
    client: reqwest::Client,
    cache: DirectoryCache,
    sink: Arc<dyn EventSink>,
    reaper: Mutex<Option<JoinHandle<ReapOutcome>>>,
}

impl App {
    pub fn new(config: AppConfig, sink: Arc<dyn EventSink>) -> Result<Self> {
        Ok(Self {
            config,
            client: http::build_client()?,
            cache: DirectoryCache::new(),
            sink,
            reaper: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    /// Start the stale-backup reaper for the running executable.
    ///
    /// Skipped with a warning when the executable path cannot be determined.
    pub fn start_reaper(&self) {
        match UpdatePaths::resolve(&self.config.product_name) {
            Ok(paths) => self.track_reaper(spawn_reaper(
                paths.current_exe,
                self.config.upgrade.reaper_attempts,
                self.config.upgrade.reaper_delay(),
            )),
            Err(e) => warn!("Skipping backup cleanup: {}", e),
        }
    }

    fn track_reaper(&self, handle: JoinHandle<ReapOutcome>) {
        if let Ok(mut reaper) = self.reaper.lock() {
            *reaper = Some(handle);
        }
    }

    /// Wait for the reaper started by [`App::start_reaper`] to finish.
    ///
    /// Must be called before a swap creates a new backup, or a retrying reaper
    /// could delete it. Returns `None` when no reaper is pending.
    pub async fn wait_for_reaper(&self) -> Option<ReapOutcome> {
        let handle = self.reaper.lock().ok()?.take()?;
        match handle.await {
            Ok(outcome) => {
                debug!("Backup cleanup: {:?}", outcome);
                Some(outcome)
            }
            Err(e) => {
                debug!("Backup cleanup task failed: {}", e);
                None
            }
        }
    }

    /// Fetch a remote source list.
    pub async fn fetch_source_list(&self, url: &str) -> Result<BTreeMap<String, SourceConfig>> {
        listing::fetch_source_list(&self.client, url, self.config.network.source_list_timeout())
            .await
    }

    /// All known sources: built-in, then the remote list if configured, then
    /// the config file's own entries.
    ///
    /// An unreachable remote list is logged and skipped.
    pub async fn sources(&self) -> BTreeMap<String, SourceConfig> {
        let mut sources = self.config.merged_sources();

        if let Some(url) = &self.config.sources_url {
            match self.fetch_source_list(url).await {
                Ok(remote) => {
                    for (name, source) in remote {
                        if !self.config.sources.contains_key(&name) {
                            sources.insert(name, source);
                        }
                    }
                }
                Err(e) => warn!("Ignoring remote source list: {}", e),
            }
        }

        sources
    }

    /// Look up a source by name.
    pub async fn source(&self, name: &str) -> Result<SourceConfig> {
        self.sources().await.remove(name).ok_or_else(|| DownloaderError::NotFound {
            what: format!("Source '{name}'"),
        })
    }

    /// Decoded listing at `url`, served from the cache after the first fetch.
    pub async fn fetch_directory(&self, url: &str) -> Result<Arc<Node>> {
        let timeout = self.config.network.directory_timeout();
        let client = &self.client;
        self.cache
            .fetch_or_load(url, || async move {
                debug!("Fetching directory listing {}", url);
                http::get_json::<Node>(client, url, timeout, "directory listing").await
            })
            .await
    }

    /// Download one file, reporting `download_progress` to the sink.
    pub async fn download_file(&self, url: &str, save_path: &Path) -> Result<Downloaded> {
        download::download_file(
            &self.client,
            url,
            save_path,
            Arc::clone(&self.sink),
            DownloadOptions {
                timeout: self.config.network.download_timeout(),
                throttle: self.config.upgrade.progress_throttle(),
            },
        )
        .await
    }

    /// Run a version check against the configured metadata document.
    pub async fn check_update(&self) -> Result<CheckResult> {
        UpdateChecker::from_config(&self.config, self.client.clone()).check().await
    }

    /// Self-updater for the running executable.
    pub fn updater(&self) -> Result<SelfUpdater> {
        SelfUpdater::from_config(&self.config, self.client.clone(), Arc::clone(&self.sink))
    }
}
