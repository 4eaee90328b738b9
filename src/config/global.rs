//! Application configuration.
//!
//! The configuration is a TOML file holding the values the original client compiled
//! in: the running version, where update metadata lives, which listing sources exist,
//! and the network timeouts. Everything has a default, so the file is optional.
//!
//! # File Location
//!
//! Resolved in this order:
//! 1. an explicit path (`--config <path>`)
//! 2. the `JNU_EXAM_CONFIG` environment variable
//! 3. **Unix/macOS**: `~/.jnu-exam/config.toml`, **Windows**: `%LOCALAPPDATA%\jnu-exam\config.toml`
//!
//! # File Format
//!
//! ```toml
//! metadata_url = "https://jnuexam.gubaiovo.com/metadata.json"
//! default_source = "cloudflare"
//!
//! [sources.mirror]
//! json_url = "https://mirror.example.com/directory_structure.json"
//! file_key = "cf_url"
//!
//! [network]
//! metadata_timeout_secs = 5
//! download_timeout_secs = 600
//!
//! [upgrade]
//! progress_throttle_ms = 100
//! ```

use crate::constants::{
    CONFIG_PATH_ENV, CURRENT_VERSION, DEFAULT_METADATA_URL, DEFAULT_PRODUCT_NAME,
    DIRECTORY_TIMEOUT, METADATA_TIMEOUT, SOURCE_LIST_TIMEOUT,
};
use crate::core::{DownloaderError, Result};
use crate::listing::SourceConfig;
use crate::upgrade::config::UpgradeConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Network timeouts, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Timeout for the update metadata document.
    #[serde(default = "default_metadata_timeout_secs")]
    pub metadata_timeout_secs: u64,

    /// Timeout for source list documents.
    #[serde(default = "default_source_list_timeout_secs")]
    pub source_list_timeout_secs: u64,

    /// Timeout for directory listing documents.
    #[serde(default = "default_directory_timeout_secs")]
    pub directory_timeout_secs: u64,

    /// Overall timeout for file and binary downloads. `None` means no limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_timeout_secs: Option<u64>,
}

const fn default_metadata_timeout_secs() -> u64 {
    METADATA_TIMEOUT.as_secs()
}

const fn default_source_list_timeout_secs() -> u64 {
    SOURCE_LIST_TIMEOUT.as_secs()
}

const fn default_directory_timeout_secs() -> u64 {
    DIRECTORY_TIMEOUT.as_secs()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            metadata_timeout_secs: default_metadata_timeout_secs(),
            source_list_timeout_secs: default_source_list_timeout_secs(),
            directory_timeout_secs: default_directory_timeout_secs(),
            download_timeout_secs: None,
        }
    }
}

impl NetworkConfig {
    /// Timeout applied to the metadata request.
    #[must_use]
    pub const fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    /// Timeout applied to source list requests.
    #[must_use]
    pub const fn source_list_timeout(&self) -> Duration {
        Duration::from_secs(self.source_list_timeout_secs)
    }

    /// Timeout applied to directory listing requests.
    #[must_use]
    pub const fn directory_timeout(&self) -> Duration {
        Duration::from_secs(self.directory_timeout_secs)
    }

    /// Timeout applied to whole-file downloads, if any.
    #[must_use]
    pub fn download_timeout(&self) -> Option<Duration> {
        self.download_timeout_secs.map(Duration::from_secs)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version reported by this installation. Defaults to the crate version.
    #[serde(default = "default_current_version", skip_serializing_if = "is_default_version")]
    pub current_version: String,

    /// URL of the update/notice metadata document.
    #[serde(default = "default_metadata_url")]
    pub metadata_url: String,

    /// Product name; the updated executable is written as `<product_name>[.exe]`.
    #[serde(default = "default_product_name")]
    pub product_name: String,

    /// Optional remote source list that extends the built-in sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_url: Option<String>,

    /// Listing sources by name. Merged over the built-in ones.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sources: BTreeMap<String, SourceConfig>,

    /// Source used when the command line does not name one.
    #[serde(default = "default_source_name")]
    pub default_source: String,

    /// Network timeouts.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Self-update behaviour.
    #[serde(default)]
    pub upgrade: UpgradeConfig,
}

fn default_current_version() -> String {
    CURRENT_VERSION.to_string()
}

fn is_default_version(version: &String) -> bool {
    version == CURRENT_VERSION
}

fn default_metadata_url() -> String {
    DEFAULT_METADATA_URL.to_string()
}

fn default_product_name() -> String {
    DEFAULT_PRODUCT_NAME.to_string()
}

fn default_source_name() -> String {
    "cloudflare".to_string()
}

/// The three mirrors the project publishes its listing to.
#[must_use]
pub fn builtin_sources() -> BTreeMap<String, SourceConfig> {
    let mut sources = BTreeMap::new();
    sources.insert(
        "github".to_string(),
        SourceConfig::new(
            "https://raw.githubusercontent.com/gubaiovo/JNU-EXAM/main/directory_structure.json",
            "github_raw_url",
        ),
    );
    sources.insert(
        "gitee".to_string(),
        SourceConfig::new(
            "https://gitee.com/gubaiovo/jnu-exam/raw/main/directory_structure.json",
            "gitee_raw_url",
        ),
    );
    sources.insert(
        "cloudflare".to_string(),
        SourceConfig::new("https://jnuexam.xyz/directory_structure.json", "cf_url"),
    );
    sources
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            current_version: default_current_version(),
            metadata_url: default_metadata_url(),
            product_name: default_product_name(),
            sources_url: None,
            sources: BTreeMap::new(),
            default_source: default_source_name(),
            network: NetworkConfig::default(),
            upgrade: UpgradeConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing file yields [`AppConfig::default`].
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load and parse a config file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await.map_err(|e| DownloaderError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;

        toml::from_str(&content).map_err(|e| DownloaderError::Config {
            message: format!("Failed to parse {}: {e}", path.display()),
        })
    }

    /// Serialize and write the config, creating the parent directory.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloaderError::file_system("create config directory", parent, e))?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| DownloaderError::Config {
            message: format!("Failed to serialize config: {e}"),
        })?;

        fs::write(path, content)
            .await
            .map_err(|e| DownloaderError::file_system("write config", path, e))
    }

    /// Platform-specific default config location, honouring `JNU_EXAM_CONFIG`.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| DownloaderError::Config {
                    message: "Unable to determine local data directory".to_string(),
                })?
                .join("jnu-exam")
        } else {
            dirs::home_dir()
                .ok_or_else(|| DownloaderError::Config {
                    message: "Unable to determine home directory".to_string(),
                })?
                .join(".jnu-exam")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Built-in sources with the configured ones layered on top.
    #[must_use]
    pub fn merged_sources(&self) -> BTreeMap<String, SourceConfig> {
        let mut merged = builtin_sources();
        for (name, source) in &self.sources {
            merged.insert(name.clone(), source.clone());
        }
        merged
    }
}
