use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::core::Result;
use crate::http;
use crate::utils::platform::platform_key;

/// Download target for one `<os>-<arch>` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTarget {
    #[serde(default)]
    pub url: String,
    /// Lowercase hex SHA-256 of the binary; empty when unpublished.
    #[serde(default)]
    pub checksum: String,
}

/// The `update` half of the metadata document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMetadata {
    #[serde(default)]
    pub version: String,
    /// Whether clients must apply this update.
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformTarget>,
}

/// Announcement carried alongside update information.
///
/// Nothing in the update flow acts on it; it is handed to the caller as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeMetadata {
    #[serde(default)]
    pub show: bool,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// The whole metadata document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub notice: NoticeMetadata,
    #[serde(default)]
    pub update: UpdateMetadata,
}

/// Result of one version check.
///
/// Serializes with the field names front ends already consume
/// (`has_update`, `current_ver`, `remote_ver`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub has_update: bool,
    pub current_ver: String,
    pub remote_ver: String,
    pub update_desc: String,
    pub is_force: bool,
    /// Empty when no target exists for this platform.
    pub download_url: String,
    pub checksum: String,
    pub notice: NoticeMetadata,
}

/// Normalized `<os>-<arch>` key used to select a [`PlatformTarget`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformKey(String);

impl PlatformKey {
    /// Key of the running process.
    #[must_use]
    pub fn current() -> Self {
        Self(platform_key())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlatformKey {
    fn from(key: &str) -> Self {
        Self(key.to_lowercase())
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decide whether `metadata` offers an update to `local_version` on `platform`.
///
/// An update is offered only when the remote version differs from the local
/// one and the document has a target for this platform. The comparison is a
/// plain string inequality, so publishing an older version also counts.
#[must_use]
pub fn evaluate(metadata: &AppMetadata, local_version: &str, platform: &PlatformKey) -> CheckResult {
    let update = &metadata.update;
    let target = update.platforms.get(platform.as_str());

    if target.is_none() {
        debug!(
            "No update target for {} (published: {:?})",
            platform,
            update.platforms.keys().collect::<Vec<_>>()
        );
    }

    let has_update = update.version != local_version && target.is_some();
    let target = target.cloned().unwrap_or_default();

    CheckResult {
        has_update,
        current_ver: local_version.to_string(),
        remote_ver: update.version.clone(),
        update_desc: update.desc.clone(),
        is_force: update.force,
        download_url: target.url,
        checksum: target.checksum,
        notice: metadata.notice.clone(),
    }
}

/// Fetches the metadata document and evaluates it for this installation.
///
/// Checking has no side effects beyond logging and can be repeated freely;
/// the document is fetched fresh every time.
pub struct UpdateChecker {
    client: reqwest::Client,
    metadata_url: String,
    local_version: String,
    timeout: Duration,
    platform: PlatformKey,
}

impl UpdateChecker {
    /// Checker for the running platform using `config`'s URL, version and timeout.
    pub fn from_config(config: &AppConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            metadata_url: config.metadata_url.clone(),
            local_version: config.current_version.clone(),
            timeout: config.network.metadata_timeout(),
            platform: PlatformKey::current(),
        }
    }

    /// Evaluate against another platform's targets.
    #[must_use]
    pub fn with_platform(mut self, platform: PlatformKey) -> Self {
        self.platform = platform;
        self
    }

    /// Fetch the raw metadata document.
    pub async fn fetch_metadata(&self) -> Result<AppMetadata> {
        http::get_json(&self.client, &self.metadata_url, self.timeout, "update metadata").await
    }

    /// Fetch and evaluate.
    ///
    /// Transport failures and HTTP errors are [`crate::core::DownloaderError::Network`];
    /// a body that is not a metadata document is
    /// [`crate::core::DownloaderError::Decode`].
    pub async fn check(&self) -> Result<CheckResult> {
        info!("Checking for updates at {}", self.metadata_url);

        let metadata = self.fetch_metadata().await.inspect_err(|e| {
            warn!("Update check failed: {}", e);
        })?;
        debug!("Remote version: {}", metadata.update.version);

        let result = evaluate(&metadata, &self.local_version, &self.platform);
        info!(
            "Update available: {} (local {}, remote {}, platform {})",
            result.has_update, result.current_ver, result.remote_ver, self.platform
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(version: &str, platforms: &[(&str, &str, &str)]) -> AppMetadata {
        AppMetadata {
            notice: NoticeMetadata {
                show: true,
                id: "n-1".to_string(),
                title: "Exam season".to_string(),
                content: "Mirrors refreshed".to_string(),
            },
            update: UpdateMetadata {
                version: version.to_string(),
                force: false,
                desc: "Fixes".to_string(),
                platforms: platforms
                    .iter()
                    .map(|(key, url, checksum)| {
                        (
                            (*key).to_string(),
                            PlatformTarget {
                                url: (*url).to_string(),
                                checksum: (*checksum).to_string(),
                            },
                        )
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn test_same_version_has_no_update() {
        let meta = metadata("2.1.1", &[("linux-amd64", "https://dl/linux", "abc")]);
        let result = evaluate(&meta, "2.1.1", &PlatformKey::from("linux-amd64"));
        assert!(!result.has_update);
        assert_eq!(result.remote_ver, "2.1.1");
    }

    #[test]
    fn test_missing_platform_has_no_update() {
        let meta = metadata("2.2.0", &[]);
        let result = evaluate(&meta, "2.1.1", &PlatformKey::from("linux-amd64"));
        assert!(!result.has_update);
        assert!(result.download_url.is_empty());
        assert!(result.checksum.is_empty());
        assert_eq!(result.remote_ver, "2.2.0");
    }

    #[test]
    fn test_new_version_with_target_has_update() {
        let meta = metadata("2.2.0", &[("linux-amd64", "https://dl/linux", "deadbeef")]);
        let result = evaluate(&meta, "2.1.1", &PlatformKey::from("linux-amd64"));
        assert!(result.has_update);
        assert_eq!(result.current_ver, "2.1.1");
        assert_eq!(result.download_url, "https://dl/linux");
        assert_eq!(result.checksum, "deadbeef");
        assert_eq!(result.update_desc, "Fixes");
        assert_eq!(result.notice.title, "Exam season");
    }

    #[test]
    fn test_other_platform_target_is_ignored() {
        let meta = metadata("2.2.0", &[("windows-amd64", "https://dl/win", "")]);
        let result = evaluate(&meta, "2.1.1", &PlatformKey::from("Linux-AMD64"));
        assert!(!result.has_update);
    }

    #[test]
    fn test_decode_document_with_missing_fields() {
        let meta: AppMetadata = serde_json::from_str(
            r#"{"update": {"version": "2.2.0", "force": true,
                "platforms": {"darwin-arm64": {"url": "https://dl/mac"}}}}"#,
        )
        .unwrap();

        assert!(meta.update.force);
        assert!(!meta.notice.show);
        assert_eq!(meta.update.platforms["darwin-arm64"].checksum, "");

        let result = evaluate(&meta, "2.1.1", &PlatformKey::from("darwin-arm64"));
        assert!(result.has_update);
        assert!(result.is_force);
    }

    #[test]
    fn test_check_result_field_names() {
        let result = evaluate(&metadata("2.1.1", &[]), "2.1.1", &PlatformKey::current());
        let json = serde_json::to_value(&result).unwrap();
        for field in [
            "has_update",
            "current_ver",
            "remote_ver",
            "update_desc",
            "is_force",
            "download_url",
            "checksum",
            "notice",
        ] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }
}
