//! Self-update for the downloader executable.
//!
//! # Architecture Overview
//!
//! - **[`UpdateChecker`]**: fetches the metadata document and decides whether an
//!   update applies to this platform ([`version_check::evaluate`] is the pure
//!   decision)
//! - **[`SelfUpdater`]**: downloads, verifies, and swaps in the new executable,
//!   then restarts
//! - **[`backup::BackupManager`]**: the single `<executable>.old` backup and the
//!   startup reaper that deletes it
//! - **[`ChecksumVerifier`]**: SHA-256 comparison
//! - **[`config::UpgradeConfig`]**: reaper and progress settings
//!
//! ## Update Process Flow
//!
//! ```text
//! 1. Check
//!    ├── GET metadata document (5 s timeout)
//!    └── has_update = remote version != local && target for <os>-<arch>
//!
//! 2. Download
//!    ├── stream to update.tmp while hashing
//!    └── emit update_progress when the length is known
//!
//! 3. Verify
//!    └── compare against the published checksum (skipped when empty)
//!
//! 4. Swap
//!    ├── remove old .old
//!    ├── executable -> .old
//!    └── update.tmp -> target (on failure: .old -> executable)
//!
//! 5. Restart
//!    └── spawn target detached, exit 0
//! ```
//!
//! The reaper runs at every startup, independently of the steps above, and
//! removes the `.old` file the previous update left behind.
//!
//! # Usage
//!
//! ```rust,no_run
//! use jnu_exam::config::AppConfig;
//! use jnu_exam::progress::LogSink;
//! use jnu_exam::upgrade::{SelfUpdater, UpdateChecker};
//! use std::sync::Arc;
//!
//! # async fn example() -> jnu_exam::core::Result<()> {
//! let config = AppConfig::default();
//! let client = jnu_exam::http::build_client()?;
//!
//! let result = UpdateChecker::from_config(&config, client.clone()).check().await?;
//! if result.has_update {
//!     let updater = SelfUpdater::from_config(&config, client, Arc::new(LogSink))?;
//!     updater.perform_self_update(&result.download_url, &result.checksum).await?;
//! }
//! # Ok(())
//! # }
//! ```

/// The `.old` backup and the startup reaper.
pub mod backup;
/// `[upgrade]` configuration.
pub mod config;
/// Download, verify, swap, restart.
pub mod self_updater;
/// SHA-256 verification.
pub mod verification;
/// Metadata document types and the update decision.
pub mod version_check;

pub use backup::{BackupManager, ReapOutcome, spawn_reaper};
pub use self_updater::{SelfUpdater, UpdatePaths};
pub use verification::{ChecksumVerifier, Verification};
pub use version_check::{
    AppMetadata, CheckResult, NoticeMetadata, PlatformKey, PlatformTarget, UpdateChecker,
    UpdateMetadata, evaluate,
};
