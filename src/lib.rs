//! JNU-EXAM downloader
//!
//! Browses the JNU exam-material mirrors, downloads files from them with progress
//! reporting, and upgrades its own executable in place.
//!
//! # Architecture Overview
//!
//! ```text
//! listing sources ──> DirectoryCache ──> Node tree ──> download_file
//!
//! metadata document ──> UpdateChecker ──> SelfUpdater ──> restart
//!                                              │
//!                        startup reaper <── <exe>.old
//! ```
//!
//! - Directory documents are decoded once into a typed [`listing::Node`] tree and
//!   cached per URL for the life of the process.
//! - Updates are streamed to a temporary file while hashed, verified against the
//!   published SHA-256, and swapped in with a single `.old` backup that is
//!   restored if the swap fails.
//!
//! # Core Modules
//!
//! ## Listings
//! - [`listing`] - Sources and the typed directory tree
//! - [`cache`] - URL-keyed concurrent cache of decoded trees
//! - [`download`] - Streaming file downloads with hashing and progress
//!
//! ## Self-Update
//! - [`upgrade`] - Version check, download/verify/swap, backup reaper
//!
//! ## Supporting Modules
//! - [`app`] - Facade tying config, HTTP client, cache, and progress together
//! - [`cli`] - Command-line interface
//! - [`config`] - `config.toml` loading
//! - [`core`] - Error types
//! - [`http`] - Shared HTTP helpers
//! - [`progress`] - Progress events and the byte-counting reporter
//! - [`utils`] - Platform helpers and terminal progress bars

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod download;
pub mod http;
pub mod listing;
pub mod progress;
pub mod upgrade;
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
