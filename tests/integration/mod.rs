//! Integration test suite for jnu-exam
//!
//! End-to-end tests against a local HTTP fixture server; no external network
//! is touched.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: The `jnu-exam` binary driven through `assert_cmd`
//! - **download**: File downloads with progress events and hashing
//! - **listing**: Source lists and cached directory listings
//! - **upgrade**: Version checks and the download/verify/swap sequence

mod common;

mod cli;
mod download;
mod listing;
mod upgrade;
