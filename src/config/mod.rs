//! Configuration management.
//!
//! - [`global`] - the TOML configuration file ([`AppConfig`]) and its network timeouts
//! - [`crate::upgrade::config`] - self-update knobs, nested under `[upgrade]`
//!
//! Every field has a default so a fresh installation runs without any file.

pub mod global;

pub use global::{AppConfig, NetworkConfig, builtin_sources};
