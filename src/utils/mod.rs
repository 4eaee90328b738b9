//! Cross-platform utilities
//!
//! # Modules
//!
//! - [`platform`] - platform keys, executable suffix, download locations, file names
//! - [`progress`] - terminal progress bars and the terminal progress sink

pub mod platform;
pub mod progress;

pub use platform::{is_windows, platform_key, sanitize_filename};
pub use progress::{ProgressBar, TerminalSink, spinner_with_message};
