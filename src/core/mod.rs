//! Core types shared by every module: the error taxonomy and its
//! user-facing rendering.

pub mod error;

pub use error::{DownloaderError, ErrorContext, Result, user_friendly_error};
