//! Error handling for the downloader
//!
//! Two layers, the same way the CLI reports everything else:
//! - [`DownloaderError`] - strongly typed failures returned by the library
//! - [`ErrorContext`] - a user-facing wrapper with details and a suggestion
//!
//! # Error Categories
//!
//! - **Network**: [`DownloaderError::Network`] for timeouts, refused connections and
//!   non-success HTTP statuses
//! - **Decoding**: [`DownloaderError::Decode`] for malformed JSON documents
//! - **Integrity**: [`DownloaderError::ChecksumMismatch`] when a downloaded binary does
//!   not hash to the published digest
//! - **File System**: [`DownloaderError::FileSystem`] for create/rename/permission
//!   failures, including the executable swap
//!
//! None of these ever terminate the process on their own. The only deliberate exit
//! is the one that follows a completed self-update.
//!
//! # Examples
//!
//! ```rust,no_run
//! use jnu_exam::core::{DownloaderError, user_friendly_error};
//!
//! let err = DownloaderError::ChecksumMismatch {
//!     expected: "abc".to_string(),
//!     actual: "def".to_string(),
//! };
//! user_friendly_error(anyhow::Error::from(err)).display();
//! ```

use colored::Colorize;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Convenience alias used across the library.
pub type Result<T, E = DownloaderError> = std::result::Result<T, E>;

/// The main error type for downloader operations.
#[derive(Error, Debug)]
pub enum DownloaderError {
    /// A request could not be completed (connection failure, timeout, HTTP status)
    #[error("Network error during {operation}: {reason}")]
    Network {
        /// What was being fetched, e.g. "update metadata"
        operation: String,
        /// Underlying transport error or HTTP status
        reason: String,
    },

    /// A fetched document could not be decoded
    #[error("Failed to decode {document}: {reason}")]
    Decode {
        /// Which document failed to parse
        document: String,
        /// Parser error message
        reason: String,
    },

    /// A downloaded file does not match its published digest
    #[error("Checksum verification failed: expected {expected}, actual {actual}")]
    ChecksumMismatch {
        /// Digest published in the metadata document
        expected: String,
        /// Digest computed over the received bytes
        actual: String,
    },

    /// A file system operation failed
    #[error("File system error: {operation} ({path}): {reason}")]
    FileSystem {
        /// The operation that failed, e.g. "rename executable to backup"
        operation: String,
        /// Path involved in the failure
        path: String,
        /// Underlying I/O error message
        reason: String,
    },

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// A named source or a path inside a listing does not exist
    #[error("{what} not found")]
    NotFound {
        /// Human readable description of the missing item
        what: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl DownloaderError {
    /// Build a [`DownloaderError::Network`] from any displayable transport error.
    pub fn network(operation: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Network {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`DownloaderError::Decode`] from any displayable parser error.
    pub fn decode(document: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::Decode {
            document: document.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`DownloaderError::FileSystem`] for `operation` on `path`.
    pub fn file_system(
        operation: impl Into<String>,
        path: &Path,
        reason: impl fmt::Display,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Error context wrapper that provides user-friendly error information
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: DownloaderError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: DownloaderError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: message in red, details in yellow,
    /// suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with a suggestion where one is known.
///
/// Typed [`DownloaderError`]s anywhere in the `anyhow` chain are recognised; bare
/// I/O errors get a generic file-access hint; everything else is shown verbatim
/// with the full context chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    // Only unwrap the typed error when no context was layered on top of it.
    let is_bare = error
        .downcast_ref::<DownloaderError>()
        .is_some_and(|typed| typed.to_string() == error.to_string());
    let error = if is_bare {
        match error.downcast::<DownloaderError>() {
            Ok(typed) => return create_error_context(typed),
            Err(error) => error,
        }
    } else {
        error
    };

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(DownloaderError::Other {
                    message: format!("{error:#}"),
                })
                .with_suggestion(
                    "Check file ownership, or run from a directory you can write to",
                );
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(DownloaderError::Other {
                    message: format!("{error:#}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    // Typed errors wrapped in context: keep the context, but still suggest.
    let typed_hint = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<DownloaderError>())
        .map(suggestion_for);

    let ctx = ErrorContext::new(DownloaderError::Other {
        message: format!("{error:#}"),
    });
    match typed_hint {
        Some((suggestion, details)) => ctx.with_suggestion(suggestion).with_details(details),
        None => ctx,
    }
}

fn create_error_context(error: DownloaderError) -> ErrorContext {
    let (suggestion, details) = suggestion_for(&error);
    ErrorContext::new(error).with_suggestion(suggestion).with_details(details)
}

fn suggestion_for(error: &DownloaderError) -> (&'static str, &'static str) {
    match error {
        DownloaderError::Network { .. } => (
            "Check your internet connection, or switch to another source",
            "The server did not answer in time or returned an error status",
        ),
        DownloaderError::Decode { .. } => (
            "The published document is malformed; try again later or use another source",
            "The response was received but is not the JSON structure the client expects",
        ),
        DownloaderError::ChecksumMismatch { .. } => (
            "Retry the update; if it keeps failing, download the release manually",
            "The downloaded binary was discarded and the installed version was left untouched",
        ),
        DownloaderError::FileSystem { .. } => (
            "Make sure the install directory is writable and the executable is not locked",
            "Any partially applied update has been rolled back where possible",
        ),
        DownloaderError::Config { .. } => (
            "Fix or remove the configuration file; defaults are used when it is absent",
            "The configuration file is TOML",
        ),
        DownloaderError::NotFound { .. } => (
            "Run `jnu-exam sources` or `jnu-exam ls <source>` to see what is available",
            "Names and paths are matched exactly",
        ),
        DownloaderError::Io(_) | DownloaderError::Other { .. } => (
            "Run with --verbose for more information",
            "An unexpected error occurred",
        ),
    }
}
