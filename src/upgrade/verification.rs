use crate::core::{DownloaderError, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

/// Outcome of comparing a computed digest against a published one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The digests matched.
    Verified,
    /// No digest was published, so nothing was compared.
    Skipped,
}

/// SHA-256 integrity checks for downloaded binaries.
///
/// Digests are lowercase hex, and comparison is an exact, case-sensitive
/// string match against what the metadata document publishes.
///
/// # Trust on first use
///
/// An empty published checksum skips verification and the binary is accepted
/// as downloaded. That is a deliberate compatibility choice for metadata
/// documents that predate checksums; it means such an update is only as
/// trustworthy as the transport that delivered it. Every skip is logged at
/// `warn`.
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Lowercase hex SHA-256 of a file.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use jnu_exam::upgrade::verification::ChecksumVerifier;
    /// use std::path::Path;
    ///
    /// # async fn example() -> jnu_exam::core::Result<()> {
    /// let checksum = ChecksumVerifier::compute_sha256(Path::new("JNU-EXAM-Downloader.exe")).await?;
    /// println!("{checksum}");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn compute_sha256(file_path: &Path) -> Result<String> {
        debug!("Computing SHA256 checksum for: {:?}", file_path);

        let contents = fs::read(file_path)
            .await
            .map_err(|e| DownloaderError::file_system("read file for checksum", file_path, e))?;

        Ok(hex::encode(Sha256::digest(&contents)))
    }

    /// Compare a computed digest with the published one.
    ///
    /// An empty `expected` yields [`Verification::Skipped`]; any other
    /// difference is [`DownloaderError::ChecksumMismatch`].
    pub fn verify(expected: &str, actual: &str) -> Result<Verification> {
        if expected.is_empty() {
            warn!("No checksum published; accepting download without verification");
            return Ok(Verification::Skipped);
        }

        if expected != actual {
            return Err(DownloaderError::ChecksumMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }

        info!("Checksum verification successful");
        Ok(Verification::Verified)
    }

    /// Hash `file_path` and [`verify`](Self::verify) it against `expected`.
    pub async fn verify_file(file_path: &Path, expected: &str) -> Result<Verification> {
        let actual = Self::compute_sha256(file_path).await?;
        Self::verify(expected, &actual)
    }
}
