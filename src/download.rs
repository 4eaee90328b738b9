//! Streaming downloads.
//!
//! [`stream_to_file`] is the one place bytes move from the network to disk. It
//! writes each chunk to the destination and to a SHA-256 accumulator, reports
//! progress, and deletes the destination if anything fails so no partial file
//! is left behind. [`download_file`] uses it for listing files; the self-updater
//! uses it for the new binary.

use crate::constants::DOWNLOAD_CHUNK_SIZE;
use crate::core::{DownloaderError, Result};
use crate::http;
use crate::progress::{EventSink, ProgressReporter};
use futures::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

/// Result of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub path: PathBuf,
    pub bytes: u64,
    /// Lowercase hex SHA-256 of everything written.
    pub sha256: String,
}

/// Knobs for a single transfer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadOptions {
    /// Bound on the whole transfer. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Minimum interval between progress events. `None` emits on every chunk.
    pub throttle: Option<Duration>,
}

/// Write `stream` to `dest`, hashing and reporting as it goes.
///
/// `dest` is created or truncated. On any read or write error the file is
/// removed before the error is returned.
pub async fn stream_to_file<S, B, E>(
    stream: S,
    dest: &Path,
    reporter: &mut ProgressReporter,
) -> Result<Downloaded>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    match write_stream(stream, dest, reporter).await {
        Ok(downloaded) => Ok(downloaded),
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(dest).await
                && remove_err.kind() != std::io::ErrorKind::NotFound
            {
                warn!("Failed to remove partial file {}: {}", dest.display(), remove_err);
            }
            Err(e)
        }
    }
}

async fn write_stream<S, B, E>(
    mut stream: S,
    dest: &Path,
    reporter: &mut ProgressReporter,
) -> Result<Downloaded>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let file = fs::File::create(dest)
        .await
        .map_err(|e| DownloaderError::file_system("create download file", dest, e))?;
    let mut writer = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);
    let mut hasher = Sha256::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloaderError::network("read response body", e))?;
        let bytes = chunk.as_ref();

        writer
            .write_all(bytes)
            .await
            .map_err(|e| DownloaderError::file_system("write download file", dest, e))?;
        hasher.update(bytes);
        reporter.record(bytes.len());
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloaderError::file_system("flush download file", dest, e))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(|e| DownloaderError::file_system("sync download file", dest, e))?;

    Ok(Downloaded {
        path: dest.to_path_buf(),
        bytes: reporter.downloaded(),
        sha256: hex::encode(hasher.finalize()),
    })
}

/// Download `url` to `save_path`, emitting `download_progress` events.
///
/// Parent directories are created as needed. The event's file name is the last
/// component of `save_path`.
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    save_path: &Path,
    sink: Arc<dyn EventSink>,
    options: DownloadOptions,
) -> Result<Downloaded> {
    info!("Downloading {} -> {}", url, save_path.display());

    if let Some(parent) = save_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| DownloaderError::file_system("create download directory", parent, e))?;
    }

    let response = http::get(client, url, options.timeout, "download file").await?;
    let filename = save_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut reporter = ProgressReporter::for_file(filename, response.content_length(), sink)
        .with_throttle(options.throttle);

    let downloaded = stream_to_file(response.bytes_stream(), save_path, &mut reporter).await?;
    debug!("Downloaded {} bytes to {}", downloaded.bytes, save_path.display());
    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{ChannelSink, NullSink, ProgressEvent};
    use futures::stream;
    use tempfile::TempDir;

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = std::result::Result<&'static [u8], String>> + Unpin {
        stream::iter(parts.iter().map(|part| Ok::<&'static [u8], String>(*part)).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn test_stream_writes_and_hashes() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out.bin");
        let mut reporter = ProgressReporter::for_file("out.bin", Some(11), Arc::new(NullSink));

        let downloaded =
            stream_to_file(chunks(&[b"hello", b" ", b"world"]), &dest, &mut reporter).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"hello world");
        assert_eq!(downloaded.bytes, 11);
        assert_eq!(
            downloaded.sha256,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[tokio::test]
    async fn test_stream_error_removes_partial_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("partial.bin");
        let mut reporter = ProgressReporter::for_file("partial.bin", None, Arc::new(NullSink));

        let failing = stream::iter(vec![
            Ok::<&[u8], String>(b"first chunk"),
            Err("connection reset".to_string()),
        ]);
        let err = stream_to_file(failing, &dest, &mut reporter).await.unwrap_err();

        assert!(matches!(err, DownloaderError::Network { .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_stream_reports_progress_per_chunk() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("a.pdf");
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut reporter = ProgressReporter::for_file("a.pdf", Some(4), Arc::new(ChannelSink::new(tx)));

        stream_to_file(chunks(&[b"ab", b"cd"]), &dest, &mut reporter).await.unwrap();

        let mut percentages = Vec::new();
        while let Ok(ProgressEvent::Download(progress)) = rx.try_recv() {
            assert_eq!(progress.filename, "a.pdf");
            percentages.push(progress.percentage);
        }
        assert_eq!(percentages, vec![50.0, 100.0]);
    }
}
