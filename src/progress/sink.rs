//! Progress events and the sinks that receive them.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Payload of a `download_progress` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadProgress {
    /// File name (no directory) of the file being written.
    pub filename: String,
    /// Percentage in `0.0..=100.0`.
    pub percentage: f64,
}

/// A named progress notification.
///
/// The two names are part of the external interface: `download_progress`
/// carries `{filename, percentage}`, `update_progress` carries a bare number.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Progress of a plain file download.
    Download(DownloadProgress),
    /// Progress of the self-update binary download.
    Update(f64),
}

impl ProgressEvent {
    /// Event name for plain file downloads.
    pub const DOWNLOAD_PROGRESS: &'static str = "download_progress";
    /// Event name for the self-update download.
    pub const UPDATE_PROGRESS: &'static str = "update_progress";

    /// The event name as seen by external listeners.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Download(_) => Self::DOWNLOAD_PROGRESS,
            Self::Update(_) => Self::UPDATE_PROGRESS,
        }
    }

    /// The JSON payload as seen by external listeners.
    #[must_use]
    pub fn payload(&self) -> serde_json::Value {
        match self {
            Self::Download(progress) => serde_json::json!({
                "filename": progress.filename,
                "percentage": progress.percentage,
            }),
            Self::Update(percentage) => serde_json::json!(percentage),
        }
    }

    /// Percentage carried by either variant.
    #[must_use]
    pub const fn percentage(&self) -> f64 {
        match self {
            Self::Download(progress) => progress.percentage,
            Self::Update(percentage) => *percentage,
        }
    }
}

/// Receiver of progress events.
///
/// Implementations must be cheap: `emit` is called from the download loop.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn emit(&self, event: ProgressEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Logs every event at `debug` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: ProgressEvent) {
        debug!(event = event.name(), payload = %event.payload(), "progress");
    }
}

/// Forwards events to a tokio channel, for listeners living on another task.
///
/// Events are dropped silently once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    /// Wrap the sending half of an unbounded channel.
    #[must_use]
    pub const fn new(tx: UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}
