//! Byte-counting write observer.

use super::sink::{DownloadProgress, EventSink, ProgressEvent};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a reporter is reporting on; decides the event it emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressLabel {
    /// A plain file download, reported as `download_progress`.
    File(String),
    /// The self-update binary, reported as `update_progress`.
    SelfUpdate,
}

/// Tracks bytes written against an expected total and emits percentages.
///
/// Each [`record`](Self::record) of `n` bytes advances the counter and emits
/// `100 * downloaded / total`. When the total is unknown (absent or zero) nothing
/// is emitted, so listeners never see `NaN` or infinity.
///
/// The reporter also implements [`std::io::Write`], discarding the data, so it can
/// observe any writer through a tee.
///
/// # Examples
///
/// ```rust
/// use jnu_exam::progress::{NullSink, ProgressReporter};
/// use std::sync::Arc;
///
/// let mut reporter = ProgressReporter::for_file("a.pdf", Some(200), Arc::new(NullSink));
/// reporter.record(50);
/// assert_eq!(reporter.percentage(), Some(25.0));
/// ```
pub struct ProgressReporter {
    label: ProgressLabel,
    total: Option<u64>,
    downloaded: u64,
    sink: Arc<dyn EventSink>,
    throttle: Option<Duration>,
    last_emit: Option<Instant>,
}

impl ProgressReporter {
    /// Reporter for a plain file download.
    pub fn for_file(
        filename: impl Into<String>,
        total: Option<u64>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self::new(ProgressLabel::File(filename.into()), total, sink)
    }

    /// Reporter for the self-update binary download.
    pub fn for_update(total: Option<u64>, sink: Arc<dyn EventSink>) -> Self {
        Self::new(ProgressLabel::SelfUpdate, total, sink)
    }

    fn new(label: ProgressLabel, total: Option<u64>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            label,
            total: total.filter(|&t| t > 0),
            downloaded: 0,
            sink,
            throttle: None,
            last_emit: None,
        }
    }

    /// Emit at most once per `interval`. `None` emits on every write.
    #[must_use]
    pub const fn with_throttle(mut self, interval: Option<Duration>) -> Self {
        self.throttle = interval;
        self
    }

    /// Bytes observed so far.
    #[must_use]
    pub const fn downloaded(&self) -> u64 {
        self.downloaded
    }

    /// Current percentage, or `None` when the total is unknown.
    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.total
            .map(|total| (self.downloaded as f64 / total as f64 * 100.0).min(100.0))
    }

    /// Observe a write of `n` bytes.
    pub fn record(&mut self, n: usize) {
        self.downloaded = self.downloaded.saturating_add(n as u64);

        let Some(percentage) = self.percentage() else {
            return;
        };

        if !self.should_emit() {
            return;
        }
        self.last_emit = Some(Instant::now());

        let event = match &self.label {
            ProgressLabel::File(filename) => ProgressEvent::Download(DownloadProgress {
                filename: filename.clone(),
                percentage,
            }),
            ProgressLabel::SelfUpdate => ProgressEvent::Update(percentage),
        };
        self.sink.emit(event);
    }

    fn should_emit(&self) -> bool {
        let complete = self.total.is_some_and(|total| self.downloaded >= total);
        match (self.throttle, self.last_emit) {
            (Some(interval), Some(last)) => complete || last.elapsed() >= interval,
            _ => true,
        }
    }
}

impl std::io::Write for ProgressReporter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.record(buf.len());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
