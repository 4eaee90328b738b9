//! Progress reporting for downloads.
//!
//! A [`ProgressReporter`] observes bytes as they are written and turns them into
//! [`ProgressEvent`]s delivered to an [`EventSink`]. The sink is the boundary to
//! whatever displays progress: a terminal bar ([`crate::utils::progress::TerminalSink`]),
//! the log, or a channel feeding another task.

pub mod reporter;
pub mod sink;

pub use reporter::{ProgressLabel, ProgressReporter};
pub use sink::{ChannelSink, DownloadProgress, EventSink, LogSink, NullSink, ProgressEvent};
