//! Terminal progress indicators.
//!
//! Thin wrappers over `indicatif` that respect the `JNU_EXAM_NO_PROGRESS`
//! environment variable (set by `--no-progress`), plus [`TerminalSink`], the
//! [`EventSink`] the CLI uses to draw download and update progress.

use crate::constants::NO_PROGRESS_ENV;
use crate::progress::{EventSink, ProgressEvent};
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::sync::Mutex;
use std::time::Duration;

fn is_progress_disabled() -> bool {
    std::env::var(NO_PROGRESS_ENV).is_ok()
}

/// A progress bar or spinner that is hidden when progress output is disabled.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Percentage bar (length 100).
    pub fn new_percent() -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(100);
            bar.set_style(percent_style());
            bar
        };
        Self { inner: bar }
    }

    /// Ticking spinner with a message.
    pub fn new_spinner() -> Self {
        let bar = if is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new_spinner();
            bar.set_style(spinner_style());
            bar.enable_steady_tick(Duration::from_millis(100));
            bar
        };
        Self { inner: bar }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    pub fn set_position(&self, pos: u64) {
        self.inner.set_position(pos);
    }

    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

fn percent_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>3}%")
        .unwrap_or_else(|_| IndicatifStyle::default_bar())
        .progress_chars("━╸━")
}

fn spinner_style() -> IndicatifStyle {
    IndicatifStyle::default_spinner()
        .template("{prefix:.bold} {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

/// Spinner that is already showing `msg`.
pub fn spinner_with_message(msg: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(msg);
    spinner
}

/// Draws one percentage bar per transfer.
///
/// A bar is created on the first event for a label and finished when it reaches
/// 100% or when an event for a different label arrives.
#[derive(Default)]
pub struct TerminalSink {
    current: Mutex<Option<(String, ProgressBar)>>,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for TerminalSink {
    fn emit(&self, event: ProgressEvent) {
        let label = match &event {
            ProgressEvent::Download(progress) => progress.filename.clone(),
            ProgressEvent::Update(_) => "update".to_string(),
        };

        let Ok(mut current) = self.current.lock() else {
            return;
        };

        let reuse = current.as_ref().is_some_and(|(name, _)| *name == label);
        if !reuse {
            if let Some((_, old)) = current.take() {
                old.finish_and_clear();
            }
            let bar = ProgressBar::new_percent();
            bar.set_prefix(label.clone());
            *current = Some((label, bar));
        }

        let percentage = event.percentage();
        if let Some((_, bar)) = current.as_ref() {
            bar.set_position(percentage.round() as u64);
        }
        if percentage >= 100.0
            && let Some((_, bar)) = current.take()
        {
            bar.finish_and_clear();
        }
    }
}
