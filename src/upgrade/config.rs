use crate::constants::{REAPER_ATTEMPTS, REAPER_DELAY};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration settings for self-update behavior.
///
/// Lives under the `[upgrade]` table of the application config.
///
/// # Default Behavior
///
/// - Five attempts, one second apart, to delete a stale `.old` backup at startup
/// - Progress events emitted for every received chunk (no throttling)
///
/// # TOML Example
/// ```toml
/// [upgrade]
/// reaper_attempts = 5
/// reaper_delay_ms = 1000
/// progress_throttle_ms = 0
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// How many times the startup reaper tries to delete `<executable>.old`.
    ///
    /// Windows keeps the previous executable locked for a moment after a restart,
    /// so the first attempts are expected to fail there.
    #[serde(default = "default_reaper_attempts")]
    pub reaper_attempts: u32,

    /// Delay between reaper attempts, in milliseconds.
    #[serde(default = "default_reaper_delay_ms")]
    pub reaper_delay_ms: u64,

    /// Minimum interval between two progress events, in milliseconds.
    ///
    /// `0` emits on every chunk. The final 100% event is always delivered.
    #[serde(default)]
    pub progress_throttle_ms: u64,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            reaper_attempts: default_reaper_attempts(),
            reaper_delay_ms: default_reaper_delay_ms(),
            progress_throttle_ms: 0,
        }
    }
}

const fn default_reaper_attempts() -> u32 {
    REAPER_ATTEMPTS
}

const fn default_reaper_delay_ms() -> u64 {
    REAPER_DELAY.as_millis() as u64
}

impl UpgradeConfig {
    /// Create a new `UpgradeConfig` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay between two reaper attempts.
    #[must_use]
    pub const fn reaper_delay(&self) -> Duration {
        Duration::from_millis(self.reaper_delay_ms)
    }

    /// Progress throttle, or `None` when every chunk should be reported.
    #[must_use]
    pub const fn progress_throttle(&self) -> Option<Duration> {
        if self.progress_throttle_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.progress_throttle_ms))
        }
    }
}
