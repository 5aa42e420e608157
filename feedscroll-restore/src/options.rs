use serde::{Deserialize, Serialize};

use crate::store::DEFAULT_RETENTION_MS;

/// Tuning for [`crate::RestoreCoordinator`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestoreOptions {
    /// Attempts before a restore is abandoned.
    pub max_attempts: u32,
    pub initial_retry_delay_ms: u64,
    pub retry_delay_step_ms: u64,
    pub max_retry_delay_ms: u64,

    /// A live offset within this distance of the target counts as restored.
    pub tolerance_px: f64,

    /// Attempts issued with an instant scroll; later attempts scroll smoothly.
    pub instant_attempts: u32,

    /// Minimum spacing between two captures of the live offset while scrolling.
    pub scroll_throttle_ms: u64,
    /// Quiet period after the last capture before it is written to the store.
    pub save_debounce_ms: u64,

    /// Records not visited for this long are swept on every activation.
    pub retention_ms: u64,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl RestoreOptions {
    pub fn new() -> Self {
        Self {
            max_attempts: 8,
            initial_retry_delay_ms: 100,
            retry_delay_step_ms: 100,
            max_retry_delay_ms: 500,
            tolerance_px: 10.0,
            instant_attempts: 2,
            scroll_throttle_ms: 50,
            save_debounce_ms: 200,
            retention_ms: DEFAULT_RETENTION_MS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the linear backoff: `min(initial + attempt * step, max)`.
    pub fn with_retry_delay(mut self, initial_ms: u64, step_ms: u64, max_ms: u64) -> Self {
        self.initial_retry_delay_ms = initial_ms;
        self.retry_delay_step_ms = step_ms;
        self.max_retry_delay_ms = max_ms;
        self
    }

    pub fn with_tolerance_px(mut self, tolerance_px: f64) -> Self {
        self.tolerance_px = tolerance_px;
        self
    }

    pub fn with_instant_attempts(mut self, instant_attempts: u32) -> Self {
        self.instant_attempts = instant_attempts;
        self
    }

    pub fn with_scroll_throttle_ms(mut self, throttle_ms: u64) -> Self {
        self.scroll_throttle_ms = throttle_ms;
        self
    }

    pub fn with_save_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.save_debounce_ms = debounce_ms;
        self
    }

    pub fn with_retention_ms(mut self, retention_ms: u64) -> Self {
        self.retention_ms = retention_ms;
        self
    }

    /// Delay before the attempt after `attempt`.
    pub fn retry_delay_ms(&self, attempt: u32) -> u64 {
        self.retry_delay_step_ms
            .saturating_mul(u64::from(attempt))
            .saturating_add(self.initial_retry_delay_ms)
            .min(self.max_retry_delay_ms)
    }
}
