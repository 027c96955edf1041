//! Lock construction options

use std::time::Duration;

use crate::error::LockError;
use crate::{DEFAULT_AUTO_RELEASE_SECS, DEFAULT_BASE_RETRY_DELAY_MS};

/// Largest expiry the store accepts, in milliseconds (a signed 64-bit value)
pub const MAX_AUTO_RELEASE_MS: u64 = i64::MAX as u64;

/// Timing options applied to a lock handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Store-side expiry applied to the lock key on acquisition
    pub auto_release: Duration,
    /// Initial backoff delay between failed acquisition attempts
    pub base_retry_delay: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            auto_release: Duration::from_secs(DEFAULT_AUTO_RELEASE_SECS),
            base_retry_delay: Duration::from_millis(DEFAULT_BASE_RETRY_DELAY_MS),
        }
    }
}

impl LockOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_release(mut self, auto_release: Duration) -> Self {
        self.auto_release = auto_release;
        self
    }

    pub fn with_auto_release_secs(self, secs: u64) -> Self {
        self.with_auto_release(Duration::from_secs(secs))
    }

    pub fn with_base_retry_delay(mut self, delay: Duration) -> Self {
        self.base_retry_delay = delay;
        self
    }

    pub fn with_base_retry_delay_ms(self, millis: u64) -> Self {
        self.with_base_retry_delay(Duration::from_millis(millis))
    }

    /// Both durations must be positive.
    ///
    /// The store expresses expiry in whole milliseconds, so anything shorter
    /// than one millisecond is rejected as well, as is anything past
    /// [`MAX_AUTO_RELEASE_MS`].
    pub fn validate(&self) -> Result<(), LockError> {
        if self.auto_release < Duration::from_millis(1) {
            return Err(LockError::InvalidOptions(format!(
                "auto_release must be at least 1ms, got {:?}",
                self.auto_release
            )));
        }
        if self.auto_release.as_millis() > u128::from(MAX_AUTO_RELEASE_MS) {
            return Err(LockError::InvalidOptions(format!(
                "auto_release must be at most {}ms, got {:?}",
                MAX_AUTO_RELEASE_MS, self.auto_release
            )));
        }
        if self.base_retry_delay.is_zero() {
            return Err(LockError::InvalidOptions(
                "base_retry_delay must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
