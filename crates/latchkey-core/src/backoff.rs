// Exponential backoff bounded by an acquisition deadline
// Delays double each round and the last one is clamped to the remaining budget

use std::time::Duration;

use tokio::time::Instant;

/// Roughly thirty years; stands in for "wait forever" when the requested
/// budget would overflow `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// Retry schedule for one acquisition call
#[derive(Debug, Clone)]
pub struct Backoff {
    delay: Duration,
    deadline: Instant,
}

impl Backoff {
    pub fn new(base: Duration, started: Instant, max_wait: Duration) -> Self {
        let deadline = started
            .checked_add(max_wait)
            .unwrap_or_else(|| started + FAR_FUTURE);
        Self {
            delay: base,
            deadline,
        }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Delay before the next attempt, or `None` once the deadline is reached.
    pub fn next_sleep(&mut self, now: Instant) -> Option<Duration> {
        if now >= self.deadline {
            return None;
        }
        let sleep = self.delay.min(self.deadline - now);
        self.delay = self.delay.saturating_mul(2);
        Some(sleep)
    }
}
