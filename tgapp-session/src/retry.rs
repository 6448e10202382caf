use std::time::Duration;

/// Attempts per resolution pass.
pub const MAX_ATTEMPTS: u32 = 4;
/// Backoff unit; the wait after attempt N is `N * BASE_BACKOFF_MS`.
pub const BASE_BACKOFF_MS: u64 = 500;

/// Fixed linear backoff used by the resolver: 500ms, 1000ms, 1500ms before attempts 2, 3, 4.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_backoff_ms: BASE_BACKOFF_MS,
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt may follow attempt `attempt` (1-based).
    pub fn has_remaining(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to wait after attempt `attempt` (1-based) before the next one.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_backoff_ms.saturating_mul(u64::from(attempt)))
    }

    /// Sum of all delays a pass can incur.
    pub fn total_delay(&self) -> Duration {
        (1..self.max_attempts).map(|a| self.delay_after(a)).sum()
    }
}
