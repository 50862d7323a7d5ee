//! Retry budget and exponential backoff.

use std::time::Duration;

/// Bounded retry policy for one logical request.
///
/// Attempts are 1-based. The wait before retrying after attempt `n` is
/// `backoff_base * 2^(n-1)`, unless the server supplied a `Retry-After` hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first one included.
    pub max_attempts: u32,
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub const fn is_final(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }

    /// Exponential delay before the retry that follows `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.backoff_base.saturating_mul(1_u32 << exponent)
    }

    /// Delay after a 429: the server's hint when usable, else the exponential default.
    pub fn rate_limit_delay(&self, attempt: u32, retry_after: Option<f64>) -> Duration {
        retry_after
            .and_then(|seconds| Duration::try_from_secs_f64(seconds).ok())
            .unwrap_or_else(|| self.backoff(attempt))
    }
}

/// Parses a `Retry-After` value given in (possibly fractional) seconds.
///
/// HTTP-date forms, negative and non-finite values yield `None`.
pub fn parse_retry_after(value: &str) -> Option<f64> {
    let seconds = value.trim().parse::<f64>().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then_some(seconds)
}
