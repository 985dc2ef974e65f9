use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// High-level classification of an error for retry purposes.
///
/// Callers map HTTP status codes, curl errors, or payload checks into these
/// kinds; the retry predicate decides which of them are worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out (connect/read).
    Timeout,
    /// Server asked us to slow down (e.g. 429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// HTTP status that is retryable but not strictly throttling (5xx).
    Http5xx(u16),
    /// Response arrived but failed a post-fetch sanity check (e.g. empty body).
    Validation,
    /// Any other error (not retried by default).
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with a cap and optional jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay (applied before jitter).
    pub max_delay: Duration,
    /// Growth factor per attempt.
    pub exponential_base: f64,
    /// Scale each delay by a uniform factor in `[0.5, 1.0]`.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from_config(&RetryConfig::default())
    }
}

/// Seconds from config as a duration; unrepresentable values saturate.
pub(crate) fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}

impl RetryPolicy {
    /// Build the policy from the (already validated) config section.
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: secs(cfg.base_delay_secs),
            max_delay: secs(cfg.max_delay_secs),
            exponential_base: cfg.exponential_base,
            jitter: cfg.jitter,
        }
    }

    /// Un-jittered backoff for a 0-based attempt index:
    /// `min(base_delay * exponential_base^attempt_index, max_delay)`.
    pub fn backoff(&self, attempt_index: u32) -> Duration {
        let exp = self
            .exponential_base
            .powi(attempt_index.min(i32::MAX as u32) as i32);
        let raw = self.base_delay.as_secs_f64() * exp;
        let capped = if raw.is_finite() {
            raw.min(self.max_delay.as_secs_f64())
        } else {
            self.max_delay.as_secs_f64()
        };
        Duration::try_from_secs_f64(capped.max(0.0)).unwrap_or(self.max_delay)
    }

    /// Decide what to do after the attempt with 0-based index `attempt_index`
    /// failed. `retryable` is the caller's classification of that failure.
    pub fn decide(&self, attempt_index: u32, retryable: bool) -> RetryDecision {
        if !retryable || attempt_index + 1 >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        let mut delay = self.backoff(attempt_index);
        if self.jitter {
            let factor: f64 = rand::thread_rng().gen_range(0.5..=1.0);
            delay = Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(delay);
        }
        RetryDecision::RetryAfter(delay)
    }
}
