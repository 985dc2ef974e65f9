//! Retry loop: run a closure until success or the policy says stop.

use std::time::Duration;

use super::policy::{RetryDecision, RetryPolicy};

/// Runs `op` until it succeeds, fails with an error `retryable` rejects, or
/// `policy.max_attempts` is exhausted. The last error is returned unchanged.
/// Between attempts the calling thread sleeps for the backoff duration.
pub fn run_with_retry<T, E, R, F>(policy: &RetryPolicy, retryable: R, op: F) -> Result<T, E>
where
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
    F: FnMut() -> Result<T, E>,
{
    run_with_retry_and_sleep(policy, retryable, std::thread::sleep, op)
}

/// Same as [`run_with_retry`] with an injectable sleep function.
pub fn run_with_retry_and_sleep<T, E, R, S, F>(
    policy: &RetryPolicy,
    retryable: R,
    mut sleep: S,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
    S: FnMut(Duration),
    F: FnMut() -> Result<T, E>,
{
    let mut attempt = 0u32;
    loop {
        match op() {
            Ok(v) => {
                if attempt > 0 {
                    tracing::debug!(attempt = attempt + 1, "succeeded after retry");
                }
                return Ok(v);
            }
            Err(e) => {
                let can_retry = retryable(&e);
                match policy.decide(attempt, can_retry) {
                    RetryDecision::NoRetry => {
                        if can_retry {
                            tracing::warn!(
                                attempts = policy.max_attempts,
                                "all attempts failed: {}",
                                e
                            );
                        } else {
                            tracing::debug!("non-retryable error: {}", e);
                        }
                        return Err(e);
                    }
                    RetryDecision::RetryAfter(d) => {
                        tracing::warn!(
                            attempt = attempt + 1,
                            delay_ms = d.as_millis() as u64,
                            "attempt failed ({}), retrying",
                            e
                        );
                        sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}
