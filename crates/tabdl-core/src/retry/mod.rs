//! Retry and backoff policy.
//!
//! This module encapsulates error classification (timeouts, throttling,
//! connection failures, empty payloads) and exponential backoff decisions so
//! that the materializer and the transport share one consistent policy. The
//! policy is an explicit, immutable value passed down from the run config.

mod classify;
mod error;
mod policy;
mod run;

pub use classify::{classify, classify_curl_error, classify_http_status, is_retryable};
pub use error::FetchError;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub(crate) use policy::secs;
pub use run::{run_with_retry, run_with_retry_and_sleep};
