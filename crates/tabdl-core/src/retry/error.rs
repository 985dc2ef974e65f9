//! Fetch error type for retry classification.

use thiserror::Error;

/// Error returned by a single fetch through a [`crate::source::Source`].
/// Kept typed so the retry layer can classify it before it is logged or
/// converted into a job-level failure reason.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Transfer succeeded but the body was empty.
    #[error("empty response body")]
    EmptyBody,
    /// The URL could not be used at all (not retried).
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}
