//! Source service: the narrow interface through which jobs are fetched.
//!
//! Each worker opens its own [`Source`] through a [`SourceFactory`] and keeps
//! it for its whole chunk; sources are never shared between workers, so
//! session state (cookies, connections) stays isolated.

mod headers;
mod http;
#[cfg(test)]
pub(crate) mod scripted;

pub use http::{CurlOptions, CurlSource, CurlSourceFactory};
pub use headers::ResponseHeaders;

use anyhow::Result;

use crate::retry::FetchError;

/// Raw result of one successful fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    pub body: Vec<u8>,
    pub headers: ResponseHeaders,
    /// URL after redirects, if the transport knows it.
    pub final_url: Option<String>,
}

/// Fetches remote content. Implementations surface transient failures as
/// retryable [`FetchError`] kinds (see [`crate::retry::is_retryable`]).
pub trait Source {
    fn fetch(&mut self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// Opens one isolated [`Source`] per worker.
pub trait SourceFactory: Send + Sync {
    fn open(&self, worker: usize) -> Result<Box<dyn Source>>;
}
