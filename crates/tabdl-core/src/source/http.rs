//! libcurl-backed source: one `Easy` handle per worker, reused for every job.

use anyhow::{Context, Result};
use std::str;
use std::time::Duration;

use super::{FetchResponse, ResponseHeaders, Source, SourceFactory};
use crate::config::TabdlConfig;
use crate::retry::FetchError;

/// Transport options shared by every worker's handle.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_redirections: u32,
}

impl CurlOptions {
    pub fn from_config(cfg: &TabdlConfig) -> Self {
        Self {
            user_agent: cfg.user_agent.clone(),
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.request_timeout_secs),
            max_redirections: 10,
        }
    }
}

/// A worker's private HTTP session. The in-memory cookie engine is enabled,
/// so cookies set by the catalog persist across this worker's requests only.
pub struct CurlSource {
    easy: curl::easy::Easy,
}

impl CurlSource {
    pub fn new(opts: &CurlOptions) -> Result<Self> {
        let mut easy = curl::easy::Easy::new();
        easy.useragent(&opts.user_agent).context("set user agent")?;
        easy.follow_location(true)?;
        easy.max_redirections(opts.max_redirections)?;
        easy.connect_timeout(opts.connect_timeout)?;
        easy.timeout(opts.timeout)?;
        // Empty path: enable the cookie engine without reading a file.
        easy.cookie_file("").context("enable cookie engine")?;
        easy.accept_encoding("").context("enable content decoding")?;
        Ok(Self { easy })
    }
}

impl Source for CurlSource {
    fn fetch(&mut self, url: &str) -> Result<FetchResponse, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }
        self.easy.url(url)?;
        self.easy.get(true)?;

        let mut body = Vec::new();
        let mut headers = ResponseHeaders::new();
        {
            let mut transfer = self.easy.transfer();
            transfer.header_function(|data| {
                if let Ok(line) = str::from_utf8(data) {
                    headers.push_line(line);
                }
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = self.easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
        let final_url = self.easy.effective_url()?.map(str::to_string);
        Ok(FetchResponse {
            body,
            headers,
            final_url,
        })
    }
}

/// Opens a fresh [`CurlSource`] for each worker.
#[derive(Debug, Clone)]
pub struct CurlSourceFactory {
    opts: CurlOptions,
}

impl CurlSourceFactory {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }
}

impl SourceFactory for CurlSourceFactory {
    fn open(&self, worker: usize) -> Result<Box<dyn Source>> {
        tracing::debug!(worker, "opening http session");
        Ok(Box::new(CurlSource::new(&self.opts)?))
    }
}
