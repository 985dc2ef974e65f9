//! Turning one job into one file on disk.
//!
//! A job is materialized at most once per run: existing output is detected
//! (and ambiguous duplicates pruned), the payload is fetched under the retry
//! policy and pacing delay, its extension resolved, and the file written
//! atomically and verified before `output_path` is set.

mod existing;

pub use existing::{find_existing, prune_duplicates};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::Job;
use crate::config::TabdlConfig;
use crate::naming::job_base_name;
use crate::pacing::AdaptiveDelay;
use crate::resolve::{resolve_with_basis, Payload};
use crate::retry::{is_retryable, run_with_retry_and_sleep, FetchError, RetryPolicy};
use crate::source::{FetchResponse, Source};
use crate::storage::PayloadSink;

/// Reason reported when the write step produced nothing usable.
pub const INTEGRITY_FAILURE: &str = "written file missing or empty";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Written to this path with this many bytes.
    Success(PathBuf, u64),
    /// Left alone because a file for the job already exists.
    Skipped(PathBuf),
    Failed(String),
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success(..))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeOptions {
    pub skip_existing: bool,
    pub prune_ambiguous_duplicates: bool,
    pub include_metadata: bool,
}

impl MaterializeOptions {
    pub fn from_config(cfg: &TabdlConfig) -> Self {
        Self {
            skip_existing: cfg.skip_existing,
            prune_ambiguous_duplicates: cfg.prune_ambiguous_duplicates,
            include_metadata: cfg.include_metadata,
        }
    }
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self::from_config(&TabdlConfig::default())
    }
}

/// Header block prepended to text tabs when metadata output is on.
pub fn metadata_header(metadata: &BTreeMap<String, String>) -> String {
    let mut out = String::from("=== Tab Metadata ===\n");
    for (key, value) in metadata {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out.push_str(&"=".repeat(20));
    out.push_str("\n\n");
    out
}

/// Per-run materialization settings plus the shared pieces a job touches.
/// Cheap to build; one per worker.
pub struct Materializer<'a> {
    retry: &'a RetryPolicy,
    sink: &'a dyn PayloadSink,
    pacing: Option<&'a AdaptiveDelay>,
    options: MaterializeOptions,
    sleep: &'a (dyn Fn(Duration) + Sync),
}

impl<'a> Materializer<'a> {
    pub fn new(retry: &'a RetryPolicy, sink: &'a dyn PayloadSink, options: MaterializeOptions) -> Self {
        Self {
            retry,
            sink,
            pacing: None,
            options,
            sleep: &std::thread::sleep,
        }
    }

    /// Replace the blocking sleep used for pacing and retry backoff.
    pub fn with_sleep(mut self, sleep: &'a (dyn Fn(Duration) + Sync)) -> Self {
        self.sleep = sleep;
        self
    }

    /// Sleep the controller's delay before each fetch and report every outcome to it.
    pub fn with_pacing(mut self, pacing: &'a AdaptiveDelay) -> Self {
        self.pacing = Some(pacing);
        self
    }

    fn record(&self, success: bool) {
        if let Some(p) = self.pacing {
            p.record(success);
        }
    }

    fn fail(&self, job: &mut Job, reason: String) -> DownloadOutcome {
        self.record(false);
        clear_stale_output(job);
        tracing::warn!(job = %job.id, "{}", reason);
        DownloadOutcome::Failed(reason)
    }

    fn fetch(&self, source: &mut dyn Source, url: &str) -> Result<FetchResponse, FetchError> {
        if let Some(p) = self.pacing {
            let delay = p.current();
            if !delay.is_zero() {
                tracing::debug!(delay_ms = delay.as_millis() as u64, "pacing");
                (self.sleep)(delay);
            }
        }
        run_with_retry_and_sleep(self.retry, is_retryable, |d| (self.sleep)(d), || {
            let resp = source.fetch(url)?;
            if resp.body.is_empty() {
                return Err(FetchError::EmptyBody);
            }
            Ok(resp)
        })
    }

    /// Materialize `job` into `dir`. On success (or a skip of a non-empty
    /// file) `job.output_path` is set to the file.
    pub fn materialize(&self, source: &mut dyn Source, job: &mut Job, dir: &Path) -> DownloadOutcome {
        let base = job_base_name(job);

        let candidates = match find_existing(dir, &base) {
            Ok(c) => c,
            Err(e) => {
                // No fetch ran, so this is not a pacing outcome.
                let reason = format!("cannot list {}: {}", dir.display(), e);
                tracing::warn!(job = %job.id, "{}", reason);
                clear_stale_output(job);
                return DownloadOutcome::Failed(reason);
            }
        };
        let existing = if candidates.len() > 1 {
            if self.options.prune_ambiguous_duplicates {
                tracing::warn!(job = %job.id, count = candidates.len(), "multiple existing files, pruning");
                prune_duplicates(candidates, &job.kind)
            } else {
                tracing::warn!(job = %job.id, count = candidates.len(), "multiple existing files, using first");
                candidates.into_iter().next()
            }
        } else {
            candidates.into_iter().next()
        };

        if let Some(path) = &existing {
            if self.options.skip_existing {
                tracing::debug!(path = %path.display(), "already exists, skipping");
                if file_len(path) > 0 {
                    job.output_path = Some(path.clone());
                }
                return DownloadOutcome::Skipped(path.clone());
            }
            tracing::debug!(path = %path.display(), "already exists, will overwrite");
        }

        let resp = match self.fetch(source, &job.source_url) {
            Ok(r) => r,
            Err(e) => return self.fail(job, format!("fetch failed: {}", e)),
        };

        let (ext, basis) = resolve_with_basis(&Payload {
            kind: &job.kind,
            body: &resp.body,
            headers: Some(&resp.headers),
            final_url: resp.final_url.as_deref(),
        });
        tracing::debug!(job = %job.id, ext = %ext, ?basis, "resolved extension");

        let header = match &job.metadata {
            Some(m) if self.options.include_metadata && !job.kind.is_binary() && !m.is_empty() => {
                metadata_header(m)
            }
            _ => String::new(),
        };

        let dest = dir.join(format!("{}{}", base, ext));
        if let Err(e) = self.sink.write(&dest, &[header.as_bytes(), resp.body.as_slice()]) {
            return self.fail(job, format!("write failed: {:#}", e));
        }

        let len = file_len(&dest);
        if len == 0 {
            if dest.exists() {
                if let Err(e) = std::fs::remove_file(&dest) {
                    tracing::warn!(path = %dest.display(), "could not remove empty file: {}", e);
                }
            }
            return self.fail(job, INTEGRITY_FAILURE.to_string());
        }

        // The old file goes only once the new one is verified.
        if let Some(old) = existing.filter(|old| *old != dest) {
            match std::fs::remove_file(&old) {
                Ok(()) => tracing::debug!(path = %old.display(), "removed old file"),
                Err(e) => tracing::warn!(path = %old.display(), "could not remove old file: {}", e),
            }
        }

        self.record(true);
        tracing::info!(job = %job.id, path = %dest.display(), bytes = len, "saved");
        job.output_path = Some(dest.clone());
        DownloadOutcome::Success(dest, len)
    }
}

fn file_len(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Drop an `output_path` that no longer names a non-empty file.
fn clear_stale_output(job: &mut Job) {
    if job.output_path.as_deref().is_some_and(|p| file_len(p) == 0) {
        job.output_path = None;
    }
}
