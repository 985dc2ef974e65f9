//! One worker: a private source plus a sequential walk over its chunk.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::catalog::{load_group, save_group, GroupRef, JobFilter};
use crate::materialize::{MaterializeOptions, Materializer};
use crate::pacing::AdaptiveDelay;
use crate::retry::RetryPolicy;
use crate::source::Source;
use crate::storage::PayloadSink;

use super::progress::ProgressReporter;
use super::stats::WorkerStats;

/// State every worker reads. Only `pacing` and `progress` are mutated (through
/// their own synchronization); `cancel` is set by the caller and never by workers.
pub struct WorkerShared {
    pub output_dir: PathBuf,
    pub filter: JobFilter,
    pub retry: RetryPolicy,
    pub options: MaterializeOptions,
    pub sink: Arc<dyn PayloadSink>,
    pub pacing: Option<AdaptiveDelay>,
    pub progress: ProgressReporter,
    pub cancel: Arc<AtomicBool>,
}

impl WorkerShared {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

pub struct Worker<'a> {
    index: usize,
    source: Box<dyn Source>,
    shared: &'a WorkerShared,
    materializer: Materializer<'a>,
    stats: WorkerStats,
}

impl<'a> Worker<'a> {
    pub fn new(index: usize, source: Box<dyn Source>, shared: &'a WorkerShared) -> Self {
        let mut materializer = Materializer::new(&shared.retry, shared.sink.as_ref(), shared.options);
        if let Some(pacing) = &shared.pacing {
            materializer = materializer.with_pacing(pacing);
        }
        Self {
            index,
            source,
            shared,
            materializer,
            stats: WorkerStats::default(),
        }
    }

    /// Process `chunk` in order, stopping early once cancellation is requested.
    /// A group that fails is counted and skipped.
    pub fn run(&mut self, chunk: &[GroupRef]) {
        for group in chunk {
            if self.shared.is_cancelled() {
                tracing::info!(worker = self.index, "cancelled, not starting further groups");
                break;
            }
            match self.process_group(group) {
                Ok(()) => self.stats.groups_processed += 1,
                Err(e) => {
                    self.stats.groups_failed += 1;
                    tracing::warn!(worker = self.index, group = %group.id, "group failed: {:#}", e);
                }
            }
        }
    }

    /// Materialize the selected jobs of one group and write the record back.
    pub fn process_group(&mut self, group_ref: &GroupRef) -> Result<()> {
        let mut group = load_group(&group_ref.path)?;
        let ids: Vec<String> = self
            .shared
            .filter
            .select(&group)
            .into_iter()
            .map(|j| j.id.clone())
            .collect();
        self.stats.jobs_found += ids.len() as u64;
        if ids.is_empty() {
            tracing::debug!(group = %group.id, "no jobs selected");
            return Ok(());
        }

        let dir = self.shared.output_dir.join(group.folder_name());
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        tracing::info!(group = %group.id, name = %group.name, jobs = ids.len(), "processing group");

        for id in &ids {
            if self.shared.is_cancelled() {
                tracing::info!(group = %group.id, "cancelled mid-group");
                break;
            }
            self.shared.progress.advance(1);
            let Some(job) = group.get_mut(id) else { continue };
            let outcome = self.materializer.materialize(self.source.as_mut(), job, &dir);
            self.stats.record(&outcome);
        }

        save_group(&group_ref.path, &group)
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats
    }
}
