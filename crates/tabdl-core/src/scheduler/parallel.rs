//! Run one worker per chunk on blocking threads and sum their counters.
//!
//! Each worker opens its own source through the factory, so sessions are
//! never shared. A worker that cannot start or panics is logged and counted;
//! the other workers keep going.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::catalog::GroupRef;
use crate::source::SourceFactory;

use super::stats::{TotalStats, WorkerStats};
use super::worker::{Worker, WorkerShared};

fn run_worker(
    index: usize,
    chunk: &[GroupRef],
    shared: &WorkerShared,
    factory: &dyn SourceFactory,
) -> Result<WorkerStats> {
    let _span = tracing::info_span!("worker", index).entered();
    let source = factory
        .open(index)
        .with_context(|| format!("worker {} could not open its source", index))?;
    tracing::debug!(groups = chunk.len(), "worker started");
    let mut worker = Worker::new(index, source, shared);
    worker.run(chunk);
    let stats = worker.stats();
    tracing::info!(
        groups = stats.groups_processed,
        downloaded = stats.downloaded,
        skipped = stats.skipped,
        failed = stats.failed,
        "worker finished"
    );
    Ok(stats)
}

/// Runs every chunk concurrently and returns the summed stats once all workers joined.
pub async fn run_chunks(
    chunks: Vec<Vec<GroupRef>>,
    shared: Arc<WorkerShared>,
    factory: Arc<dyn SourceFactory>,
) -> TotalStats {
    let mut join_set = tokio::task::JoinSet::new();
    for (index, chunk) in chunks.into_iter().enumerate() {
        let shared = Arc::clone(&shared);
        let factory = Arc::clone(&factory);
        join_set.spawn_blocking(move || run_worker(index, &chunk, &shared, factory.as_ref()));
    }

    let mut totals = TotalStats::default();
    while let Some(res) = join_set.join_next().await {
        match res {
            Ok(Ok(stats)) => totals.absorb(stats),
            Ok(Err(e)) => {
                totals.workers_failed += 1;
                tracing::error!("{:#}", e);
            }
            Err(e) => {
                totals.workers_failed += 1;
                tracing::error!("worker task join: {}", e);
            }
        }
    }
    totals
}
