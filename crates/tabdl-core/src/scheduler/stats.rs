//! Per-worker counters and their run-wide sum.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::materialize::DownloadOutcome;

/// Counters owned by exactly one worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerStats {
    pub groups_processed: u64,
    pub groups_failed: u64,
    pub jobs_found: u64,
    pub processed: u64,
    pub downloaded: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl WorkerStats {
    pub fn record(&mut self, outcome: &DownloadOutcome) {
        self.processed += 1;
        match outcome {
            DownloadOutcome::Success(..) => self.downloaded += 1,
            DownloadOutcome::Skipped(_) => self.skipped += 1,
            DownloadOutcome::Failed(_) => self.failed += 1,
        }
    }
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, rhs: Self) {
        self.groups_processed += rhs.groups_processed;
        self.groups_failed += rhs.groups_failed;
        self.jobs_found += rhs.jobs_found;
        self.processed += rhs.processed;
        self.downloaded += rhs.downloaded;
        self.skipped += rhs.skipped;
        self.failed += rhs.failed;
    }
}

/// Sum of all workers' counters, built once every worker has joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalStats {
    #[serde(flatten)]
    pub counts: WorkerStats,
    /// Workers that could not start or panicked.
    pub workers_failed: u64,
}

impl TotalStats {
    pub fn absorb(&mut self, stats: WorkerStats) {
        self.counts += stats;
    }
}
