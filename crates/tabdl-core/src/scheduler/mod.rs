//! Parallel run over stored group records.
//!
//! The group list is cut into one contiguous chunk per worker; each worker
//! runs on its own blocking thread with its own source and walks its chunk
//! sequentially. Workers share only the pacing controller, the progress
//! reporter and the cancel flag. Counters are summed after all workers join.

mod chunk;
mod parallel;
mod progress;
mod run;
mod stats;
mod worker;

pub use chunk::partition;
pub use parallel::run_chunks;
pub use progress::{ProgressReporter, ProgressSnapshot};
pub use run::{
    read_summary, run_download, summary_path, write_summary, RunFilters, RunOptions, RunSummary,
    SUMMARY_FILE_NAME,
};
pub use stats::{TotalStats, WorkerStats};
pub use worker::{Worker, WorkerShared};
