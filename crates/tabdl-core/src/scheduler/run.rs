//! A whole download run: plan, fan out, summarize.
//!
//! Planning reads every candidate record once (letter range, group cap and
//! the expected job count for progress). The run summary is written even when
//! the run was cancelled, flagged as interrupted.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::catalog::{list_group_records, load_group, GroupRef, JobFilter};
use crate::config::TabdlConfig;
use crate::materialize::MaterializeOptions;
use crate::pacing::{AdaptiveDelay, PacingPolicy, PacingStats};
use crate::retry::RetryPolicy;
use crate::source::SourceFactory;
use crate::storage::{AtomicFileSink, PayloadSink};

use super::chunk::partition;
use super::parallel::run_chunks;
use super::progress::{ProgressReporter, ProgressSnapshot};
use super::stats::TotalStats;
use super::worker::WorkerShared;

/// Written to the output directory after every run.
pub const SUMMARY_FILE_NAME: &str = "download_summary.json";

/// Inputs of one run. `config` is the fully merged (file + flags) configuration.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config: TabdlConfig,
    pub starting_letter: Option<String>,
    pub end_letter: Option<String>,
}

impl RunOptions {
    pub fn filter(&self) -> JobFilter {
        JobFilter {
            allowed_types: self
                .config
                .allowed_types
                .as_ref()
                .map(|types| types.iter().map(|t| t.trim().to_ascii_uppercase()).collect()),
            max_jobs_per_group: self.config.max_jobs_per_group,
            starting_letter: self.starting_letter.clone(),
            end_letter: self.end_letter.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFilters {
    pub starting_letter: Option<String>,
    pub end_letter: Option<String>,
    pub max_groups: Option<usize>,
    pub max_jobs_per_group: Option<usize>,
    pub allowed_types: Option<Vec<String>>,
}

/// Contents of `download_summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(flatten)]
    pub totals: TotalStats,
    pub groups_planned: u64,
    pub jobs_expected: u64,
    pub interrupted: bool,
    pub pacing: Option<PacingStats>,
    /// Unix seconds at the end of the run.
    pub finished_at: u64,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub workers: usize,
    pub filters: RunFilters,
}

/// Groups to process and the number of jobs they will yield.
#[derive(Debug, Default)]
struct Plan {
    groups: Vec<GroupRef>,
    expected_jobs: u64,
}

fn has_letter_range(filter: &JobFilter) -> bool {
    filter.starting_letter.is_some() || filter.end_letter.is_some()
}

/// Records that cannot be read are dropped when a letter range needs their
/// name; otherwise they are kept so the run reports them as failed groups.
fn plan_run(records: Vec<GroupRef>, filter: &JobFilter, max_groups: Option<usize>) -> Plan {
    let by_letter = has_letter_range(filter);
    let mut selected = Vec::new();
    for gref in records {
        match load_group(&gref.path) {
            Ok(group) => {
                if by_letter && !filter.accepts_group(&group) {
                    tracing::debug!(group = %gref.id, name = %group.name, "outside letter range");
                    continue;
                }
                let jobs = filter.select(&group).len() as u64;
                selected.push((gref, jobs));
            }
            Err(e) => {
                tracing::warn!("could not read {}: {:#}", gref.path.display(), e);
                if !by_letter {
                    selected.push((gref, 0));
                }
            }
        }
    }
    if let Some(max) = max_groups {
        if selected.len() > max {
            tracing::info!(found = selected.len(), max, "limiting groups");
            selected.truncate(max);
        }
    }
    let expected_jobs = selected.iter().map(|(_, n)| n).sum();
    Plan {
        groups: selected.into_iter().map(|(g, _)| g).collect(),
        expected_jobs,
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

pub fn summary_path(output_dir: &Path) -> PathBuf {
    output_dir.join(SUMMARY_FILE_NAME)
}

pub fn write_summary(output_dir: &Path, summary: &RunSummary) -> Result<PathBuf> {
    let path = summary_path(output_dir);
    let json = serde_json::to_vec_pretty(summary).context("serialize run summary")?;
    AtomicFileSink.write(&path, &[json.as_slice(), &b"\n"[..]])?;
    Ok(path)
}

pub fn read_summary(output_dir: &Path) -> Result<RunSummary> {
    let path = summary_path(output_dir);
    let data = std::fs::read(&path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parse {}", path.display()))
}

/// Run the whole pipeline over the records in `opts.input_dir`.
///
/// Configuration errors abort before any work is scheduled. Cancellation
/// (setting `cancel`) stops workers between jobs; the summary is still written.
pub async fn run_download(
    opts: &RunOptions,
    factory: Arc<dyn SourceFactory>,
    cancel: Arc<AtomicBool>,
    progress_tx: Option<UnboundedSender<ProgressSnapshot>>,
) -> Result<RunSummary> {
    let cfg = &opts.config;
    cfg.validate()?;

    let filter = opts.filter();
    let records = list_group_records(&opts.input_dir)?;
    tracing::info!(records = records.len(), dir = %opts.input_dir.display(), "found group records");

    let plan = {
        let filter = filter.clone();
        let max_groups = cfg.max_groups;
        tokio::task::spawn_blocking(move || plan_run(records, &filter, max_groups))
            .await
            .context("planning task join")?
    };
    tracing::info!(groups = plan.groups.len(), jobs = plan.expected_jobs, "run planned");

    std::fs::create_dir_all(&opts.output_dir)
        .with_context(|| format!("failed to create {}", opts.output_dir.display()))?;

    let mut progress = ProgressReporter::new(plan.expected_jobs);
    if let Some(tx) = progress_tx {
        progress = progress.with_listener(tx);
    }
    let pacing = cfg
        .pacing
        .enabled
        .then(|| AdaptiveDelay::new(PacingPolicy::from_config(&cfg.pacing)));
    let sink: Arc<dyn PayloadSink> = Arc::new(AtomicFileSink);
    let shared = Arc::new(WorkerShared {
        output_dir: opts.output_dir.clone(),
        filter,
        retry: RetryPolicy::from_config(&cfg.retry),
        options: MaterializeOptions::from_config(cfg),
        sink,
        pacing,
        progress,
        cancel: Arc::clone(&cancel),
    });

    let groups_planned = plan.groups.len() as u64;
    let chunks = partition(plan.groups, cfg.workers);
    tracing::info!(
        workers = chunks.len(),
        sizes = ?chunks.iter().map(Vec::len).collect::<Vec<_>>(),
        "split into chunks"
    );
    let totals = run_chunks(chunks, Arc::clone(&shared), factory).await;

    let interrupted = cancel.load(Ordering::Relaxed);
    if interrupted {
        tracing::warn!("run interrupted");
    }
    let summary = RunSummary {
        totals,
        groups_planned,
        jobs_expected: plan.expected_jobs,
        interrupted,
        pacing: shared.pacing.as_ref().map(AdaptiveDelay::statistics),
        finished_at: unix_now(),
        input_dir: opts.input_dir.clone(),
        output_dir: opts.output_dir.clone(),
        workers: cfg.workers,
        filters: RunFilters {
            starting_letter: opts.starting_letter.clone(),
            end_letter: opts.end_letter.clone(),
            max_groups: cfg.max_groups,
            max_jobs_per_group: cfg.max_jobs_per_group,
            allowed_types: cfg.allowed_types.clone(),
        },
    };
    let path = write_summary(&opts.output_dir, &summary)?;
    tracing::info!(
        path = %path.display(),
        processed = summary.totals.counts.processed,
        downloaded = summary.totals.counts.downloaded,
        skipped = summary.totals.counts.skipped,
        failed = summary.totals.counts.failed,
        "run finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{group_record_path, save_group, Job, JobGroup};
    use crate::source::scripted::{Reply, ScriptedSource};

    fn store(dir: &Path, id: &str, name: &str, kinds: &[&str]) {
        let mut g = JobGroup::new(id, name, "u");
        for (i, kind) in kinds.iter().enumerate() {
            let job_id = format!("{id}{i}");
            g.add_job(Job::new(job_id.clone(), "Song", *kind, format!("https://t/{job_id}")));
        }
        save_group(&group_record_path(dir, id), &g).unwrap();
    }

    fn options(input: &Path, output: &Path) -> RunOptions {
        let mut config = TabdlConfig::default();
        config.retry.max_attempts = 1;
        config.pacing.enabled = false;
        RunOptions {
            input_dir: input.to_path_buf(),
            output_dir: output.to_path_buf(),
            config,
            starting_letter: None,
            end_letter: None,
        }
    }

    #[test]
    fn plan_counts_selected_jobs_and_caps_groups() {
        let dir = tempfile::tempdir().unwrap();
        store(dir.path(), "1", "Abba", &["TAB", "OFFICIAL", "PRO"]);
        store(dir.path(), "2", "Beatles", &["VID", "CRD"]);
        store(dir.path(), "3", "Cream", &["TAB"]);
        let records = list_group_records(dir.path()).unwrap();

        let p = plan_run(records.clone(), &JobFilter::default(), None);
        assert_eq!((p.groups.len(), p.expected_jobs), (3, 4));

        let p = plan_run(records, &JobFilter::default(), Some(2));
        assert_eq!((p.groups.len(), p.expected_jobs), (2, 3));
    }

    #[test]
    fn plan_applies_letter_range_and_drops_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        store(dir.path(), "1", "Abba", &["TAB"]);
        store(dir.path(), "2", "311", &["TAB"]);
        store(dir.path(), "3", "Metallica", &["TAB"]);
        std::fs::write(group_record_path(dir.path(), "4"), b"garbage").unwrap();
        let records = list_group_records(dir.path()).unwrap();

        let unfiltered = plan_run(records.clone(), &JobFilter::default(), None);
        assert_eq!(unfiltered.groups.len(), 4);

        let filter = JobFilter {
            starting_letter: Some("0-9".into()),
            end_letter: Some("b".into()),
            ..JobFilter::default()
        };
        let ids: Vec<_> = plan_run(records, &filter, None).groups.into_iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn run_writes_summary() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        store(input.path(), "1", "Abba", &["TAB", "TAB"]);
        store(input.path(), "2", "Blur", &["CRD"]);
        let source = ScriptedSource::new();
        source.on("https://t/10", [Reply::body("a")]);
        source.on("https://t/11", [Reply::Status(404)]);
        source.on("https://t/20", [Reply::body("c")]);
        let mut opts = options(input.path(), output.path());
        opts.config.workers = 2;

        let summary = run_download(&opts, Arc::new(source), Arc::new(AtomicBool::new(false)), None)
            .await
            .unwrap();

        assert_eq!(summary.jobs_expected, 3);
        assert_eq!(summary.totals.counts.downloaded, 2);
        assert_eq!(summary.totals.counts.failed, 1);
        assert!(!summary.interrupted);
        assert_eq!(read_summary(output.path()).unwrap(), summary);
    }

    #[tokio::test]
    async fn cancelled_run_is_marked_interrupted() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        store(input.path(), "1", "Abba", &["TAB"]);
        let source = ScriptedSource::new();

        let summary = run_download(
            &options(input.path(), output.path()),
            Arc::new(source.clone()),
            Arc::new(AtomicBool::new(true)),
            None,
        )
        .await
        .unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.totals.counts.processed, 0);
        assert!(source.calls().is_empty());
        assert!(read_summary(output.path()).unwrap().interrupted);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_work() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let mut opts = options(input.path(), output.path());
        opts.config.workers = 0;

        let err = run_download(&opts, Arc::new(ScriptedSource::new()), Arc::new(AtomicBool::new(false)), None)
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<crate::config::ConfigError>().is_some());
        assert!(!summary_path(output.path()).exists());
    }
}
