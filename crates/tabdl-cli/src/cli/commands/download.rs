//! `tabdl download` – materialize every selected tab of the stored records.

use anyhow::Result;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tabdl_core::config::TabdlConfig;
use tabdl_core::scheduler::{self, ProgressSnapshot, RunOptions};
use tabdl_core::source::{CurlOptions, CurlSourceFactory};

use crate::cli::DownloadArgs;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

pub async fn run_download(file_cfg: TabdlConfig, args: &DownloadArgs) -> Result<()> {
    let cfg = args.apply_to(file_cfg);
    cfg.validate()?;

    let opts = RunOptions {
        input_dir: args.input_dir(),
        output_dir: args.output_dir.clone(),
        starting_letter: args.starting_letter.clone(),
        end_letter: args.end_letter.clone(),
        config: cfg,
    };
    let factory = Arc::new(CurlSourceFactory::new(CurlOptions::from_config(&opts.config)));

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupted: finishing in-flight tabs, then stopping.");
                tracing::warn!("ctrl-c received, cancelling run");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::unbounded_channel::<ProgressSnapshot>();
    let progress_handle = tokio::spawn(async move {
        let mut last_print: Option<Instant> = None;
        let mut printed = false;
        while let Some(p) = progress_rx.recv().await {
            let due = last_print.map_or(true, |t| t.elapsed() >= PROGRESS_INTERVAL);
            if due || p.done >= p.expected {
                eprint!("\rProgress: {} tabs processed ({:.1}%)  ", p, p.fraction() * 100.0);
                let _ = std::io::stderr().flush();
                last_print = Some(Instant::now());
                printed = true;
            }
        }
        if printed {
            eprintln!();
        }
    });

    println!(
        "Downloading from {} into {} with {} worker(s)",
        opts.input_dir.display(),
        opts.output_dir.display(),
        opts.config.workers
    );
    let result = scheduler::run_download(&opts, factory, Arc::clone(&cancel), Some(progress_tx)).await;
    let _ = progress_handle.await;
    let summary = result?;

    let c = summary.totals.counts;
    println!(
        "Groups: {} processed, {} failed. Tabs: {} processed, {} downloaded, {} skipped, {} failed.",
        c.groups_processed, c.groups_failed, c.processed, c.downloaded, c.skipped, c.failed
    );
    if let Some(p) = summary.pacing {
        println!(
            "Pacing: final delay {:.1}s, failure rate {:.1}% overall, {:.1}% recent",
            p.current_delay_secs,
            p.overall_failure_rate * 100.0,
            p.recent_failure_rate * 100.0
        );
    }
    if summary.totals.workers_failed > 0 {
        println!("{} worker(s) failed to run; see the log.", summary.totals.workers_failed);
    }
    println!(
        "Summary written to {}",
        scheduler::summary_path(&summary.output_dir).display()
    );
    if summary.interrupted {
        anyhow::bail!("run interrupted before all tabs were processed");
    }
    Ok(())
}
