//! Flags of `tabdl download` and how they override the config file.

use clap::Args;
use std::path::PathBuf;
use tabdl_core::catalog::LETTER_CATEGORIES;
use tabdl_core::config::TabdlConfig;

fn parse_letter(s: &str) -> Result<String, String> {
    let letter = s.trim().to_ascii_lowercase();
    if LETTER_CATEGORIES.contains(&letter.as_str()) {
        Ok(letter)
    } else {
        Err(format!("expected one of 0-9, a..z; got {s:?}"))
    }
}

#[derive(Debug, Clone, Args)]
pub struct DownloadArgs {
    /// Directory with the band_<id>.json records (default: the output directory).
    #[arg(long, alias = "input-files-dir", alias = "local-files-dir", value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Where band folders and the run summary are written.
    #[arg(long, alias = "outdir", value_name = "DIR", default_value = "tabs")]
    pub output_dir: PathBuf,

    /// Number of parallel workers.
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Download again even if a file for the tab already exists.
    #[arg(long, alias = "overwrite-existing-tabs")]
    pub overwrite_existing: bool,

    /// Leave several existing files for one tab in place instead of pruning them.
    #[arg(long)]
    pub keep_ambiguous_duplicates: bool,

    #[arg(long, alias = "max-bands", value_name = "N")]
    pub max_groups: Option<usize>,

    #[arg(long, alias = "max-tabs-per-band", value_name = "N")]
    pub max_jobs_per_group: Option<usize>,

    /// Only these tab types (e.g. TAB CRD PRO).
    #[arg(long, alias = "tab-types", num_args = 1.., value_name = "TYPE")]
    pub types: Option<Vec<String>>,

    /// First band letter category to process (0-9, a..z).
    #[arg(long, value_parser = parse_letter)]
    pub starting_letter: Option<String>,

    /// Last band letter category to process (0-9, a..z).
    #[arg(long, value_parser = parse_letter)]
    pub end_letter: Option<String>,

    /// Prepend the metadata header to text tabs.
    #[arg(long)]
    pub include_metadata: bool,

    #[arg(long, value_name = "N")]
    pub max_retry_attempts: Option<u32>,

    #[arg(long, value_name = "SECS")]
    pub retry_base_delay: Option<f64>,

    #[arg(long, value_name = "SECS")]
    pub retry_max_delay: Option<f64>,

    #[arg(long)]
    pub disable_retry_jitter: bool,

    #[arg(long, value_name = "SECS")]
    pub adaptive_delay_initial: Option<f64>,

    #[arg(long, value_name = "SECS")]
    pub adaptive_delay_max: Option<f64>,

    /// Failure rate (0..1] above which the delay grows.
    #[arg(long, value_name = "RATE")]
    pub adaptive_delay_threshold: Option<f64>,

    #[arg(long, value_name = "N")]
    pub adaptive_delay_window: Option<usize>,

    #[arg(long, value_name = "SECS")]
    pub adaptive_delay_increment: Option<f64>,

    #[arg(long, value_name = "SECS")]
    pub adaptive_delay_decrement: Option<f64>,

    #[arg(long, value_name = "N")]
    pub adaptive_delay_check_interval: Option<u64>,

    #[arg(long)]
    pub disable_adaptive_delay: bool,

    #[arg(long)]
    pub user_agent: Option<String>,
}

impl DownloadArgs {
    pub fn input_dir(&self) -> PathBuf {
        self.input_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.clone())
    }

    /// Config file values with every given flag applied on top.
    pub fn apply_to(&self, mut cfg: TabdlConfig) -> TabdlConfig {
        fn set<T: Clone>(slot: &mut T, flag: &Option<T>) {
            if let Some(v) = flag {
                *slot = v.clone();
            }
        }

        set(&mut cfg.workers, &self.threads);
        if self.overwrite_existing {
            cfg.skip_existing = false;
        }
        if self.keep_ambiguous_duplicates {
            cfg.prune_ambiguous_duplicates = false;
        }
        if self.include_metadata {
            cfg.include_metadata = true;
        }
        if self.max_groups.is_some() {
            cfg.max_groups = self.max_groups;
        }
        if self.max_jobs_per_group.is_some() {
            cfg.max_jobs_per_group = self.max_jobs_per_group;
        }
        if self.types.is_some() {
            cfg.allowed_types = self.types.clone();
        }
        set(&mut cfg.user_agent, &self.user_agent);

        set(&mut cfg.retry.max_attempts, &self.max_retry_attempts);
        set(&mut cfg.retry.base_delay_secs, &self.retry_base_delay);
        set(&mut cfg.retry.max_delay_secs, &self.retry_max_delay);
        if self.disable_retry_jitter {
            cfg.retry.jitter = false;
        }

        let p = &mut cfg.pacing;
        set(&mut p.initial_delay_secs, &self.adaptive_delay_initial);
        set(&mut p.max_delay_secs, &self.adaptive_delay_max);
        set(&mut p.failure_threshold, &self.adaptive_delay_threshold);
        set(&mut p.window_size, &self.adaptive_delay_window);
        set(&mut p.increment_secs, &self.adaptive_delay_increment);
        set(&mut p.decrement_secs, &self.adaptive_delay_decrement);
        set(&mut p.check_interval, &self.adaptive_delay_check_interval);
        if self.disable_adaptive_delay {
            p.enabled = false;
        }
        cfg
    }
}
