use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default user agent: a mobile browser, which the catalog serves download links to.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/138.0.0.0 Mobile Safari/537.36";

/// Retry policy parameters (`[retry]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per fetch (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff.
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: f64,
    /// Growth factor per attempt.
    pub exponential_base: f64,
    /// Randomize each backoff into `[0.5, 1.0]` of its value.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_secs: 2.0,
            max_delay_secs: 30.0,
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

/// Adaptive pacing parameters (`[pacing]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// When false, no pacing delay is applied and outcomes are not tracked.
    pub enabled: bool,
    /// Starting delay, also the floor.
    pub initial_delay_secs: f64,
    /// Ceiling for the delay.
    pub max_delay_secs: f64,
    /// Failure rate above which the delay grows.
    pub failure_threshold: f64,
    /// Number of recent outcomes considered.
    pub window_size: usize,
    pub increment_secs: f64,
    pub decrement_secs: f64,
    /// Re-evaluate every N recorded outcomes.
    pub check_interval: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay_secs: 0.0,
            max_delay_secs: 10.0,
            failure_threshold: 0.2,
            window_size: 50,
            increment_secs: 1.0,
            decrement_secs: 0.5,
            check_interval: 10,
        }
    }
}

/// Global configuration loaded from `~/.config/tabdl/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabdlConfig {
    /// Number of parallel workers (each with its own HTTP session).
    pub workers: usize,
    /// Skip jobs whose output file already exists.
    pub skip_existing: bool,
    /// When several files share a job's base name, delete the ones with an
    /// extension that is not legal for the job type (destructive).
    pub prune_ambiguous_duplicates: bool,
    /// Prepend a metadata header to text tabs.
    pub include_metadata: bool,
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Only process the first N group records.
    pub max_groups: Option<usize>,
    /// Only process the first N jobs of each group.
    pub max_jobs_per_group: Option<usize>,
    /// Only process jobs of these types (case-insensitive). None = all.
    pub allowed_types: Option<Vec<String>>,
    pub retry: RetryConfig,
    pub pacing: PacingConfig,
}

impl Default for TabdlConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            skip_existing: true,
            prune_ambiguous_duplicates: true,
            include_metadata: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout_secs: 15,
            request_timeout_secs: 30,
            max_groups: None,
            max_jobs_per_group: None,
            allowed_types: None,
            retry: RetryConfig::default(),
            pacing: PacingConfig::default(),
        }
    }
}

/// Invalid configuration. Detected before any scheduling happens.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("retry.max_attempts must be at least 1")]
    NoAttempts,
    #[error("{field} must be a non-negative number of seconds that fits a duration (got {value})")]
    BadDelay { field: &'static str, value: f64 },
    #[error("{max_field} ({max}) must not be smaller than {min_field} ({min})")]
    DelayOrder {
        min_field: &'static str,
        min: f64,
        max_field: &'static str,
        max: f64,
    },
    #[error("retry.exponential_base must be >= 1 (got {0})")]
    BadExponentialBase(f64),
    #[error("pacing.failure_threshold must be in (0, 1] (got {0})")]
    BadThreshold(f64),
    #[error("pacing.window_size must be at least 1")]
    EmptyWindow,
    #[error("pacing.check_interval must be at least 1")]
    NoCheckInterval,
}

fn check_secs(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && Duration::try_from_secs_f64(value).is_ok() {
        Ok(())
    } else {
        Err(ConfigError::BadDelay { field, value })
    }
}

impl TabdlConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers < 1 {
            return Err(ConfigError::NoWorkers);
        }
        let r = &self.retry;
        if r.max_attempts < 1 {
            return Err(ConfigError::NoAttempts);
        }
        check_secs("retry.base_delay_secs", r.base_delay_secs)?;
        check_secs("retry.max_delay_secs", r.max_delay_secs)?;
        if r.max_delay_secs < r.base_delay_secs {
            return Err(ConfigError::DelayOrder {
                min_field: "retry.base_delay_secs",
                min: r.base_delay_secs,
                max_field: "retry.max_delay_secs",
                max: r.max_delay_secs,
            });
        }
        if !(r.exponential_base.is_finite() && r.exponential_base >= 1.0) {
            return Err(ConfigError::BadExponentialBase(r.exponential_base));
        }

        let p = &self.pacing;
        check_secs("pacing.initial_delay_secs", p.initial_delay_secs)?;
        check_secs("pacing.max_delay_secs", p.max_delay_secs)?;
        check_secs("pacing.increment_secs", p.increment_secs)?;
        check_secs("pacing.decrement_secs", p.decrement_secs)?;
        if p.max_delay_secs < p.initial_delay_secs {
            return Err(ConfigError::DelayOrder {
                min_field: "pacing.initial_delay_secs",
                min: p.initial_delay_secs,
                max_field: "pacing.max_delay_secs",
                max: p.max_delay_secs,
            });
        }
        if !(p.failure_threshold > 0.0 && p.failure_threshold <= 1.0) {
            return Err(ConfigError::BadThreshold(p.failure_threshold));
        }
        if p.window_size < 1 {
            return Err(ConfigError::EmptyWindow);
        }
        if p.check_interval < 1 {
            return Err(ConfigError::NoCheckInterval);
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("tabdl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<TabdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = TabdlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let cfg: TabdlConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
