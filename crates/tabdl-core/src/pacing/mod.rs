//! Adaptive pacing shared by all workers.
//!
//! Workers record the outcome of every materialization here; the controller
//! turns the recent failure rate into a pacing delay that each worker sleeps
//! *before* its next fetch. The controller itself never sleeps.
//!
//! Thresholds are asymmetric: the delay grows when the failure rate is above
//! `failure_threshold` and shrinks only once it falls below half of it.

mod state;

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::PacingConfig;
use crate::retry::secs;

use state::DelayState;

/// Minimum window length before the failure rate is trusted.
const MIN_SAMPLES: usize = 5;

/// Immutable parameters of the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingPolicy {
    /// Starting delay and lower bound.
    pub floor: Duration,
    /// Upper bound.
    pub ceiling: Duration,
    pub failure_threshold: f64,
    pub window_size: usize,
    pub increment: Duration,
    pub decrement: Duration,
    pub check_interval: u64,
}

impl PacingPolicy {
    pub fn from_config(cfg: &PacingConfig) -> Self {
        let floor = secs(cfg.initial_delay_secs);
        Self {
            floor,
            ceiling: secs(cfg.max_delay_secs).max(floor),
            failure_threshold: cfg.failure_threshold,
            window_size: cfg.window_size.max(1),
            increment: secs(cfg.increment_secs),
            decrement: secs(cfg.decrement_secs),
            check_interval: cfg.check_interval.max(1),
        }
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        PacingPolicy::from_config(&PacingConfig::default())
    }
}

/// Snapshot of the controller's counters, for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PacingStats {
    pub current_delay_secs: f64,
    pub total_recorded: u64,
    pub total_failures: u64,
    pub overall_failure_rate: f64,
    pub recent_failure_rate: f64,
    pub window_len: usize,
}

/// Thread-safe failure-rate observer producing the current pacing delay.
#[derive(Debug)]
pub struct AdaptiveDelay {
    policy: PacingPolicy,
    state: Mutex<DelayState>,
}

impl AdaptiveDelay {
    pub fn new(policy: PacingPolicy) -> Self {
        Self {
            state: Mutex::new(DelayState::new(&policy)),
            policy,
        }
    }

    pub fn policy(&self) -> &PacingPolicy {
        &self.policy
    }

    fn lock(&self) -> MutexGuard<'_, DelayState> {
        // A panicking worker must not disable pacing for everyone else.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the outcome of one protected operation.
    pub fn record(&self, success: bool) {
        let mut state = self.lock();
        state.push(success, &self.policy);
        if state.recorded - state.last_adjustment >= self.policy.check_interval {
            state.last_adjustment = state.recorded;
            if let Some((old, new, rate)) = state.adjust(&self.policy, MIN_SAMPLES) {
                if new > old {
                    tracing::warn!(
                        failure_rate = rate,
                        delay_ms = new.as_millis() as u64,
                        "high failure rate, increasing pacing delay"
                    );
                } else {
                    tracing::info!(
                        failure_rate = rate,
                        delay_ms = new.as_millis() as u64,
                        "low failure rate, decreasing pacing delay"
                    );
                }
            }
        }
    }

    /// Current pacing delay.
    pub fn current(&self) -> Duration {
        self.lock().current
    }

    pub fn statistics(&self) -> PacingStats {
        let state = self.lock();
        let overall = if state.recorded == 0 {
            0.0
        } else {
            state.total_failures as f64 / state.recorded as f64
        };
        PacingStats {
            current_delay_secs: state.current.as_secs_f64(),
            total_recorded: state.recorded,
            total_failures: state.total_failures,
            overall_failure_rate: overall,
            recent_failure_rate: state.window_failure_rate().unwrap_or(0.0),
            window_len: state.window.len(),
        }
    }
}

#[cfg(test)]
mod tests;
