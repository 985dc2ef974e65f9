//! Mutable controller state; only touched under the controller's mutex.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::PacingPolicy;

#[derive(Debug)]
pub(super) struct DelayState {
    pub(super) current: Duration,
    /// Most recent outcomes, oldest first.
    pub(super) window: VecDeque<(bool, Instant)>,
    pub(super) recorded: u64,
    pub(super) last_adjustment: u64,
    pub(super) total_failures: u64,
}

impl DelayState {
    pub(super) fn new(policy: &PacingPolicy) -> Self {
        Self {
            current: policy.floor,
            window: VecDeque::with_capacity(policy.window_size),
            recorded: 0,
            last_adjustment: 0,
            total_failures: 0,
        }
    }

    pub(super) fn push(&mut self, success: bool, policy: &PacingPolicy) {
        self.window.push_back((success, Instant::now()));
        while self.window.len() > policy.window_size {
            self.window.pop_front();
        }
        self.recorded = self.recorded.saturating_add(1);
        if !success {
            self.total_failures = self.total_failures.saturating_add(1);
        }
    }

    pub(super) fn window_failure_rate(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        let failures = self.window.iter().filter(|(ok, _)| !ok).count();
        Some(failures as f64 / self.window.len() as f64)
    }

    /// Re-evaluate the delay. Returns `(old, new, rate)` when it changed.
    pub(super) fn adjust(
        &mut self,
        policy: &PacingPolicy,
        min_samples: usize,
    ) -> Option<(Duration, Duration, f64)> {
        if self.window.len() < min_samples {
            return None;
        }
        let rate = self.window_failure_rate()?;
        let old = self.current;
        if rate > policy.failure_threshold {
            self.current = old.saturating_add(policy.increment).min(policy.ceiling);
        } else if rate < policy.failure_threshold / 2.0 {
            self.current = old.saturating_sub(policy.decrement).max(policy.floor);
        }
        (self.current != old).then_some((old, self.current, rate))
    }
}
