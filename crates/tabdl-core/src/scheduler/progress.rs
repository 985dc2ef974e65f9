//! Shared progress counter for the CLI.
//!
//! Workers call [`ProgressReporter::advance`] once per job they take on; an
//! optional listener channel receives a snapshot after every advance so the
//! CLI can redraw its progress line without polling.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::UnboundedSender;

/// Jobs handled so far out of the jobs the counting pass expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub done: u64,
    pub expected: u64,
}

impl ProgressSnapshot {
    /// Fraction complete in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.expected == 0 {
            return 1.0;
        }
        (self.done as f64 / self.expected as f64).min(1.0)
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.done, self.expected)
    }
}

#[derive(Debug)]
pub struct ProgressReporter {
    done: AtomicU64,
    expected: u64,
    listener: Option<UnboundedSender<ProgressSnapshot>>,
}

impl ProgressReporter {
    pub fn new(expected: u64) -> Self {
        Self {
            done: AtomicU64::new(0),
            expected,
            listener: None,
        }
    }

    pub fn with_listener(mut self, tx: UnboundedSender<ProgressSnapshot>) -> Self {
        self.listener = Some(tx);
        self
    }

    /// Add `n` and return the new total. A closed listener is ignored.
    pub fn advance(&self, n: u64) -> u64 {
        let done = self.done.fetch_add(n, Ordering::AcqRel) + n;
        if let Some(tx) = &self.listener {
            let _ = tx.send(ProgressSnapshot {
                done,
                expected: self.expected,
            });
        }
        done
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            done: self.done.load(Ordering::Acquire),
            expected: self.expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn advance_returns_running_total() {
        let p = ProgressReporter::new(10);
        assert_eq!(p.advance(1), 1);
        assert_eq!(p.advance(3), 4);
        assert_eq!(p.snapshot(), ProgressSnapshot { done: 4, expected: 10 });
        assert_eq!(p.snapshot().to_string(), "4/10");
    }

    #[test]
    fn concurrent_advances_are_not_lost() {
        let p = Arc::new(ProgressReporter::new(800));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let p = Arc::clone(&p);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        p.advance(1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(p.snapshot().done, 800);
        assert_eq!(p.snapshot().fraction(), 1.0);
    }

    #[test]
    fn listener_sees_every_advance_in_order() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let p = ProgressReporter::new(2).with_listener(tx);
        p.advance(1);
        p.advance(1);
        assert_eq!(rx.try_recv().unwrap().done, 1);
        assert_eq!(rx.try_recv().unwrap().done, 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_listener_does_not_break_advance() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let p = ProgressReporter::new(1).with_listener(tx);
        assert_eq!(p.advance(1), 1);
    }

    #[test]
    fn fraction_of_empty_run_is_complete() {
        assert_eq!(ProgressReporter::new(0).snapshot().fraction(), 1.0);
    }
}
