//! Tests for the adaptive pacing controller.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::{AdaptiveDelay, PacingPolicy};

fn policy() -> PacingPolicy {
    PacingPolicy {
        floor: Duration::ZERO,
        ceiling: Duration::from_secs(10),
        failure_threshold: 0.2,
        window_size: 50,
        increment: Duration::from_millis(500),
        decrement: Duration::from_millis(100),
        check_interval: 10,
    }
}

#[test]
fn ten_failures_raise_delay_once_at_the_tenth() {
    let pacing = AdaptiveDelay::new(policy());
    for i in 1..=9 {
        pacing.record(false);
        assert_eq!(pacing.current(), Duration::ZERO, "changed early at {i}");
    }
    pacing.record(false);
    assert_eq!(pacing.current(), Duration::from_millis(500));
}

#[test]
fn no_adjustment_between_check_intervals() {
    let pacing = AdaptiveDelay::new(policy());
    for _ in 0..10 {
        pacing.record(false);
    }
    for _ in 0..9 {
        pacing.record(false);
    }
    assert_eq!(pacing.current(), Duration::from_millis(500));
    pacing.record(false);
    assert_eq!(pacing.current(), Duration::from_millis(1000));
}

#[test]
fn fewer_than_five_samples_never_adjust() {
    let mut p = policy();
    p.check_interval = 1;
    let pacing = AdaptiveDelay::new(p);
    for _ in 0..4 {
        pacing.record(false);
    }
    assert_eq!(pacing.current(), Duration::ZERO);
    pacing.record(false);
    assert_eq!(pacing.current(), Duration::from_millis(500));
}

#[test]
fn low_failure_rate_eases_off_to_floor() {
    let mut p = policy();
    p.floor = Duration::from_millis(200);
    let pacing = AdaptiveDelay::new(p);
    for _ in 0..10 {
        pacing.record(false);
    }
    assert_eq!(pacing.current(), Duration::from_millis(700));

    // The delay keeps climbing until the failures are a small enough share of
    // the window, then eases off by one decrement per check.
    for _ in 0..400 {
        pacing.record(true);
    }
    assert_eq!(pacing.current(), Duration::from_millis(200));
}

#[test]
fn rate_between_half_and_full_threshold_holds_delay() {
    let mut p = policy();
    p.window_size = 20;
    p.check_interval = 20;
    let pacing = AdaptiveDelay::new(p);
    for _ in 0..20 {
        pacing.record(false);
    }
    let raised = pacing.current();
    assert_eq!(raised, Duration::from_millis(500));
    // 3 of 20 failed (15%): above half the threshold, below the threshold.
    for i in 0..20 {
        pacing.record(i < 17);
    }
    let window_rate = pacing.statistics().recent_failure_rate;
    assert!((window_rate - 0.15).abs() < 1e-9, "{window_rate}");
    assert_eq!(pacing.current(), raised);
}

#[test]
fn delay_stays_within_bounds() {
    let mut p = policy();
    p.floor = Duration::from_millis(300);
    p.ceiling = Duration::from_secs(2);
    p.check_interval = 1;
    let pacing = AdaptiveDelay::new(p);
    for i in 0..1000 {
        pacing.record(i % 97 < 60);
        let d = pacing.current();
        assert!(d >= p.floor && d <= p.ceiling, "{d:?} out of bounds at {i}");
    }
    for _ in 0..500 {
        pacing.record(false);
    }
    assert_eq!(pacing.current(), p.ceiling);
    for _ in 0..500 {
        pacing.record(true);
    }
    assert_eq!(pacing.current(), p.floor);
}

#[test]
fn window_is_bounded() {
    let mut p = policy();
    p.window_size = 7;
    let pacing = AdaptiveDelay::new(p);
    for _ in 0..30 {
        pacing.record(true);
    }
    let stats = pacing.statistics();
    assert_eq!(stats.window_len, 7);
    assert_eq!(stats.total_recorded, 30);
    assert_eq!(stats.total_failures, 0);
}

#[test]
fn concurrent_records_are_all_counted() {
    let pacing = Arc::new(AdaptiveDelay::new(policy()));
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let pacing = Arc::clone(&pacing);
            thread::spawn(move || {
                for i in 0..250 {
                    pacing.record((i + t) % 4 != 0);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let stats = pacing.statistics();
    assert_eq!(stats.total_recorded, 2000);
    assert_eq!(stats.total_failures, 500);
    assert!((stats.overall_failure_rate - 0.25).abs() < 1e-9);
    let d = pacing.current();
    assert!(d <= Duration::from_secs(10));
}
