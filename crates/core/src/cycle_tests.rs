// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::{Clock, FakeClock};

#[test]
fn closes_exactly_on_multiples_of_group_size() {
    let clock = FakeClock::new();
    let mut tracker = CycleTracker::new(3, clock.now());

    assert_eq!(tracker.record(1, clock.now()), None);
    assert_eq!(tracker.record(2, clock.now()), None);

    clock.advance_ms(900);
    let report = tracker.record(3, clock.now()).expect("job 3 closes cycle 1");
    assert_eq!(report.index, 1);
    assert_eq!(report.jobs, 3);
    assert_eq!(report.duration, Duration::from_millis(900));

    assert_eq!(tracker.record(4, clock.now()), None);
    assert_eq!(tracker.record(5, clock.now()), None);
    let report = tracker.record(6, clock.now()).expect("job 6 closes cycle 2");
    assert_eq!(report.index, 2);
}

#[test]
fn duration_restarts_at_each_close() {
    let clock = FakeClock::new();
    let mut tracker = CycleTracker::new(2, clock.now());

    clock.advance_ms(400);
    let first = tracker.record(2, clock.now()).expect("cycle 1");
    assert_eq!(first.duration, Duration::from_millis(400));

    clock.advance_ms(250);
    let second = tracker.record(4, clock.now()).expect("cycle 2");
    assert_eq!(second.duration, Duration::from_millis(250));
}

#[test]
fn group_size_of_one_closes_every_job() {
    let clock = FakeClock::new();
    let mut tracker = CycleTracker::new(1, clock.now());
    assert!(tracker.record(1, clock.now()).is_some());
    assert!(tracker.record(2, clock.now()).is_some());
}

#[test]
fn zero_group_size_is_clamped() {
    let clock = FakeClock::new();
    let tracker = CycleTracker::new(0, clock.now());
    assert_eq!(tracker.group_size(), 1);
}
