// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn switch_job_frame_is_byte_exact() {
    assert_eq!(Command::SwitchJob(1).encode(), b"\x02set job 1\x03");
}

#[test]
fn trigger_frame_is_byte_exact() {
    assert_eq!(Command::Trigger.encode(), b"\x02trigger\x03");
}

#[parameterized(
    two_digits = { 42, "set job 42" },
    large = { 1_000_000, "set job 1000000" },
)]
fn switch_job_renders_decimal_numbers(n: u32, payload: &str) {
    let frame = Command::SwitchJob(n).encode();
    assert_eq!(frame[0], STX);
    assert_eq!(*frame.last().unwrap(), ETX);
    assert_eq!(&frame[1..frame.len() - 1], payload.as_bytes());
}

#[test]
fn payload_is_pure_ascii() {
    let frame = Command::SwitchJob(987_654).encode();
    for byte in &frame[1..frame.len() - 1] {
        assert!(byte.is_ascii(), "non-ASCII byte {byte:#x} in payload");
    }
}
