// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job outcomes and the runner state machine vocabulary.
//!
//! A *job* is one inspect-and-classify cycle for one physical part,
//! identified by a monotonic job number. An *attempt* is one
//! switch+trigger+await-result round inside a job's retry loop.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Classified result of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Result text contained the pass token
    Pass,
    /// Result text contained the fail token
    Fail,
    /// A result arrived but matched neither token
    Unknown,
    /// No correlated result arrived within the attempt window
    Timeout,
}

impl AttemptOutcome {
    /// Pass ends the job; everything else feeds the retry loop.
    pub fn is_pass(self) -> bool {
        matches!(self, AttemptOutcome::Pass)
    }
}

crate::simple_display! {
    AttemptOutcome {
        Pass => "pass",
        Fail => "fail",
        Unknown => "unknown",
        Timeout => "timeout",
    }
}

/// Terminal outcome of a whole job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Pass,
    /// The attempt bound was reached without a pass
    Exhausted,
    /// Aborted by reset or a link fault before any terminal result
    Aborted,
}

crate::simple_display! {
    JobOutcome {
        Pass => "pass",
        Exhausted => "exhausted",
        Aborted => "aborted",
    }
}

/// Runner state machine states.
///
/// `DonePass` and `DoneAborted` are terminal per job; the runner re-enters
/// `Armed` for the next job number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Armed,
    Switching,
    Capturing,
    Evaluating,
    RetryBackoff,
    DonePass,
    DoneAborted,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::DonePass | JobState::DoneAborted)
    }
}

crate::simple_display! {
    JobState {
        Armed => "armed",
        Switching => "switching",
        Capturing => "capturing",
        Evaluating => "evaluating",
        RetryBackoff => "retry_backoff",
        DonePass => "done_pass",
        DoneAborted => "done_aborted",
    }
}

/// Completion record handed to the accounting sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub job_number: u32,
    /// Attempts performed, including the final one
    pub attempts: u32,
    pub elapsed: Duration,
    pub outcome: JobOutcome,
}

impl JobReport {
    /// Retries beyond the first attempt (the number the original cell
    /// installations logged).
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
