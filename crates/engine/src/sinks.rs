// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collaborator seams: session/cycle accounting and pass/fail feedback.
//!
//! Implementations live with the process wiring; the runner only ever
//! calls through these traits. Sink failures are reported, logged by the
//! caller, and never interrupt the job loop.

use async_trait::async_trait;
use oc_core::{CycleReport, JobReport, Session};
use thiserror::Error;

/// Errors from sink operations
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink write failed: {0}")]
    WriteFailed(String),
}

/// Consumes job and cycle completion events for logging and sequencing
/// display.
#[async_trait]
pub trait AccountingSink: Clone + Send + Sync + 'static {
    async fn session_started(&self, session: &Session) -> Result<(), SinkError>;

    async fn job_complete(&self, report: &JobReport, operator: &str) -> Result<(), SinkError>;

    async fn cycle_complete(&self, report: &CycleReport, operator: &str) -> Result<(), SinkError>;
}

/// Drives indicator signals from pass/fail outcomes.
///
/// Fire-and-forget: implementations must not block the runner beyond a
/// bounded pulse and report nothing back.
#[async_trait]
pub trait FeedbackActuator: Clone + Send + Sync + 'static {
    async fn on_pass(&self);

    async fn on_fail(&self);
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded accounting event
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum AccountingCall {
        SessionStarted { operator: String },
        JobComplete { report: JobReport, operator: String },
        CycleComplete { report: CycleReport, operator: String },
    }

    /// Fake accounting sink for testing
    #[derive(Clone, Default)]
    pub struct FakeAccounting {
        calls: Arc<Mutex<Vec<AccountingCall>>>,
    }

    impl FakeAccounting {
        pub fn new() -> Self {
            Self::default()
        }

        /// All recorded events, in order
        pub fn calls(&self) -> Vec<AccountingCall> {
            self.calls.lock().clone()
        }

        /// Just the job completion reports, in order
        pub fn job_reports(&self) -> Vec<JobReport> {
            self.calls
                .lock()
                .iter()
                .filter_map(|call| match call {
                    AccountingCall::JobComplete { report, .. } => Some(report.clone()),
                    _ => None,
                })
                .collect()
        }

        /// Just the cycle completion reports, in order
        pub fn cycle_reports(&self) -> Vec<CycleReport> {
            self.calls
                .lock()
                .iter()
                .filter_map(|call| match call {
                    AccountingCall::CycleComplete { report, .. } => Some(report.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl AccountingSink for FakeAccounting {
        async fn session_started(&self, session: &Session) -> Result<(), SinkError> {
            self.calls
                .lock()
                .push(AccountingCall::SessionStarted { operator: session.operator().to_string() });
            Ok(())
        }

        async fn job_complete(&self, report: &JobReport, operator: &str) -> Result<(), SinkError> {
            self.calls.lock().push(AccountingCall::JobComplete {
                report: report.clone(),
                operator: operator.to_string(),
            });
            Ok(())
        }

        async fn cycle_complete(
            &self,
            report: &CycleReport,
            operator: &str,
        ) -> Result<(), SinkError> {
            self.calls.lock().push(AccountingCall::CycleComplete {
                report: report.clone(),
                operator: operator.to_string(),
            });
            Ok(())
        }
    }

    /// Fake feedback actuator counting pulses
    #[derive(Clone, Default)]
    pub struct FakePulse {
        counts: Arc<Mutex<(u32, u32)>>,
    }

    impl FakePulse {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn passes(&self) -> u32 {
            self.counts.lock().0
        }

        pub fn fails(&self) -> u32 {
            self.counts.lock().1
        }
    }

    #[async_trait]
    impl FeedbackActuator for FakePulse {
        async fn on_pass(&self) {
            self.counts.lock().0 += 1;
        }

        async fn on_fail(&self) {
            self.counts.lock().1 += 1;
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{AccountingCall, FakeAccounting, FakePulse};
