// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job runner / retry engine: one sequential loop that is the sole
//! writer to the camera link and the sole consumer of the ready signal
//! and the result mailbox.

use crate::link::InspectionLink;
use crate::sinks::{AccountingSink, FeedbackActuator};
use crate::trigger::TriggerCoordinator;
use oc_core::{
    AttemptOutcome, CellConfig, Clock, CycleTracker, ExhaustionPolicy, JobOutcome, JobReport,
    JobState, Session,
};
use oc_link::LinkError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Why a session's run loop ended.
#[derive(Debug)]
pub enum SessionEnd {
    /// Operator reset: the owner starts a fresh session from job 1.
    Reset,
    /// Link fault: the owner must reconnect before re-arming.
    Link(LinkError),
}

/// Runner collaborator dependencies
pub struct RunnerDeps<L, A, F> {
    pub link: L,
    pub accounting: A,
    pub actuator: F,
}

/// Drives jobs through switch → trigger → correlated result, applying the
/// bounded retry policy and reporting every outcome.
///
/// The reset token is observed at every state boundary and inside every
/// blocking wait, so an operator reset never waits out a result timeout.
pub struct JobRunner<L, A, F, C: Clock> {
    link: L,
    accounting: A,
    actuator: F,
    coordinator: Arc<TriggerCoordinator<C>>,
    session: Session,
    config: CellConfig,
    clock: C,
    reset: CancellationToken,
    job_number: u32,
    cycles: CycleTracker,
    state: JobState,
}

impl<L, A, F, C> JobRunner<L, A, F, C>
where
    L: InspectionLink,
    A: AccountingSink,
    F: FeedbackActuator,
    C: Clock,
{
    pub fn new(
        deps: RunnerDeps<L, A, F>,
        coordinator: Arc<TriggerCoordinator<C>>,
        session: Session,
        config: CellConfig,
        clock: C,
        reset: CancellationToken,
    ) -> Self {
        let cycles = CycleTracker::new(config.cycle_size, clock.now());
        Self {
            link: deps.link,
            accounting: deps.accounting,
            actuator: deps.actuator,
            coordinator,
            session,
            config,
            clock,
            reset,
            job_number: 1,
            cycles,
            state: JobState::Armed,
        }
    }

    /// Run jobs until the session ends by reset or link fault.
    pub async fn run(mut self) -> SessionEnd {
        self.coordinator.reset();
        if let Err(e) = self.accounting.session_started(&self.session).await {
            tracing::warn!(error = %e, "accounting session_started failed");
        }
        tracing::info!(
            operator = self.session.operator(),
            lines = self.coordinator.lines(),
            "session armed, waiting for triggers"
        );

        loop {
            self.set_state(JobState::Armed);
            if !self.coordinator.wait_ready(&self.reset).await {
                tracing::info!("reset while armed, ending session");
                return SessionEnd::Reset;
            }
            self.coordinator.suspend();

            let (report, end) = self.run_job().await;
            self.finish_job(&report).await;
            if let Some(end) = end {
                return end;
            }
        }
    }

    /// One job: the bounded retry loop over switch+trigger+await attempts.
    ///
    /// Always produces a report (no outcome is silently dropped); a
    /// `Some(SessionEnd)` alongside it unwinds the session.
    async fn run_job(&mut self) -> (JobReport, Option<SessionEnd>) {
        let job_number = self.job_number;
        let started = self.clock.now();
        let mut attempts = 0u32;

        loop {
            if self.reset.is_cancelled() {
                let report = self.report(job_number, attempts, started, JobOutcome::Aborted);
                return (report, Some(SessionEnd::Reset));
            }
            attempts += 1;

            self.set_state(JobState::Switching);
            if let Err(e) = self.link.switch_job(job_number).await {
                tracing::error!(job = job_number, error = %e, "switch command failed");
                let report = self.report(job_number, attempts, started, JobOutcome::Aborted);
                return (report, Some(SessionEnd::Link(e)));
            }
            // let the controller's job-change ack drain before triggering,
            // so it cannot postdate the trigger and be read as a result
            if !self.pause(self.config.switch_settle()).await {
                let report = self.report(job_number, attempts, started, JobOutcome::Aborted);
                return (report, Some(SessionEnd::Reset));
            }

            self.set_state(JobState::Capturing);
            let sent_at = match self.link.trigger().await {
                Ok(sent_at) => sent_at,
                Err(e) => {
                    tracing::error!(job = job_number, error = %e, "trigger command failed");
                    let report = self.report(job_number, attempts, started, JobOutcome::Aborted);
                    return (report, Some(SessionEnd::Link(e)));
                }
            };
            let outcome = tokio::select! {
                result = self.link.await_result(sent_at, self.config.result_timeout()) => {
                    match result {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            tracing::error!(job = job_number, error = %e, "link died awaiting result");
                            let report =
                                self.report(job_number, attempts, started, JobOutcome::Aborted);
                            return (report, Some(SessionEnd::Link(e)));
                        }
                    }
                }
                _ = self.reset.cancelled() => {
                    tracing::info!(job = job_number, attempt = attempts, "reset during capture");
                    let report = self.report(job_number, attempts, started, JobOutcome::Aborted);
                    return (report, Some(SessionEnd::Reset));
                }
            };

            self.set_state(JobState::Evaluating);
            if outcome.is_pass() {
                let report = self.report(job_number, attempts, started, JobOutcome::Pass);
                return (report, None);
            }
            match outcome {
                AttemptOutcome::Fail => {
                    tracing::info!(job = job_number, attempt = attempts, "part failed inspection")
                }
                AttemptOutcome::Unknown => {
                    tracing::warn!(job = job_number, attempt = attempts, "unclassifiable result")
                }
                AttemptOutcome::Timeout => tracing::warn!(
                    job = job_number,
                    attempt = attempts,
                    "no correlated result within the attempt window"
                ),
                AttemptOutcome::Pass => {}
            }

            if attempts >= self.config.max_attempts {
                tracing::warn!(job = job_number, attempts, "retry bound reached, abandoning job");
                let report = self.report(job_number, attempts, started, JobOutcome::Exhausted);
                return (report, None);
            }
            self.set_state(JobState::RetryBackoff);
            if !self.pause(self.config.retry_backoff()).await {
                let report = self.report(job_number, attempts, started, JobOutcome::Aborted);
                return (report, Some(SessionEnd::Reset));
            }
        }
    }

    /// Terminal-per-job bookkeeping: re-arm triggers, notify the sinks,
    /// close cycles, advance the job number per policy.
    async fn finish_job(&mut self, report: &JobReport) {
        let done = if report.outcome == JobOutcome::Pass {
            JobState::DonePass
        } else {
            JobState::DoneAborted
        };
        self.set_state(done);
        self.coordinator.resume();

        if let Err(e) = self.accounting.job_complete(report, self.session.operator()).await {
            tracing::warn!(job = report.job_number, error = %e, "accounting job_complete failed");
        }
        match report.outcome {
            JobOutcome::Pass => self.actuator.on_pass().await,
            JobOutcome::Exhausted => self.actuator.on_fail().await,
            JobOutcome::Aborted => {}
        }

        let advance = match report.outcome {
            JobOutcome::Pass => true,
            JobOutcome::Exhausted => self.config.on_exhausted == ExhaustionPolicy::AdvanceJob,
            JobOutcome::Aborted => false,
        };
        if advance {
            if let Some(cycle) = self.cycles.record(self.job_number, self.clock.now()) {
                tracing::info!(cycle = cycle.index, jobs = cycle.jobs, "cycle complete");
                if let Err(e) =
                    self.accounting.cycle_complete(&cycle, self.session.operator()).await
                {
                    tracing::warn!(cycle = cycle.index, error = %e, "accounting cycle_complete failed");
                }
            }
            self.job_number += 1;
        }
    }

    fn report(
        &self,
        job_number: u32,
        attempts: u32,
        started: Instant,
        outcome: JobOutcome,
    ) -> JobReport {
        JobReport {
            job_number,
            attempts,
            elapsed: self.clock.now().saturating_duration_since(started),
            outcome,
        }
    }

    /// Sleep unless the reset token fires first. Returns false on reset.
    async fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.reset.is_cancelled();
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.reset.cancelled() => false,
        }
    }

    fn set_state(&mut self, state: JobState) {
        if self.state != state {
            tracing::debug!(job = self.job_number, from = %self.state, to = %state, "runner state");
            self.state = state;
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
