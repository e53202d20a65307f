// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Link seam between the runner and the camera connection.

use async_trait::async_trait;
use oc_core::{AttemptOutcome, Clock};
use oc_link::{CameraLink, LinkError};
use std::time::{Duration, Instant};

/// What the runner needs from the camera connection: ordered command
/// writes and a correlated result wait.
#[async_trait]
pub trait InspectionLink: Send + Sync + 'static {
    async fn switch_job(&self, job_number: u32) -> Result<(), LinkError>;

    /// Fire the capture trigger; returns the send timestamp used as the
    /// staleness bound for this attempt's result.
    async fn trigger(&self) -> Result<Instant, LinkError>;

    async fn await_result(
        &self,
        since: Instant,
        timeout: Duration,
    ) -> Result<AttemptOutcome, LinkError>;
}

#[async_trait]
impl<C: Clock> InspectionLink for CameraLink<C> {
    async fn switch_job(&self, job_number: u32) -> Result<(), LinkError> {
        self.send_switch_job(job_number).await
    }

    async fn trigger(&self) -> Result<Instant, LinkError> {
        self.send_trigger().await
    }

    async fn await_result(
        &self,
        since: Instant,
        timeout: Duration,
    ) -> Result<AttemptOutcome, LinkError> {
        CameraLink::await_result(self, since, timeout).await
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod scripted {
    use super::*;
    use oc_core::FakeClock;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// A command the runner sent to the scripted link
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LinkCommand {
        SwitchJob(u32),
        Trigger,
    }

    /// Scripted behavior for one `await_result` call
    #[derive(Debug, Clone, Copy)]
    pub enum ScriptedResult {
        /// Return this outcome immediately
        Outcome(AttemptOutcome),
        /// Fail the link (connection closed)
        Fault,
        /// Never resolve — the caller's cancellation path must fire
        Hang,
    }

    #[derive(Default)]
    struct ScriptState {
        results: VecDeque<ScriptedResult>,
        commands: Vec<LinkCommand>,
        fail_next_switch: bool,
    }

    /// In-memory link that replays a scripted result sequence, for runner
    /// tests without sockets.
    #[derive(Clone)]
    pub struct ScriptedLink {
        state: Arc<Mutex<ScriptState>>,
        clock: FakeClock,
    }

    impl ScriptedLink {
        pub fn new(clock: FakeClock) -> Self {
            Self { state: Arc::new(Mutex::new(ScriptState::default())), clock }
        }

        /// Queue the behavior of the next unscripted `await_result` call.
        pub fn push(&self, result: ScriptedResult) {
            self.state.lock().results.push_back(result);
        }

        pub fn push_outcome(&self, outcome: AttemptOutcome) {
            self.push(ScriptedResult::Outcome(outcome));
        }

        /// Make the next `switch_job` fail with a closed link.
        pub fn fail_next_switch(&self) {
            self.state.lock().fail_next_switch = true;
        }

        /// Every command the runner has sent, in order.
        pub fn commands(&self) -> Vec<LinkCommand> {
            self.state.lock().commands.clone()
        }
    }

    #[async_trait]
    impl InspectionLink for ScriptedLink {
        async fn switch_job(&self, job_number: u32) -> Result<(), LinkError> {
            let mut state = self.state.lock();
            if std::mem::take(&mut state.fail_next_switch) {
                return Err(LinkError::Closed);
            }
            state.commands.push(LinkCommand::SwitchJob(job_number));
            Ok(())
        }

        async fn trigger(&self) -> Result<Instant, LinkError> {
            self.state.lock().commands.push(LinkCommand::Trigger);
            Ok(self.clock.now())
        }

        async fn await_result(
            &self,
            _since: Instant,
            timeout: Duration,
        ) -> Result<AttemptOutcome, LinkError> {
            let scripted = self.state.lock().results.pop_front();
            match scripted {
                Some(ScriptedResult::Outcome(outcome)) => Ok(outcome),
                Some(ScriptedResult::Fault) => Err(LinkError::Closed),
                Some(ScriptedResult::Hang) => std::future::pending().await,
                None => {
                    // unscripted: behave like a silent camera
                    tokio::time::sleep(timeout).await;
                    Ok(AttemptOutcome::Timeout)
                }
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use scripted::{LinkCommand, ScriptedLink, ScriptedResult};
