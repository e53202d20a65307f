// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger coordination: debounced sensor edges AND-gated into one
//! ready signal.
//!
//! Edge callbacks run in interrupt context: they update in-memory state
//! and signal the runner, nothing else. All observable side effects live
//! on the runner side of the boundary.

use oc_core::{Clock, TriggerLines};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

const MAX_LINES: usize = 2;

#[derive(Debug)]
struct CoordState {
    armed: [bool; MAX_LINES],
    last_edge_ms: [Option<u64>; MAX_LINES],
    suspended: bool,
    ready: bool,
}

/// AND-gates one or two sensor lines into a single edge-triggered ready
/// condition.
///
/// Arming and the atomic clear-on-fire happen under one mutex, so no edge
/// callback can ever observe a partially cleared pair. While suspended
/// (job in flight), edges are timestamped but discarded — never queued.
pub struct TriggerCoordinator<C: Clock> {
    lines: usize,
    state: Mutex<CoordState>,
    ready: Notify,
    clock: C,
}

impl<C: Clock> TriggerCoordinator<C> {
    pub fn new(lines: TriggerLines, clock: C) -> Self {
        Self {
            lines: lines.count(),
            state: Mutex::new(CoordState {
                armed: [false; MAX_LINES],
                last_edge_ms: [None; MAX_LINES],
                suspended: false,
                ready: false,
            }),
            ready: Notify::new(),
            clock,
        }
    }

    /// Record a qualifying (already debounced) rising edge on `line`.
    ///
    /// Non-blocking and infallible: edges on unwired lines are ignored,
    /// edges while suspended are observed (timestamped) but not armed.
    pub fn on_edge(&self, line: usize) {
        if line >= self.lines {
            return;
        }
        let fire = {
            let mut state = self.state.lock();
            state.last_edge_ms[line] = Some(self.clock.epoch_ms());
            if state.suspended {
                return;
            }
            state.armed[line] = true;
            if state.armed[..self.lines].iter().all(|&armed| armed) {
                for flag in &mut state.armed[..self.lines] {
                    *flag = false;
                }
                state.ready = true;
                true
            } else {
                false
            }
        };
        if fire {
            self.ready.notify_one();
        }
    }

    /// Non-blocking check-and-consume of the ready signal.
    pub fn poll_ready(&self) -> bool {
        let mut state = self.state.lock();
        std::mem::take(&mut state.ready)
    }

    /// Block until the ready signal fires (consume it) or `cancel` does.
    /// Returns false on cancellation.
    pub async fn wait_ready(&self, cancel: &CancellationToken) -> bool {
        loop {
            if self.poll_ready() {
                return true;
            }
            tokio::select! {
                _ = self.ready.notified() => {}
                _ = cancel.cancelled() => return false,
            }
        }
    }

    /// Start discarding edges (job in flight).
    pub fn suspend(&self) {
        self.state.lock().suspended = true;
    }

    /// Arm edges again after a job finishes.
    pub fn resume(&self) {
        self.state.lock().suspended = false;
    }

    /// Clear armed flags, the ready signal, and the suspension.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.armed = [false; MAX_LINES];
        state.ready = false;
        state.suspended = false;
    }

    /// Epoch milliseconds of the most recent edge seen on `line`, armed or
    /// discarded. Lets the runner side log ignored pulses outside
    /// interrupt context.
    pub fn last_edge_ms(&self, line: usize) -> Option<u64> {
        self.state.lock().last_edge_ms.get(line).copied().flatten()
    }

    pub fn lines(&self) -> usize {
        self.lines
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
