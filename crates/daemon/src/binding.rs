// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hardware binding: the edge socket the GPIO bridge process talks to.
//!
//! Line-oriented protocol on a Unix socket: `edge <n>` for a rising edge
//! on sensor line n, `reset` for the operator reset button. Debouncing
//! happens here, at the binding boundary, before the coordinator ever
//! sees an edge.

use oc_core::Clock;
use oc_engine::{Debouncer, TriggerCoordinator};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// A parsed inbound hardware event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEvent {
    Edge(usize),
    Reset,
}

/// Parse one line of the edge protocol.
pub fn parse_event(line: &str) -> Option<EdgeEvent> {
    let line = line.trim();
    if line == "reset" {
        return Some(EdgeEvent::Reset);
    }
    let n = line.strip_prefix("edge ")?.trim().parse().ok()?;
    Some(EdgeEvent::Edge(n))
}

/// Hands out the reset token for the current session.
///
/// The binding trips whichever token is current; the session loop renews
/// it when a new session starts, so a stale press never aborts the next
/// session.
#[derive(Default)]
pub struct ResetHub {
    current: Mutex<CancellationToken>,
}

impl ResetHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install and return a fresh token for a new session.
    pub fn renew(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.current.lock() = token.clone();
        token
    }

    /// Fire the pending reset request.
    pub fn trip(&self) {
        self.current.lock().cancel();
    }
}

/// Accepts bridge connections and feeds debounced edges into the
/// coordinator.
pub struct EdgeBinding<C: Clock> {
    coordinator: Arc<TriggerCoordinator<C>>,
    resets: Arc<ResetHub>,
    debouncers: Mutex<Vec<Debouncer>>,
    clock: C,
}

impl<C: Clock> EdgeBinding<C> {
    pub fn new(
        coordinator: Arc<TriggerCoordinator<C>>,
        resets: Arc<ResetHub>,
        debounce: Duration,
        clock: C,
    ) -> Self {
        let debouncers =
            (0..coordinator.lines()).map(|_| Debouncer::new(debounce)).collect();
        Self { coordinator, resets, debouncers: Mutex::new(debouncers), clock }
    }

    /// Accept loop; each bridge connection gets its own task. Runs until
    /// shutdown.
    pub async fn serve(self: Arc<Self>, listener: UnixListener, shutdown: CancellationToken) {
        info!("edge binding listening");
        loop {
            tokio::select! {
                result = listener.accept() => match result {
                    Ok((stream, _)) => {
                        let binding = Arc::clone(&self);
                        tokio::spawn(async move {
                            let mut lines = BufReader::new(stream).lines();
                            loop {
                                match lines.next_line().await {
                                    Ok(Some(line)) => binding.apply(&line),
                                    Ok(None) => break,
                                    Err(e) => {
                                        debug!(error = %e, "edge connection read failed");
                                        break;
                                    }
                                }
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "edge accept failed"),
                },
                _ = shutdown.cancelled() => {
                    info!("edge binding stopped");
                    return;
                }
            }
        }
    }

    /// Dispatch one protocol line.
    pub fn apply(&self, line: &str) {
        match parse_event(line) {
            Some(EdgeEvent::Edge(n)) => self.on_edge(n),
            Some(EdgeEvent::Reset) => {
                info!("reset pressed");
                self.resets.trip();
            }
            None => warn!(line, "unrecognized edge event"),
        }
    }

    fn on_edge(&self, line: usize) {
        let now = self.clock.now();
        let accepted = match self.debouncers.lock().get_mut(line) {
            Some(debouncer) => debouncer.accept(now),
            None => {
                warn!(line, "edge on unwired line");
                return;
            }
        };
        if accepted {
            trace!(line, "edge");
            self.coordinator.on_edge(line);
        } else {
            trace!(line, "bounce suppressed");
        }
    }
}

#[cfg(test)]
#[path = "binding_tests.rs"]
mod tests;
