// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persistent camera link: sole-writer command side plus a background
//! reader that publishes inbound text into the result mailbox.

use crate::classify::{normalize, Tokens};
use crate::frame::Command;
use crate::slot::ResultSlot;
use oc_core::{AttemptOutcome, Clock};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

/// Failure to establish the link. Fatal at startup: the cell must not arm
/// sensors without a camera.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("connect to {addr} timed out after {timeout:?}")]
    Timeout { addr: String, timeout: Duration },

    #[error("connect to {addr} failed: {source}")]
    Refused {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Mid-session link fault. Fatal to the current session; the owning loop
/// must tear down and reconnect — the link never reconnects itself.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("camera connection closed")]
    Closed,

    #[error("camera read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("camera write failed: {0}")]
    Write(#[source] std::io::Error),
}

/// Command side of the camera connection.
///
/// The job runner is the sole writer; command writes are totally ordered.
pub struct CameraLink<C: Clock> {
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    slot: Arc<ResultSlot>,
    tokens: Tokens,
    closed: CancellationToken,
    clock: C,
}

impl<C: Clock> CameraLink<C> {
    /// Establish the connection and split it into the command side and the
    /// background [`ResultReader`]. The caller spawns `reader.run()`.
    pub async fn connect(
        addr: &str,
        connect_timeout: Duration,
        tokens: Tokens,
        clock: C,
    ) -> Result<(Self, ResultReader<C>), ConnectError> {
        let stream = match tokio::time::timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(ConnectError::Refused { addr: addr.to_string(), source })
            }
            Err(_) => {
                return Err(ConnectError::Timeout {
                    addr: addr.to_string(),
                    timeout: connect_timeout,
                })
            }
        };
        tracing::info!(addr, "camera link established");

        let (read_half, write_half) = stream.into_split();
        let slot = Arc::new(ResultSlot::new());
        let closed = CancellationToken::new();

        let reader = ResultReader {
            stream: read_half,
            slot: Arc::clone(&slot),
            carry_len: tokens.carry_len(),
            closed: closed.clone(),
            clock: clock.clone(),
        };
        let link = Self {
            writer: tokio::sync::Mutex::new(write_half),
            slot,
            tokens,
            closed,
            clock,
        };
        Ok((link, reader))
    }

    /// Cancelled when the reader hits a read error or EOF, or on teardown.
    pub fn closed(&self) -> CancellationToken {
        self.closed.clone()
    }

    /// Tear the link down; unblocks the reader and any pending wait.
    pub fn shutdown(&self) {
        self.closed.cancel();
    }

    /// Switch the controller to the inspection program for `job_number`.
    pub async fn send_switch_job(&self, job_number: u32) -> Result<(), LinkError> {
        self.send(Command::SwitchJob(job_number)).await
    }

    /// Fire the capture trigger. Returns the send timestamp taken
    /// immediately before the write — the `since` bound for correlating
    /// the attempt's result.
    pub async fn send_trigger(&self) -> Result<Instant, LinkError> {
        let sent_at = self.clock.now();
        self.send(Command::Trigger).await?;
        Ok(sent_at)
    }

    async fn send(&self, command: Command) -> Result<(), LinkError> {
        if self.closed.is_cancelled() {
            return Err(LinkError::Closed);
        }
        let frame = command.encode();
        let mut writer = self.writer.lock().await;
        writer.write_all(&frame).await.map_err(LinkError::Write)?;
        writer.flush().await.map_err(LinkError::Write)
    }

    /// Block until the mailbox holds a result received strictly after
    /// `since` (consume and classify it), the timeout elapses, or the link
    /// dies. Stale values are discarded, never classified.
    pub async fn await_result(
        &self,
        since: Instant,
        timeout: Duration,
    ) -> Result<AttemptOutcome, LinkError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(result) = self.slot.take_newer_than(since) {
                let verdict = self.tokens.classify(&result.text);
                tracing::debug!(text = %result.text, verdict = ?verdict, "result consumed");
                return Ok(verdict.into());
            }
            tokio::select! {
                _ = self.slot.published() => {}
                _ = self.closed.cancelled() => return Err(LinkError::Closed),
                _ = tokio::time::sleep_until(deadline) => return Ok(AttemptOutcome::Timeout),
            }
        }
    }
}

/// Long-lived reader loop owning the inbound half of the connection.
///
/// Each chunk is normalized and published latest-wins. The transport is an
/// unframed stream, so the tail of the previous chunk is carried into the
/// next scan: a token split across reads still classifies, while carried
/// text alone is always one character too short to re-form one.
pub struct ResultReader<C: Clock> {
    stream: OwnedReadHalf,
    slot: Arc<ResultSlot>,
    carry_len: usize,
    closed: CancellationToken,
    clock: C,
}

impl<C: Clock> ResultReader<C> {
    /// Run until the connection dies or the link is shut down. The returned
    /// error is the session-fatal fault to report upward.
    pub async fn run(mut self) -> LinkError {
        let mut buf = [0u8; 1024];
        let mut carry = String::new();
        loop {
            let read = tokio::select! {
                read = self.stream.read(&mut buf) => read,
                _ = self.closed.cancelled() => return LinkError::Closed,
            };
            match read {
                Ok(0) => {
                    tracing::warn!("camera closed the connection");
                    self.closed.cancel();
                    return LinkError::Closed;
                }
                Ok(n) => {
                    let text = normalize(&buf[..n]);
                    if text.is_empty() {
                        continue;
                    }
                    let merged = format!("{carry}{text}");
                    carry = tail(&merged, self.carry_len);
                    self.slot.publish(merged, self.clock.now());
                }
                Err(e) => {
                    tracing::warn!(error = %e, "camera read failed");
                    self.closed.cancel();
                    return LinkError::Read(e);
                }
            }
        }
    }
}

/// Last `len` characters of `text` (whole chars, not bytes).
fn tail(text: &str, len: usize) -> String {
    if len == 0 {
        return String::new();
    }
    let start = text.char_indices().rev().nth(len - 1).map(|(i, _)| i).unwrap_or(0);
    text[start..].to_string()
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
