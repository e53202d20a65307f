// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound command frames for the vision-sensor controller.

/// Frame start marker
pub const STX: u8 = 0x02;
/// Frame end marker
pub const ETX: u8 = 0x03;

/// Commands the controller understands.
///
/// Exactly one frame may be in flight on the connection at a time; the job
/// runner is the sole writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Select the inspection program for the given job number
    SwitchJob(u32),
    /// Capture and classify the current part
    Trigger,
}

impl Command {
    /// Encode as a byte-exact wire frame: STX + ASCII payload + ETX.
    pub fn encode(&self) -> Vec<u8> {
        let payload = match self {
            Command::SwitchJob(n) => format!("set job {n}"),
            Command::Trigger => "trigger".to_string(),
        };
        let mut frame = Vec::with_capacity(payload.len() + 2);
        frame.push(STX);
        frame.extend_from_slice(payload.as_bytes());
        frame.push(ETX);
        frame
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
