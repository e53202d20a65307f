// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cell configuration: camera address, trigger wiring, retry policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Number of sensor lines wired into the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TriggerLines {
    One,
    Two,
}

impl TriggerLines {
    pub fn count(self) -> usize {
        match self {
            TriggerLines::One => 1,
            TriggerLines::Two => 2,
        }
    }
}

impl TryFrom<u8> for TriggerLines {
    type Error = ConfigError;

    fn try_from(n: u8) -> Result<Self, ConfigError> {
        match n {
            1 => Ok(TriggerLines::One),
            2 => Ok(TriggerLines::Two),
            other => Err(ConfigError::InvalidLineCount(other)),
        }
    }
}

impl From<TriggerLines> for u8 {
    fn from(lines: TriggerLines) -> u8 {
        lines.count() as u8
    }
}

/// What happens to the job number when the retry bound is reached.
///
/// The source installations disagree: one keeps re-running the same part,
/// the other abandons it and moves on. Both are valid cell policies, so the
/// choice is configuration, not code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExhaustionPolicy {
    /// Keep the job number; the same part is retried on the next trigger.
    #[default]
    #[serde(rename = "hold")]
    HoldJob,
    /// Log the abandonment and advance to the next job number.
    #[serde(rename = "advance")]
    AdvanceJob,
}

crate::simple_display! {
    ExhaustionPolicy {
        HoldJob => "hold",
        AdvanceJob => "advance",
    }
}

/// Controller configuration.
///
/// Durations are stored as whole milliseconds so the struct deserializes
/// directly from TOML / environment strings; accessors return [`Duration`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CellConfig {
    /// Vision-sensor controller address, `host:port`
    pub camera_addr: String,
    pub trigger_lines: TriggerLines,
    /// Edge debounce window applied at the hardware-binding boundary
    pub debounce_ms: u64,
    pub connect_timeout_ms: u64,
    /// Per-attempt wait for a correlated inspection result
    pub result_timeout_ms: u64,
    /// Settle delay between the switch-job and trigger commands, so the
    /// controller's job-change ack cannot land after the trigger
    pub switch_settle_ms: u64,
    /// Pause before re-issuing switch+trigger after a failed attempt
    pub retry_backoff_ms: u64,
    pub max_attempts: u32,
    /// Jobs per accounting cycle (K)
    pub cycle_size: u32,
    pub pass_token: String,
    pub fail_token: String,
    pub on_exhausted: ExhaustionPolicy,
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            camera_addr: "192.168.0.1:2300".to_string(),
            trigger_lines: TriggerLines::Two,
            debounce_ms: 100,
            connect_timeout_ms: 5_000,
            result_timeout_ms: 6_000,
            switch_settle_ms: 200,
            retry_backoff_ms: 0,
            max_attempts: 5,
            cycle_size: 3,
            pass_token: "true".to_string(),
            fail_token: "false".to_string(),
            on_exhausted: ExhaustionPolicy::HoldJob,
        }
    }
}

impl CellConfig {
    crate::setters! {
        into {
            camera_addr: String,
            pass_token: String,
            fail_token: String,
        }
        set {
            trigger_lines: TriggerLines,
            debounce_ms: u64,
            connect_timeout_ms: u64,
            result_timeout_ms: u64,
            switch_settle_ms: u64,
            retry_backoff_ms: u64,
            max_attempts: u32,
            cycle_size: u32,
            on_exhausted: ExhaustionPolicy,
        }
    }

    /// Parse from TOML and validate.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (host, port) = self
            .camera_addr
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::InvalidCameraAddr(self.camera_addr.clone()))?;
        if host.is_empty() || port.parse::<u16>().is_err() {
            return Err(ConfigError::InvalidCameraAddr(self.camera_addr.clone()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        if self.cycle_size == 0 {
            return Err(ConfigError::ZeroCycleSize);
        }
        if self.pass_token.trim().is_empty() {
            return Err(ConfigError::EmptyToken("pass_token"));
        }
        if self.fail_token.trim().is_empty() {
            return Err(ConfigError::EmptyToken("fail_token"));
        }
        if self.pass_token.eq_ignore_ascii_case(&self.fail_token) {
            return Err(ConfigError::TokenClash);
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn result_timeout(&self) -> Duration {
        Duration::from_millis(self.result_timeout_ms)
    }

    pub fn switch_settle(&self) -> Duration {
        Duration::from_millis(self.switch_settle_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("trigger_lines must be 1 or 2, got {0}")]
    InvalidLineCount(u8),

    #[error("camera_addr must be host:port, got {0:?}")]
    InvalidCameraAddr(String),

    #[error("max_attempts must be at least 1")]
    ZeroMaxAttempts,

    #[error("cycle_size must be at least 1")]
    ZeroCycleSize,

    #[error("{0} must not be empty")]
    EmptyToken(&'static str),

    #[error("pass_token and fail_token must differ")]
    TokenClash,

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
