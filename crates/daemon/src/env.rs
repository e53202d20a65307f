// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.
//!
//! Precedence: `OC_*` variables override the optional TOML file named by
//! `OC_CONFIG`, which overrides built-in defaults. Malformed numeric
//! values fall back rather than abort; `validate()` still runs last.

use oc_core::{CellConfig, ExhaustionPolicy, TriggerLines};
use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: OC_STATE_DIR > XDG_STATE_HOME/opticell > ~/.local/state/opticell
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("OC_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("opticell"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/opticell"))
}

/// Load the cell configuration: OC_CONFIG file (if set) with OC_* overrides.
pub fn load_config() -> Result<CellConfig, LifecycleError> {
    let mut config = match std::env::var("OC_CONFIG") {
        Ok(path) => {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| LifecycleError::ConfigFile(PathBuf::from(&path), e))?;
            CellConfig::from_toml(&text).map_err(LifecycleError::Config)?
        }
        Err(_) => CellConfig::default(),
    };

    if let Ok(addr) = std::env::var("OC_CAMERA_ADDR") {
        config.camera_addr = addr;
    }
    if let Some(n) = env_parse::<u8>("OC_TRIGGER_LINES") {
        config.trigger_lines = TriggerLines::try_from(n).map_err(LifecycleError::Config)?;
    }
    if let Some(ms) = env_parse("OC_DEBOUNCE_MS") {
        config.debounce_ms = ms;
    }
    if let Some(ms) = env_parse("OC_CONNECT_TIMEOUT_MS") {
        config.connect_timeout_ms = ms;
    }
    if let Some(ms) = env_parse("OC_RESULT_TIMEOUT_MS") {
        config.result_timeout_ms = ms;
    }
    if let Some(ms) = env_parse("OC_SWITCH_SETTLE_MS") {
        config.switch_settle_ms = ms;
    }
    if let Some(ms) = env_parse("OC_RETRY_BACKOFF_MS") {
        config.retry_backoff_ms = ms;
    }
    if let Some(n) = env_parse("OC_MAX_ATTEMPTS") {
        config.max_attempts = n;
    }
    if let Some(n) = env_parse("OC_CYCLE_SIZE") {
        config.cycle_size = n;
    }
    if let Ok(token) = std::env::var("OC_PASS_TOKEN") {
        config.pass_token = token;
    }
    if let Ok(token) = std::env::var("OC_FAIL_TOKEN") {
        config.fail_token = token;
    }
    match std::env::var("OC_ON_EXHAUSTED").as_deref() {
        Ok("hold") => config.on_exhausted = ExhaustionPolicy::HoldJob,
        Ok("advance") => config.on_exhausted = ExhaustionPolicy::AdvanceJob,
        _ => {}
    }

    config.validate().map_err(LifecycleError::Config)?;
    Ok(config)
}

/// Operator name override (skips the interactive prompt)
pub fn operator() -> Option<String> {
    std::env::var("OC_OPERATOR").ok().filter(|s| !s.trim().is_empty())
}

/// Delay between reconnect attempts after a mid-session link fault
pub fn reconnect_delay() -> Duration {
    env_parse("OC_RECONNECT_DELAY_MS").map(Duration::from_millis).unwrap_or(Duration::from_secs(5))
}

/// Pass-LED brightness file (sysfs-style); feedback is log-only when unset
pub fn led_pass_path() -> Option<PathBuf> {
    std::env::var("OC_LED_PASS_PATH").ok().map(PathBuf::from)
}

/// Fail-LED brightness file
pub fn led_fail_path() -> Option<PathBuf> {
    std::env::var("OC_LED_FAIL_PATH").ok().map(PathBuf::from)
}

/// LED pulse duration (default 50 ms)
pub fn led_pulse() -> Duration {
    env_parse("OC_LED_PULSE_MS").map(Duration::from_millis).unwrap_or(Duration::from_millis(50))
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
