// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LED feedback actuator: bounded pulses on sysfs-style brightness files.

use async_trait::async_trait;
use oc_engine::FeedbackActuator;
use std::path::PathBuf;
use std::time::Duration;

/// Pulses a pass or fail LED for a bounded duration on a spawned task, so
/// the runner is never blocked beyond the spawn itself. With no path
/// configured the pulse is log-only.
#[derive(Debug, Clone)]
pub struct LedActuator {
    pass_path: Option<PathBuf>,
    fail_path: Option<PathBuf>,
    pulse: Duration,
}

impl LedActuator {
    pub fn new(pass_path: Option<PathBuf>, fail_path: Option<PathBuf>, pulse: Duration) -> Self {
        Self { pass_path, fail_path, pulse }
    }

    /// Build from the `OC_LED_*` environment surface.
    pub fn from_env() -> Self {
        Self::new(crate::env::led_pass_path(), crate::env::led_fail_path(), crate::env::led_pulse())
    }

    fn pulse(&self, path: Option<PathBuf>, label: &'static str) {
        let Some(path) = path else {
            tracing::info!(outcome = label, "feedback pulse (no LED configured)");
            return;
        };
        let pulse = self.pulse;
        // fire-and-forget: pulse failures are logged, never surfaced
        tokio::spawn(async move {
            if let Err(e) = tokio::fs::write(&path, b"1").await {
                tracing::warn!(path = %path.display(), error = %e, "LED on failed");
                return;
            }
            tokio::time::sleep(pulse).await;
            if let Err(e) = tokio::fs::write(&path, b"0").await {
                tracing::warn!(path = %path.display(), error = %e, "LED off failed");
            }
        });
    }
}

#[async_trait]
impl FeedbackActuator for LedActuator {
    async fn on_pass(&self) {
        self.pulse(self.pass_path.clone(), "pass");
    }

    async fn on_fail(&self) {
        self.pulse(self.fail_path.clone(), "fail");
    }
}

#[cfg(test)]
#[path = "actuator_tests.rs"]
mod tests;
