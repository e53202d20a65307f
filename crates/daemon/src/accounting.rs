// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only accounting log in the cell's historical format.

use async_trait::async_trait;
use oc_core::{CycleReport, JobOutcome, JobReport, Session};
use oc_engine::{AccountingSink, SinkError};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Writes human-readable timestamped lines to the job log and mirrors
/// them to tracing.
///
/// Each append opens, writes, and closes the file; safe for the low
/// write frequency of job events.
#[derive(Debug, Clone)]
pub struct FileAccounting {
    path: PathBuf,
}

impl FileAccounting {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn append(&self, message: &str) -> Result<(), SinkError> {
        let line = format!("{}    {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"), message);
        tracing::info!("{message}");
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SinkError::WriteFailed(e.to_string()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SinkError::WriteFailed(e.to_string()))?;
        writeln!(file, "{line}").map_err(|e| SinkError::WriteFailed(e.to_string()))
    }
}

fn outcome_verb(outcome: JobOutcome) -> &'static str {
    match outcome {
        JobOutcome::Pass => "completed",
        JobOutcome::Exhausted => "abandoned",
        JobOutcome::Aborted => "aborted",
    }
}

#[async_trait]
impl AccountingSink for FileAccounting {
    async fn session_started(&self, session: &Session) -> Result<(), SinkError> {
        self.append(&format!("--- New session started by {} ---", session.operator()))
    }

    async fn job_complete(&self, report: &JobReport, operator: &str) -> Result<(), SinkError> {
        self.append(&format!(
            "Job {} {} by {} in {:.2}s with {} retries",
            report.job_number,
            outcome_verb(report.outcome),
            operator,
            report.elapsed.as_secs_f64(),
            report.retries(),
        ))
    }

    async fn cycle_complete(&self, report: &CycleReport, operator: &str) -> Result<(), SinkError> {
        self.append(&format!(
            "Cycle {} of {} jobs completed by {} in {:.2} seconds",
            report.index,
            report.jobs,
            operator,
            report.duration.as_secs_f64(),
        ))
    }
}

#[cfg(test)]
#[path = "accounting_tests.rs"]
mod tests;
