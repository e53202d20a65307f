// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use oc_core::{FakeClock, Session};
use std::time::Duration;

fn sink() -> (FileAccounting, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    (FileAccounting::new(dir.path().join("logs/job_pass_log.txt")), dir)
}

fn report(outcome: JobOutcome) -> JobReport {
    JobReport { job_number: 7, attempts: 3, elapsed: Duration::from_millis(2_500), outcome }
}

#[tokio::test]
async fn job_line_matches_the_historical_format() {
    let (sink, dir) = sink();
    sink.job_complete(&report(JobOutcome::Pass), "lena").await.unwrap();

    let text = std::fs::read_to_string(dir.path().join("logs/job_pass_log.txt")).unwrap();
    assert!(
        text.contains("Job 7 completed by lena in 2.50s with 2 retries"),
        "unexpected line: {text}"
    );
}

#[tokio::test]
async fn outcomes_use_distinct_verbs() {
    let (sink, dir) = sink();
    sink.job_complete(&report(JobOutcome::Exhausted), "lena").await.unwrap();
    sink.job_complete(&report(JobOutcome::Aborted), "lena").await.unwrap();

    let text = std::fs::read_to_string(dir.path().join("logs/job_pass_log.txt")).unwrap();
    assert!(text.contains("Job 7 abandoned by lena"));
    assert!(text.contains("Job 7 aborted by lena"));
}

#[tokio::test]
async fn session_banner_and_cycle_lines_append_in_order() {
    let (sink, dir) = sink();
    let session = Session::new("lena", &FakeClock::new());
    sink.session_started(&session).await.unwrap();
    sink.cycle_complete(
        &CycleReport { index: 2, jobs: 3, duration: Duration::from_secs(12) },
        "lena",
    )
    .await
    .unwrap();

    let text = std::fs::read_to_string(dir.path().join("logs/job_pass_log.txt")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("--- New session started by lena ---"));
    assert!(lines[1].contains("Cycle 2 of 3 jobs completed by lena in 12.00 seconds"));
}

#[tokio::test]
async fn unwritable_path_reports_a_sink_error() {
    let sink = FileAccounting::new(PathBuf::from("/proc/nonexistent/job_log.txt"));
    let result = sink.job_complete(&report(JobOutcome::Pass), "lena").await;
    assert!(result.is_err());
}
