// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios: the real camera link and runner against a fake
//! vision-sensor controller on loopback TCP.

use oc_core::{CellConfig, JobOutcome, Session, SystemClock, TriggerLines};
use oc_engine::{
    AccountingCall, FakeAccounting, FakePulse, JobRunner, RunnerDeps, SessionEnd,
    TriggerCoordinator,
};
use oc_link::{CameraLink, Tokens};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const STX: u8 = 0x02;
const ETX: u8 = 0x03;

/// Fake controller: records decoded command payloads, acks job switches,
/// and answers each trigger with the next scripted reply (None = silent).
fn spawn_camera(
    listener: TcpListener,
    replies: Vec<Option<&'static str>>,
) -> (JoinHandle<()>, Arc<Mutex<Vec<String>>>) {
    let payloads = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&payloads);
    let mut replies: VecDeque<Option<&'static str>> = replies.into();

    let handle = tokio::spawn(async move {
        let (mut stream, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(_) => return,
        };
        let mut pending: Vec<u8> = Vec::new();
        let mut buf = [0u8; 256];
        loop {
            let n = match stream.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => n,
            };
            pending.extend_from_slice(&buf[..n]);
            while let Some(end) = pending.iter().position(|&b| b == ETX) {
                let frame: Vec<u8> = pending.drain(..=end).collect();
                assert_eq!(frame[0], STX, "frame must start with STX");
                let payload = String::from_utf8_lossy(&frame[1..frame.len() - 1]).to_string();
                let is_trigger = payload == "trigger";
                seen.lock().unwrap().push(payload);
                if is_trigger {
                    if let Some(Some(reply)) = replies.pop_front() {
                        if stream.write_all(reply.as_bytes()).await.is_err() {
                            return;
                        }
                    }
                } else if stream.write_all(b"OK\r\n").await.is_err() {
                    return;
                }
            }
        }
    });
    (handle, payloads)
}

struct Cell {
    coordinator: Arc<TriggerCoordinator<SystemClock>>,
    accounting: FakeAccounting,
    actuator: FakePulse,
    reset: CancellationToken,
    runner: JoinHandle<SessionEnd>,
    payloads: Arc<Mutex<Vec<String>>>,
    _camera: JoinHandle<()>,
}

async fn start_cell(config: CellConfig, replies: Vec<Option<&'static str>>) -> Cell {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (camera, payloads) = spawn_camera(listener, replies);

    let clock = SystemClock;
    let tokens = Tokens::new(&config.pass_token, &config.fail_token);
    let (link, reader) = CameraLink::connect(&addr, Duration::from_secs(2), tokens, clock)
        .await
        .expect("fake camera must accept");
    tokio::spawn(reader.run());

    let coordinator = Arc::new(TriggerCoordinator::new(config.trigger_lines, clock));
    let accounting = FakeAccounting::new();
    let actuator = FakePulse::new();
    let reset = CancellationToken::new();
    let runner = JobRunner::new(
        RunnerDeps {
            link,
            accounting: accounting.clone(),
            actuator: actuator.clone(),
        },
        Arc::clone(&coordinator),
        Session::new("lena", &clock),
        config,
        clock,
        reset.clone(),
    );
    let runner = tokio::spawn(runner.run());

    let cell = Cell { coordinator, accounting, actuator, reset, runner, payloads, _camera: camera };
    // wait for the session banner so edges cannot race the initial arm
    wait_until(|| !cell.accounting.calls().is_empty()).await;
    cell
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn e2e_config() -> CellConfig {
    CellConfig::default()
        .trigger_lines(TriggerLines::One)
        .switch_settle_ms(50)
        .result_timeout_ms(2_000)
        .max_attempts(3)
}

#[tokio::test]
async fn single_line_pass_end_to_end() {
    let cell = start_cell(e2e_config(), vec![Some("RESULT:TRUE")]).await;

    cell.coordinator.on_edge(0);
    wait_until(|| cell.accounting.job_reports().len() == 1).await;

    let report = &cell.accounting.job_reports()[0];
    assert_eq!(report.job_number, 1);
    assert_eq!(report.attempts, 1);
    assert_eq!(report.outcome, JobOutcome::Pass);
    assert_eq!(cell.actuator.passes(), 1);

    // byte-exact command sequence on the wire
    assert_eq!(*cell.payloads.lock().unwrap(), vec!["set job 1", "trigger"]);

    // accounting saw (job 1, 1 attempt, pass, operator)
    let calls = cell.accounting.calls();
    assert!(matches!(
        &calls[1],
        AccountingCall::JobComplete { report, operator }
            if report.job_number == 1 && operator == "lena"
    ));

    cell.reset.cancel();
    assert!(matches!(cell.runner.await.unwrap(), SessionEnd::Reset));
}

#[tokio::test]
async fn failed_inspection_retries_and_passes() {
    let cell = start_cell(e2e_config(), vec![Some("RESULT:FALSE"), Some("TRUE")]).await;

    cell.coordinator.on_edge(0);
    wait_until(|| cell.accounting.job_reports().len() == 1).await;

    let report = &cell.accounting.job_reports()[0];
    assert_eq!(report.attempts, 2);
    assert_eq!(report.outcome, JobOutcome::Pass);
    assert_eq!(
        *cell.payloads.lock().unwrap(),
        vec!["set job 1", "trigger", "set job 1", "trigger"],
        "each attempt re-issues switch+trigger"
    );

    cell.reset.cancel();
    cell.runner.await.unwrap();
}

#[tokio::test]
async fn silent_camera_exhausts_the_retry_bound() {
    let mut config = e2e_config();
    config.result_timeout_ms = 100;
    let cell = start_cell(config, vec![None, None, None]).await;

    cell.coordinator.on_edge(0);
    wait_until(|| cell.accounting.job_reports().len() == 1).await;

    let report = &cell.accounting.job_reports()[0];
    assert_eq!(report.attempts, 3);
    assert_eq!(report.outcome, JobOutcome::Exhausted);
    assert_eq!(cell.payloads.lock().unwrap().len(), 6, "exactly 3 switch+trigger rounds");
    assert_eq!(cell.actuator.fails(), 1);

    cell.reset.cancel();
    cell.runner.await.unwrap();
}

#[tokio::test]
async fn reset_during_capture_is_observed_within_a_polling_interval() {
    // a long timeout the reset must never wait out
    let mut config = e2e_config();
    config.result_timeout_ms = 5_000;
    let cell = start_cell(config, vec![None]).await;

    cell.coordinator.on_edge(0);
    wait_until(|| cell.payloads.lock().unwrap().iter().any(|p| p == "trigger")).await;

    let pressed = Instant::now();
    cell.reset.cancel();
    let end = cell.runner.await.unwrap();
    assert!(matches!(end, SessionEnd::Reset));
    assert!(
        pressed.elapsed() < Duration::from_secs(1),
        "reset must not wait out the {}s result timeout",
        5
    );
    assert_eq!(cell.accounting.job_reports()[0].outcome, JobOutcome::Aborted);
}
