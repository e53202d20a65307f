// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

async fn wait_for_content(path: &std::path::Path, expected: &str) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if std::fs::read_to_string(path).map(|s| s == expected).unwrap_or(false) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{} never became {expected:?}", path.display()));
}

#[tokio::test]
async fn pass_pulse_turns_the_led_on_then_off() {
    let dir = tempfile::tempdir().unwrap();
    let led = dir.path().join("pass_led");
    std::fs::write(&led, "0").unwrap();

    let actuator = LedActuator::new(Some(led.clone()), None, Duration::from_millis(200));
    actuator.on_pass().await;

    wait_for_content(&led, "1").await;
    wait_for_content(&led, "0").await;
}

#[tokio::test]
async fn fail_pulse_uses_the_fail_path() {
    let dir = tempfile::tempdir().unwrap();
    let led = dir.path().join("fail_led");
    std::fs::write(&led, "0").unwrap();

    let actuator = LedActuator::new(None, Some(led.clone()), Duration::from_millis(200));
    actuator.on_fail().await;

    wait_for_content(&led, "1").await;
    wait_for_content(&led, "0").await;
}

#[tokio::test]
async fn unconfigured_actuator_is_a_no_op() {
    let actuator = LedActuator::new(None, None, Duration::from_millis(10));
    // must return immediately and not panic
    actuator.on_pass().await;
    actuator.on_fail().await;
}

#[tokio::test]
async fn on_pass_returns_before_the_pulse_completes() {
    let dir = tempfile::tempdir().unwrap();
    let led = dir.path().join("pass_led");
    std::fs::write(&led, "0").unwrap();

    let actuator = LedActuator::new(Some(led.clone()), None, Duration::from_secs(5));
    let start = std::time::Instant::now();
    actuator.on_pass().await;
    assert!(start.elapsed() < Duration::from_secs(1), "pulse must not block the caller");
}
