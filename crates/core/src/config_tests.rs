// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn default_config_is_valid() {
    CellConfig::default().validate().expect("default must validate");
}

#[test]
fn from_toml_applies_overrides_over_defaults() {
    let config = CellConfig::from_toml(
        r#"
        camera_addr = "10.0.0.5:2300"
        trigger_lines = 1
        result_timeout_ms = 200
        max_attempts = 3
        on_exhausted = "advance"
        "#,
    )
    .expect("parse failed");

    assert_eq!(config.camera_addr, "10.0.0.5:2300");
    assert_eq!(config.trigger_lines, TriggerLines::One);
    assert_eq!(config.result_timeout(), Duration::from_millis(200));
    assert_eq!(config.max_attempts, 3);
    assert_eq!(config.on_exhausted, ExhaustionPolicy::AdvanceJob);
    // untouched fields keep their defaults
    assert_eq!(config.cycle_size, 3);
    assert_eq!(config.pass_token, "true");
}

#[test]
fn trigger_lines_rejects_out_of_range() {
    let err = CellConfig::from_toml("trigger_lines = 3").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
}

#[parameterized(
    zero_attempts = { "max_attempts = 0" },
    zero_cycle = { "cycle_size = 0" },
    empty_pass = { "pass_token = \"\"" },
    empty_fail = { "fail_token = \" \"" },
    bad_addr_no_port = { "camera_addr = \"192.168.0.1\"" },
    bad_addr_port = { "camera_addr = \"cam:notaport\"" },
)]
fn from_toml_rejects_invalid(fragment: &str) {
    assert!(CellConfig::from_toml(fragment).is_err(), "accepted {fragment:?}");
}

#[test]
fn token_clash_is_rejected_case_insensitively() {
    let config = CellConfig::default().pass_token("OK").fail_token("ok");
    assert!(matches!(config.validate(), Err(ConfigError::TokenClash)));
}

#[test]
fn setters_chain() {
    let config = CellConfig::default()
        .camera_addr("127.0.0.1:9000")
        .max_attempts(2)
        .retry_backoff_ms(50);
    assert_eq!(config.camera_addr, "127.0.0.1:9000");
    assert_eq!(config.max_attempts, 2);
    assert_eq!(config.retry_backoff(), Duration::from_millis(50));
}

#[test]
fn exhaustion_policy_displays_config_names() {
    assert_eq!(ExhaustionPolicy::HoldJob.to_string(), "hold");
    assert_eq!(ExhaustionPolicy::AdvanceJob.to_string(), "advance");
}
