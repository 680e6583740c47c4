// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[tokio::test]
async fn command_output_is_captured() {
    let mut cmd = Command::new("echo");
    cmd.arg("hello");
    let output = run_with_timeout(cmd, Duration::from_secs(5), "echo")
        .await
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
}

#[tokio::test]
async fn timeout_produces_descriptive_error() {
    let mut cmd = Command::new("sleep");
    cmd.arg("5");
    let err = run_with_timeout(cmd, Duration::from_millis(50), "sleep test")
        .await
        .unwrap_err();
    assert!(err.contains("sleep test timed out"), "got: {err}");
}

#[tokio::test]
async fn missing_binary_reports_failure() {
    let cmd = Command::new("definitely-not-a-real-binary-4242");
    let err = run_with_timeout(cmd, Duration::from_secs(1), "ghost")
        .await
        .unwrap_err();
    assert!(err.contains("ghost failed"), "got: {err}");
}
