// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

async fn exec_any(bridge: &impl DeviceBridge, args: &[&str]) -> ExecOutput {
    bridge.exec(None, args, None, false).await.unwrap()
}

#[tokio::test]
async fn generic_callers_only_need_the_trait() {
    let bridge = FakeBridge::new();
    bridge.on("shell echo hi", Ok(ExecOutput {
        stdout: "hi\n".into(),
        stderr: String::new(),
        exit_code: 0,
    }));
    let out = exec_any(&bridge, &["shell", "echo", "hi"]).await;
    assert_eq!(out.stdout, "hi\n");
}

#[tokio::test]
async fn exec_bytes_defaults_to_empty_when_uncanned() {
    let bridge = FakeBridge::new();
    let out = bridge.exec_bytes(None, &["shell", "screencap", "-p"], None).await.unwrap();
    assert!(out.stdout.is_empty());
    assert_eq!(out.exit_code, 0);
}

#[test]
fn command_failed_message_includes_exit_code_and_stderr() {
    let err = BridgeError::CommandFailed {
        exit_code: 3,
        stderr: "permission denied".into(),
    };
    let message = err.to_string();
    assert!(message.contains('3'));
    assert!(message.contains("permission denied"));
}
