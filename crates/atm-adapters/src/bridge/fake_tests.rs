// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn list_devices_returns_configured_entries() {
    let bridge = FakeBridge::new();
    bridge.set_devices(vec![DeviceEntry {
        device_id: "emulator-5554".into(),
        state: "device".into(),
    }]);
    let devices = bridge.list_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].device_id, "emulator-5554");
}

#[tokio::test]
async fn exec_records_calls() {
    let bridge = FakeBridge::new();
    bridge
        .exec(Some("emulator-5554"), &["shell", "input", "tap", "1", "2"], None, false)
        .await
        .unwrap();
    let calls = bridge.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].device_id.as_deref(), Some("emulator-5554"));
    assert_eq!(calls[0].args, vec!["shell", "input", "tap", "1", "2"]);
}

#[tokio::test]
async fn exec_returns_canned_response() {
    let bridge = FakeBridge::new();
    bridge.on(
        "shell getprop sys.boot_completed",
        Ok(ExecOutput {
            stdout: "1\n".into(),
            stderr: String::new(),
            exit_code: 0,
        }),
    );
    let out = bridge
        .exec(None, &["shell", "getprop", "sys.boot_completed"], None, false)
        .await
        .unwrap();
    assert_eq!(out.stdout.trim(), "1");
}

#[tokio::test]
async fn exec_check_true_surfaces_nonzero_exit() {
    let bridge = FakeBridge::new();
    bridge.on(
        "shell false",
        Ok(ExecOutput {
            stdout: String::new(),
            stderr: "boom".into(),
            exit_code: 1,
        }),
    );
    let result = bridge.exec(None, &["shell", "false"], None, true).await;
    assert!(matches!(result, Err(BridgeError::CommandFailed { exit_code: 1, .. })));
}

#[tokio::test]
async fn ensure_bridge_server_respects_availability_flag() {
    let bridge = FakeBridge::new();
    bridge.set_bridge_available(false);
    assert!(bridge.ensure_bridge_server().await.is_err());
}
