// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use atm_adapters::{DeviceEntry, ExecOutput, FakeBridge};
use atm_core::{FakeClock, SequentialIdGen};
use atm_engine::{FakeEmulatorLauncher, Pca, TmConfig};
use atm_storage::{ClaimStore, SnapshotStore};
use serde_json::json;
use std::time::Duration;

fn ok(stdout: &str) -> Result<ExecOutput, atm_adapters::BridgeError> {
    Ok(ExecOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        exit_code: 0,
    })
}

fn harness() -> (
    EnvironmentWorker<FakeBridge, FakeEmulatorLauncher, FakeClock, SequentialIdGen>,
    FakeBridge,
    FakeClock,
    tempfile::TempDir,
    tempfile::TempDir,
) {
    let claim_dir = tempfile::tempdir().unwrap();
    let snapshot_dir = tempfile::tempdir().unwrap();
    let bridge = FakeBridge::new();
    let clock = FakeClock::new(1_000);
    let tm = Arc::new(TrajectoryManager::new(
        bridge.clone(),
        FakeEmulatorLauncher::default(),
        clock.clone(),
        SequentialIdGen::new("traj"),
        Pca::new(ClaimStore::new(claim_dir.path()), 5554),
        SnapshotStore::new(snapshot_dir.path()),
        TmConfig::default(),
    ));
    let worker = EnvironmentWorker::with_config(tm, clock.clone(), 10, Duration::from_millis(20));
    (worker, bridge, clock, claim_dir, snapshot_dir)
}

fn stub_boot(bridge: &FakeBridge, device_id: &str) {
    bridge.set_devices(vec![DeviceEntry { device_id: device_id.to_string(), state: "device".to_string() }]);
    bridge.on("shell getprop sys.boot_completed", ok("1\n"));
}

#[tokio::test]
async fn create_via_handle_request_returns_trajectory_id() {
    let (worker, bridge, _clock, _claims, _snaps) = harness();
    stub_boot(&bridge, "emulator-5555");

    let resp = worker.handle_request(json!({ "action": "create" })).await;
    assert_eq!(resp["success"], json!(true));
    assert_eq!(resp["device_id"], json!("emulator-5555"));
}

#[tokio::test]
async fn handle_request_missing_action_is_an_error() {
    let (worker, _bridge, _clock, _claims, _snaps) = harness();
    let resp = worker.handle_request(json!({})).await;
    assert_eq!(resp["success"], json!(false));
}

#[tokio::test]
async fn step_via_handle_request_requires_command() {
    let (worker, bridge, _clock, _claims, _snaps) = harness();
    stub_boot(&bridge, "emulator-5555");
    let created = worker.handle_request(json!({ "action": "create" })).await;
    let trajectory_id = created["trajectory_id"].as_str().unwrap().to_string();

    let resp = worker.handle_request(json!({ "action": "step", "trajectory_id": trajectory_id })).await;
    assert_eq!(resp["success"], json!(false));
}

#[tokio::test]
async fn step_via_handle_request_executes_action() {
    let (worker, bridge, _clock, _claims, _snaps) = harness();
    stub_boot(&bridge, "emulator-5555");
    let created = worker.handle_request(json!({ "action": "create" })).await;
    let trajectory_id = created["trajectory_id"].as_str().unwrap().to_string();

    let resp = worker
        .handle_request(json!({ "action": "step", "trajectory_id": trajectory_id, "command": "screenshot" }))
        .await;
    assert_eq!(resp["success"], json!(true));
    assert_eq!(resp["action"], json!("screenshot"));
}

#[tokio::test]
async fn unknown_action_is_rejected() {
    let (worker, _bridge, _clock, _claims, _snaps) = harness();
    let resp = worker.handle_request(json!({ "action": "bogus", "trajectory_id": "x" })).await;
    assert_eq!(resp["success"], json!(false));
}

#[tokio::test]
async fn heartbeat_reports_active_trajectory_count() {
    let (worker, bridge, _clock, _claims, _snaps) = harness();
    stub_boot(&bridge, "emulator-5555");
    worker.handle_request(json!({ "action": "create" })).await;

    let hb = worker.heartbeat().await;
    assert_eq!(hb.resources.get("active_trajectories"), Some(&json!(1)));
}

#[tokio::test]
async fn update_config_changes_max_idle_secs() {
    let (worker, _bridge, _clock, _claims, _snaps) = harness();
    worker.update_config(json!({ "max_idle_time": 42 }));
    assert_eq!(worker.max_idle_secs.load(std::sync::atomic::Ordering::SeqCst), 42);
}

#[tokio::test]
async fn start_then_stop_is_idempotent_and_marks_status() {
    let (worker, _bridge, _clock, _claims, _snaps) = harness();
    worker.start().await;
    worker.start().await; // no-op, already running
    assert_eq!(worker.heartbeat().await.status, atm_core::WorkerStatus::Running);

    worker.stop().await;
    worker.stop().await; // no-op, already stopped
    assert_eq!(worker.heartbeat().await.status, atm_core::WorkerStatus::Stopped);
}

#[tokio::test]
async fn background_sweep_removes_idle_trajectories() {
    let (worker, bridge, clock, _claims, _snaps) = harness();
    stub_boot(&bridge, "emulator-5555");
    worker.handle_request(json!({ "action": "create" })).await;
    bridge.on("emu kill", ok(""));

    clock.advance(20); // past the 10s idle threshold configured in harness()
    worker.start().await;
    tokio::time::sleep(Duration::from_millis(80)).await;
    worker.stop().await;

    assert_eq!(worker.tm.trajectory_count(), 0);
}
