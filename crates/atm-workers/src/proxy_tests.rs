// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use atm_adapters::FakeProxyProcess;
use atm_core::{FakeClock, WorkerStatus};
use serde_json::json;
use std::path::PathBuf;

fn handle() -> ProxyHandle {
    ProxyHandle {
        worker_id: "w1".to_string(),
        listen_port: 8080,
        target_host: "127.0.0.1".to_string(),
        target_port: 9000,
        work_dir: PathBuf::from("/tmp"),
    }
}

#[tokio::test]
async fn start_marks_running_when_binary_available() {
    let worker = ProxyWorker::new(FakeProxyProcess::new(), handle(), FakeClock::new(1_000));
    worker.start().await;
    assert_eq!(worker.heartbeat().await.status, WorkerStatus::Running);
}

#[tokio::test]
async fn start_marks_stopped_not_error_when_binary_missing() {
    let process = FakeProxyProcess::new();
    process.set_available(false);
    let worker = ProxyWorker::new(process, handle(), FakeClock::new(1_000));
    worker.start().await;
    assert_eq!(worker.heartbeat().await.status, WorkerStatus::Stopped);
}

#[tokio::test]
async fn status_request_reflects_running_state() {
    let worker = ProxyWorker::new(FakeProxyProcess::new(), handle(), FakeClock::new(1_000));
    worker.start().await;
    let resp = worker.handle_request(json!({ "action": "status" })).await;
    assert_eq!(resp["running"], json!(true));
}

#[tokio::test]
async fn reload_fails_when_not_running() {
    let worker = ProxyWorker::new(FakeProxyProcess::new(), handle(), FakeClock::new(1_000));
    let resp = worker.handle_request(json!({ "action": "reload" })).await;
    assert_eq!(resp["success"], json!(false));
}

#[tokio::test]
async fn restart_stops_then_starts() {
    let worker = ProxyWorker::new(FakeProxyProcess::new(), handle(), FakeClock::new(1_000));
    worker.start().await;
    let resp = worker.handle_request(json!({ "action": "restart" })).await;
    assert_eq!(resp["success"], json!(true));
    assert_eq!(worker.heartbeat().await.status, WorkerStatus::Running);
}

#[tokio::test]
async fn unknown_action_is_rejected() {
    let worker = ProxyWorker::new(FakeProxyProcess::new(), handle(), FakeClock::new(1_000));
    let resp = worker.handle_request(json!({ "action": "bogus" })).await;
    assert_eq!(resp["success"], json!(false));
}
