// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::heartbeat::Heartbeat;
use atm_core::{FakeClock, WorkerStatus};
use parking_lot::Mutex as PMutex;
use serde_json::{json, Value};

/// Minimal in-memory worker stand-in: reports whatever status/timestamp it
/// is told to via `set_next_heartbeat`, and counts start/stop calls.
struct StubWorker {
    kind: WorkerKind,
    next_status: PMutex<WorkerStatus>,
    next_ts: PMutex<i64>,
    starts: std::sync::atomic::AtomicU32,
    stops: std::sync::atomic::AtomicU32,
}

impl StubWorker {
    fn new(kind: WorkerKind, ts: i64) -> Self {
        Self {
            kind,
            next_status: PMutex::new(WorkerStatus::Running),
            next_ts: PMutex::new(ts),
            starts: std::sync::atomic::AtomicU32::new(0),
            stops: std::sync::atomic::AtomicU32::new(0),
        }
    }

    fn set_next_heartbeat(&self, status: WorkerStatus, ts: i64) {
        *self.next_status.lock() = status;
        *self.next_ts.lock() = ts;
    }

    fn starts(&self) -> u32 {
        self.starts.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Worker for StubWorker {
    fn kind(&self) -> WorkerKind {
        self.kind
    }

    async fn start(&self) {
        self.starts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        *self.next_status.lock() = WorkerStatus::Running;
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    async fn heartbeat(&self) -> Heartbeat {
        Heartbeat {
            status: *self.next_status.lock(),
            resources: serde_json::Map::new(),
            last_heartbeat_ts: *self.next_ts.lock(),
        }
    }

    fn update_config(&self, _delta: Value) {}

    async fn handle_request(&self, _request: Value) -> Value {
        json!({ "success": true })
    }
}

#[tokio::test]
async fn register_assigns_running_status() {
    let co = Coordinator::new(FakeClock::new(1_000));
    let worker: Arc<dyn Worker> = Arc::new(StubWorker::new(WorkerKind::Environment, 1_000));
    co.register(WorkerId::new("w1"), WorkerKind::Environment, worker).await;

    let record = co.status(&WorkerId::new("w1")).unwrap();
    assert_eq!(record.status, WorkerStatus::Running);
}

#[tokio::test]
async fn unregister_removes_the_status_record() {
    let co = Coordinator::new(FakeClock::new(1_000));
    let worker: Arc<dyn Worker> = Arc::new(StubWorker::new(WorkerKind::Reward, 1_000));
    co.register(WorkerId::new("w1"), WorkerKind::Reward, worker).await;
    co.unregister(&WorkerId::new("w1")).await;

    assert!(co.status(&WorkerId::new("w1")).is_none());
}

#[tokio::test]
async fn monitor_once_restarts_a_stale_worker() {
    let clock = FakeClock::new(1_000);
    let co = Coordinator::new(clock.clone());
    let stub = Arc::new(StubWorker::new(WorkerKind::Environment, 1_000));
    co.register(WorkerId::new("w1"), WorkerKind::Environment, stub.clone()).await;

    clock.advance(120); // past STALE_AFTER_SECS
    stub.set_next_heartbeat(WorkerStatus::Running, 1_000); // heartbeat never advanced
    co.monitor_once().await;

    assert_eq!(stub.starts(), 2); // once at register, once at restart
    let record = co.status(&WorkerId::new("w1")).unwrap();
    assert_eq!(record.status, WorkerStatus::Running);
}

#[tokio::test]
async fn first_of_kind_finds_the_registered_worker() {
    let co = Coordinator::new(FakeClock::new(1_000));
    let worker: Arc<dyn Worker> = Arc::new(StubWorker::new(WorkerKind::Reward, 1_000));
    co.register(WorkerId::new("w1"), WorkerKind::Reward, worker).await;

    let (id, _worker) = co.first_of_kind(WorkerKind::Reward).unwrap();
    assert_eq!(id, WorkerId::new("w1"));
    assert!(co.first_of_kind(WorkerKind::Proxy).is_none());
}

#[tokio::test]
async fn monitor_once_restarts_a_worker_reporting_error() {
    let clock = FakeClock::new(1_000);
    let co = Coordinator::new(clock.clone());
    let stub = Arc::new(StubWorker::new(WorkerKind::Reward, 1_000));
    co.register(WorkerId::new("w1"), WorkerKind::Reward, stub.clone()).await;

    stub.set_next_heartbeat(WorkerStatus::Error, 1_000);
    co.monitor_once().await;

    assert_eq!(stub.starts(), 2);
}

#[tokio::test]
async fn monitor_once_leaves_a_healthy_worker_alone() {
    let clock = FakeClock::new(1_000);
    let co = Coordinator::new(clock.clone());
    let stub = Arc::new(StubWorker::new(WorkerKind::Environment, 1_000));
    co.register(WorkerId::new("w1"), WorkerKind::Environment, stub.clone()).await;

    clock.advance(5);
    stub.set_next_heartbeat(WorkerStatus::Running, 1_005);
    co.monitor_once().await;

    assert_eq!(stub.starts(), 1); // only the initial start from register
}
