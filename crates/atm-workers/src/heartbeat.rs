// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared heartbeat bookkeeping for the worker implementations.
//!
//! `last_heartbeat_ts` only moves forward when a worker's own background
//! loop finishes an iteration, or on explicit `start`/`stop` — never as a
//! side effect of `heartbeat()` being polled. This is a deliberate deviation
//! from the original worker base class (see DESIGN.md): a heartbeat that
//! resets itself on every read would make the Coordinator's staleness check
//! vacuous.

use atm_core::WorkerStatus;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicI64, Ordering};

pub struct HeartbeatState {
    status: Mutex<WorkerStatus>,
    last_heartbeat_ts: AtomicI64,
    resources: Mutex<Map<String, Value>>,
}

impl HeartbeatState {
    pub fn new(now_secs: i64) -> Self {
        Self {
            status: Mutex::new(WorkerStatus::Idle),
            last_heartbeat_ts: AtomicI64::new(now_secs),
            resources: Mutex::new(Map::new()),
        }
    }

    pub fn mark_running(&self, now_secs: i64) {
        *self.status.lock() = WorkerStatus::Running;
        self.last_heartbeat_ts.store(now_secs, Ordering::SeqCst);
    }

    pub fn mark_stopped(&self, now_secs: i64) {
        *self.status.lock() = WorkerStatus::Stopped;
        self.last_heartbeat_ts.store(now_secs, Ordering::SeqCst);
    }

    pub fn mark_error(&self, now_secs: i64) {
        *self.status.lock() = WorkerStatus::Error;
        self.last_heartbeat_ts.store(now_secs, Ordering::SeqCst);
    }

    /// Records that one background-loop iteration completed. Status is left
    /// as-is (it stays `Running` for the duration of the loop).
    pub fn record_tick(&self, now_secs: i64) {
        self.last_heartbeat_ts.store(now_secs, Ordering::SeqCst);
    }

    pub fn set_resources(&self, resources: Map<String, Value>) {
        *self.resources.lock() = resources;
    }

    pub fn status(&self) -> WorkerStatus {
        *self.status.lock()
    }

    pub fn last_heartbeat_ts(&self) -> i64 {
        self.last_heartbeat_ts.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Heartbeat {
        Heartbeat {
            status: self.status(),
            resources: self.resources.lock().clone(),
            last_heartbeat_ts: self.last_heartbeat_ts(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Heartbeat {
    pub status: WorkerStatus,
    pub resources: Map<String, Value>,
    pub last_heartbeat_ts: i64,
}
