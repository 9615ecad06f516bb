// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator: registers workers, assigns identifiers, and runs the 10 s
//! heartbeat-monitor loop that restarts any worker that goes stale (§4.7).

use crate::worker::Worker;
use atm_core::{Clock, WorkerId, WorkerKind, WorkerRecord, WorkerStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub const MONITOR_INTERVAL: Duration = Duration::from_secs(10);
pub const STALE_AFTER_SECS: i64 = 60;

struct Registration {
    worker: Arc<dyn Worker>,
    record: WorkerRecord,
}

pub struct Coordinator<C> {
    clock: C,
    workers: Arc<Mutex<HashMap<WorkerId, Registration>>>,
    running: Arc<AtomicBool>,
    notify: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Clock> Coordinator<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            workers: Arc::new(Mutex::new(HashMap::new())),
            running: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
            task: Mutex::new(None),
        }
    }

    /// Registers a worker, assigns it an id, and starts it.
    pub async fn register(&self, id: WorkerId, kind: WorkerKind, worker: Arc<dyn Worker>) {
        worker.start().await;
        let now = self.clock.now_secs();
        let mut record = WorkerRecord::new(id.clone(), kind, now);
        record.status = WorkerStatus::Running;
        self.workers.lock().insert(id, Registration { worker, record });
    }

    /// Removes a worker and its status record, stopping it first.
    pub async fn unregister(&self, id: &WorkerId) {
        let registration = self.workers.lock().remove(id);
        if let Some(registration) = registration {
            registration.worker.stop().await;
        }
    }

    pub fn status(&self, id: &WorkerId) -> Option<WorkerRecord> {
        self.workers.lock().get(id).map(|r| r.record.clone())
    }

    pub fn all_statuses(&self) -> Vec<WorkerRecord> {
        self.workers.lock().values().map(|r| r.record.clone()).collect()
    }

    pub fn worker(&self, id: &WorkerId) -> Option<Arc<dyn Worker>> {
        self.workers.lock().get(id).map(|r| r.worker.clone())
    }

    /// First registered worker of the given kind, used by the HTTP façade to
    /// route `/api/env/*` and `/api/reward/*` requests without callers having
    /// to know worker ids up front.
    pub fn first_of_kind(&self, kind: WorkerKind) -> Option<(WorkerId, Arc<dyn Worker>)> {
        self.workers
            .lock()
            .iter()
            .find(|(_, r)| r.record.kind == kind)
            .map(|(id, r)| (id.clone(), r.worker.clone()))
    }

    /// Polls every registered worker's heartbeat once, restarting any that
    /// are stale (`status == Error` or silent past [`STALE_AFTER_SECS`]).
    pub async fn monitor_once(&self) {
        let now = self.clock.now_secs();
        let snapshot: Vec<(WorkerId, Arc<dyn Worker>)> =
            self.workers.lock().iter().map(|(id, r)| (id.clone(), r.worker.clone())).collect();

        for (id, worker) in snapshot {
            let hb = worker.heartbeat().await;
            let mut workers = self.workers.lock();
            let Some(registration) = workers.get_mut(&id) else {
                continue;
            };
            registration.record.status = hb.status;
            registration.record.last_heartbeat_ts = hb.last_heartbeat_ts;
            registration.record.resources = hb.resources;
            let stale = registration.record.is_stale(now, STALE_AFTER_SECS);
            drop(workers);

            if stale {
                tracing::warn!(worker_id = %id.as_str(), "worker stale, restarting");
                worker.stop().await;
                worker.start().await;
                if let Some(registration) = self.workers.lock().get_mut(&id) {
                    registration.record.status = WorkerStatus::Running;
                    registration.record.last_heartbeat_ts = self.clock.now_secs();
                }
            }
        }
    }

    /// Starts the background monitor loop (idempotent).
    pub fn start_monitor(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let this = self.clone();
        let running = self.running.clone();
        let notify = self.notify.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(MONITOR_INTERVAL) => {}
                    _ = notify.notified() => break,
                }
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                this.monitor_once().await;
            }
        });
        *self.task.lock() = Some(handle);
    }

    pub async fn stop_monitor(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.notify.notify_one();
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
