// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment Worker: wraps a [`TrajectoryManager`] and runs the idle-sweep
//! background loop (§4.7). Idle state comes straight off TM's binding table
//! via `idle_trajectories` rather than a worker-local bookkeeping map —
//! TM is the single source of truth for `last_action_at` (see DESIGN.md).

use crate::heartbeat::{Heartbeat, HeartbeatState};
use crate::worker::{error_response, require_str, Worker};
use async_trait::async_trait;
use atm_core::{Clock, IdGen, WorkerKind};
use atm_engine::{ActionInput, EmulatorLauncher, EngineError, TrajectoryManager};
use atm_adapters::DeviceBridge;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub const DEFAULT_MAX_IDLE_SECS: i64 = 3600;
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub struct EnvironmentWorker<B, L, C, G> {
    tm: Arc<TrajectoryManager<B, L, C, G>>,
    clock: C,
    max_idle_secs: Arc<AtomicI64>,
    sweep_interval: Duration,
    heartbeat: Arc<HeartbeatState>,
    running: Arc<AtomicBool>,
    notify: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<B, L, C, G> EnvironmentWorker<B, L, C, G>
where
    B: DeviceBridge,
    L: EmulatorLauncher,
    C: Clock,
    G: IdGen,
{
    pub fn new(tm: Arc<TrajectoryManager<B, L, C, G>>, clock: C) -> Self {
        Self::with_config(tm, clock, DEFAULT_MAX_IDLE_SECS, DEFAULT_SWEEP_INTERVAL)
    }

    pub fn with_config(tm: Arc<TrajectoryManager<B, L, C, G>>, clock: C, max_idle_secs: i64, sweep_interval: Duration) -> Self {
        let now = clock.now_secs();
        Self {
            tm,
            clock,
            max_idle_secs: Arc::new(AtomicI64::new(max_idle_secs)),
            sweep_interval,
            heartbeat: Arc::new(HeartbeatState::new(now)),
            running: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
            task: Mutex::new(None),
        }
    }

}

#[async_trait]
impl<B, L, C, G> Worker for EnvironmentWorker<B, L, C, G>
where
    B: DeviceBridge + 'static,
    L: EmulatorLauncher + 'static,
    C: Clock,
    G: IdGen + 'static,
{
    fn kind(&self) -> WorkerKind {
        WorkerKind::Environment
    }

    async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.heartbeat.mark_running(self.clock.now_secs());

        let tm = self.tm.clone();
        let heartbeat = self.heartbeat.clone();
        let running = self.running.clone();
        let notify = self.notify.clone();
        let max_idle_secs = self.max_idle_secs.clone();
        let clock = self.clock.clone();
        let interval = self.sweep_interval;

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = notify.notified() => break,
                }
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let idle_secs = max_idle_secs.load(Ordering::SeqCst);
                for trajectory_id in tm.idle_trajectories(idle_secs) {
                    if let Err(err) = tm.remove(&trajectory_id).await {
                        tracing::warn!(trajectory_id = %trajectory_id, error = %err, "failed to clean up idle trajectory");
                    }
                }
                heartbeat.record_tick(clock.now_secs());
            }
        });
        *self.task.lock() = Some(handle);
    }

    async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.notify.notify_one();
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.heartbeat.mark_stopped(self.clock.now_secs());
    }

    async fn heartbeat(&self) -> Heartbeat {
        self.heartbeat.set_resources(
            json!({ "active_trajectories": self.tm.trajectory_count() })
                .as_object()
                .cloned()
                .unwrap_or_default(),
        );
        self.heartbeat.snapshot()
    }

    fn update_config(&self, delta: Value) {
        if let Some(max_idle_time) = delta.get("max_idle_time").and_then(Value::as_i64) {
            self.max_idle_secs.store(max_idle_time, Ordering::SeqCst);
        }
    }

    async fn handle_request(&self, request: Value) -> Value {
        let action = match request.get("action").and_then(Value::as_str) {
            Some(a) => a,
            None => return error_response("Missing action"),
        };

        if action == "create" {
            return match self.tm.create().await {
                Ok(result) => json!({
                    "success": true,
                    "trajectory_id": result.trajectory_id.as_str(),
                    "device_id": result.device_id,
                }),
                Err(err) => engine_error_response(&err),
            };
        }

        let trajectory_id = match require_str(&request, "trajectory_id") {
            Ok(id) => id,
            Err(resp) => return resp,
        };

        match action {
            "save" => match self.tm.save(trajectory_id).await {
                Ok(()) => json!({ "success": true }),
                Err(err) => engine_error_response(&err),
            },
            "load" => match self.tm.load(trajectory_id).await {
                Ok(()) => json!({ "success": true }),
                Err(err) => engine_error_response(&err),
            },
            "step" => {
                let Some(command) = request.get("command").cloned() else {
                    return error_response("Missing command for step action");
                };
                match self.tm.step(trajectory_id, ActionInput::Json(command)).await {
                    Ok(observation) => {
                        let mut resp = serde_json::to_value(observation).unwrap_or_else(|_| json!({}));
                        if let Some(obj) = resp.as_object_mut() {
                            obj.insert("success".to_string(), json!(true));
                        }
                        resp
                    }
                    Err(err) => engine_error_response(&err),
                }
            }
            "remove" => match self.tm.remove(trajectory_id).await {
                Ok(()) => json!({ "success": true }),
                Err(err) => engine_error_response(&err),
            },
            other => error_response(format!("Unknown action: {other}")),
        }
    }
}

fn engine_error_response(err: &EngineError) -> Value {
    error_response(err.to_string())
}

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;
