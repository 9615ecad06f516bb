// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reward Worker: computes and caches trajectory rewards (§4.7.1). The
//! reward functions themselves are the straightforward original rule set —
//! out of scope for correctness-critical engineering, carried over as-is.
//! Deliberately excludes the original's ad-hoc `execute_adb` action, which
//! sits outside this worker's documented contract.

use crate::heartbeat::{Heartbeat, HeartbeatState};
use crate::worker::{error_response, require_str, Worker};
use async_trait::async_trait;
use atm_core::{Clock, WorkerKind};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

pub const CACHE_MAX_AGE_SECS: i64 = 3600;
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

struct CacheEntry {
    result: Value,
    cached_at: i64,
}

pub struct RewardWorker<C> {
    clock: C,
    cache: Arc<Mutex<HashMap<String, CacheEntry>>>,
    heartbeat: Arc<HeartbeatState>,
    running: Arc<AtomicBool>,
    notify: Arc<Notify>,
    task: Mutex<Option<JoinHandle<()>>>,
    sweep_interval: Duration,
}

impl<C: Clock> RewardWorker<C> {
    pub fn new(clock: C) -> Self {
        Self::with_sweep_interval(clock, DEFAULT_SWEEP_INTERVAL)
    }

    pub fn with_sweep_interval(clock: C, sweep_interval: Duration) -> Self {
        let now = clock.now_secs();
        Self {
            clock,
            cache: Arc::new(Mutex::new(HashMap::new())),
            heartbeat: Arc::new(HeartbeatState::new(now)),
            running: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
            task: Mutex::new(None),
            sweep_interval,
        }
    }

    fn cache_key(trajectory_id: &str, reward_type: &str) -> String {
        format!("{trajectory_id}:{reward_type}")
    }

    fn evict_stale(&self, now: i64) {
        self.cache.lock().retain(|_, entry| now - entry.cached_at <= CACHE_MAX_AGE_SECS);
    }

    fn compute(&self, reward_type: &str, trajectory_data: &Value) -> Option<Value> {
        match reward_type {
            "task_completion" => Some(reward_task_completion(trajectory_data)),
            "efficiency" => Some(reward_efficiency(trajectory_data)),
            "rule_based" => Some(reward_rule_based(trajectory_data)),
            _ => None,
        }
    }
}

#[async_trait]
impl<C: Clock> Worker for RewardWorker<C> {
    fn kind(&self) -> WorkerKind {
        WorkerKind::Reward
    }

    async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        self.heartbeat.mark_running(self.clock.now_secs());

        let heartbeat = self.heartbeat.clone();
        let running = self.running.clone();
        let notify = self.notify.clone();
        let clock = self.clock.clone();
        let cache = self.cache.clone();
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
                let now = clock.now_secs();
                cache.lock().retain(|_, entry| now - entry.cached_at <= CACHE_MAX_AGE_SECS);
                heartbeat.record_tick(now);
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
        self.evict_stale(self.clock.now_secs());
        self.heartbeat
            .set_resources(json!({ "cached_entries": self.cache.lock().len() }).as_object().cloned().unwrap_or_default());
        self.heartbeat.snapshot()
    }

    fn update_config(&self, _delta: Value) {
        // No tunable configuration for the Reward Worker today.
    }

    async fn handle_request(&self, request: Value) -> Value {
        let action = match request.get("action").and_then(Value::as_str) {
            Some(a) => a,
            None => return error_response("Missing action"),
        };

        match action {
            "calculate_reward" => {
                let reward_type = match require_str(&request, "reward_type") {
                    Ok(v) => v.to_string(),
                    Err(resp) => return resp,
                };
                let trajectory_id = match require_str(&request, "trajectory_id") {
                    Ok(v) => v.to_string(),
                    Err(resp) => return resp,
                };
                let trajectory_data = request.get("trajectory_data").cloned().unwrap_or(json!({}));

                let key = Self::cache_key(&trajectory_id, &reward_type);
                if let Some(entry) = self.cache.lock().get(&key) {
                    return entry.result.clone();
                }

                let Some(computed) = self.compute(&reward_type, &trajectory_data) else {
                    return error_response("unknown reward type");
                };

                self.cache.lock().insert(
                    key,
                    CacheEntry {
                        result: computed.clone(),
                        cached_at: self.clock.now_secs(),
                    },
                );
                computed
            }
            "clear_cache" => {
                let trajectory_id = request.get("trajectory_id").and_then(Value::as_str);
                let mut cache = self.cache.lock();
                let before = cache.len();
                match trajectory_id {
                    Some(id) => {
                        let prefix = format!("{id}:");
                        cache.retain(|key, _| !key.starts_with(&prefix));
                    }
                    None => cache.clear(),
                }
                let cleared = before - cache.len();
                json!({ "success": true, "cleared_entries": cleared })
            }
            other => error_response(format!("Unknown action: {other}")),
        }
    }
}

fn reward_task_completion(trajectory_data: &Value) -> Value {
    let goal = trajectory_data.get("goal").and_then(Value::as_object);
    let final_state = trajectory_data.get("final_state").and_then(Value::as_object);

    let task_completed = match (goal, final_state) {
        (Some(goal), Some(final_state)) => goal.iter().all(|(k, v)| final_state.get(k) == Some(v)),
        _ => false,
    };

    json!({
        "success": true,
        "reward": if task_completed { 1.0 } else { 0.0 },
        "details": { "task_completed": task_completed },
    })
}

fn reward_efficiency(trajectory_data: &Value) -> Value {
    let goal_reached = trajectory_data.get("goal_reached").and_then(Value::as_bool).unwrap_or(false);
    let num_actions = trajectory_data
        .get("actions")
        .and_then(Value::as_array)
        .map(|actions| actions.len() as u64)
        .unwrap_or(0);

    let reward = if !goal_reached {
        -0.1
    } else if num_actions == 0 {
        0.0
    } else {
        1.0 / num_actions.max(1) as f64
    };

    json!({
        "success": true,
        "reward": reward,
        "details": { "num_actions": num_actions, "goal_reached": goal_reached },
    })
}

fn reward_rule_based(trajectory_data: &Value) -> Value {
    let actions = trajectory_data.get("actions").and_then(Value::as_array).cloned().unwrap_or_default();
    let states = trajectory_data.get("states").and_then(Value::as_array).cloned().unwrap_or_default();

    let mut reward = -0.01 * actions.len() as f64;
    let mut details = serde_json::Map::new();

    let target_achieved = states.iter().any(|s| {
        s.get("target_element").is_some() && s.get("interaction").and_then(Value::as_str) == Some("click")
    });
    if target_achieved {
        reward += 0.5;
    }
    details.insert("target_achieved".to_string(), json!(target_achieved));

    let success = trajectory_data.get("success").and_then(Value::as_bool).unwrap_or(false);
    if success {
        reward += 1.0;
        details.insert("success_reward".to_string(), json!(1.0));
    }

    json!({ "success": true, "reward": reward, "details": Value::Object(details) })
}

#[cfg(test)]
#[path = "reward_tests.rs"]
mod tests;
