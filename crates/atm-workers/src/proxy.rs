// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proxy Worker: a thin wrapper around an external reverse-proxy daemon
//! (§4.7.2). The background loop is empty — the external process manages
//! itself, matching the reverse-proxy daemon it wraps. A missing proxy
//! binary is a normal, non-error startup outcome: the worker stays
//! registered with `status = stopped`.

use crate::heartbeat::{Heartbeat, HeartbeatState};
use crate::worker::{error_response, Worker};
use async_trait::async_trait;
use atm_adapters::{ProxyHandle, ProxyProcess};
use atm_core::{Clock, WorkerKind};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct ProxyWorker<P, C> {
    process: P,
    handle: ProxyHandle,
    clock: C,
    heartbeat: Arc<HeartbeatState>,
}

impl<P, C> ProxyWorker<P, C>
where
    P: ProxyProcess,
    C: Clock,
{
    pub fn new(process: P, handle: ProxyHandle, clock: C) -> Self {
        let now = clock.now_secs();
        Self {
            process,
            handle,
            clock,
            heartbeat: Arc::new(HeartbeatState::new(now)),
        }
    }
}

#[async_trait]
impl<P, C> Worker for ProxyWorker<P, C>
where
    P: ProxyProcess,
    C: Clock,
{
    fn kind(&self) -> WorkerKind {
        WorkerKind::Proxy
    }

    async fn start(&self) {
        let now = self.clock.now_secs();
        match self.process.start(&self.handle).await {
            Ok(()) => self.heartbeat.mark_running(now),
            Err(err) => {
                tracing::warn!(error = %err, "proxy did not start; worker stays registered as stopped");
                self.heartbeat.mark_stopped(now);
            }
        }
    }

    async fn stop(&self) {
        let now = self.clock.now_secs();
        if let Err(err) = self.process.stop(&self.handle).await {
            tracing::warn!(error = %err, "error stopping proxy process");
        }
        self.heartbeat.mark_stopped(now);
    }

    async fn heartbeat(&self) -> Heartbeat {
        let running = self.process.is_running(&self.handle).await;
        self.heartbeat.set_resources(
            json!({ "running": running, "listen_port": self.handle.listen_port })
                .as_object()
                .cloned()
                .unwrap_or_default(),
        );
        self.heartbeat.snapshot()
    }

    fn update_config(&self, _delta: Value) {
        // Proxy config changes go through an explicit `reload`, not
        // `update_config` — the handle's fields are fixed at construction.
    }

    async fn handle_request(&self, request: Value) -> Value {
        let action = match request.get("action").and_then(Value::as_str) {
            Some(a) => a,
            None => return error_response("Missing action"),
        };

        match action {
            "status" => {
                let running = self.process.is_running(&self.handle).await;
                json!({ "success": true, "running": running })
            }
            "reload" => match self.process.reload(&self.handle).await {
                Ok(()) => json!({ "success": true }),
                Err(err) => error_response(err.to_string()),
            },
            "restart" => {
                let _ = self.process.stop(&self.handle).await;
                match self.process.start(&self.handle).await {
                    Ok(()) => {
                        self.heartbeat.mark_running(self.clock.now_secs());
                        json!({ "success": true })
                    }
                    Err(err) => {
                        self.heartbeat.mark_stopped(self.clock.now_secs());
                        error_response(err.to_string())
                    }
                }
            }
            other => error_response(format!("Unknown action: {other}")),
        }
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
