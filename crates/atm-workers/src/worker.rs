// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Common worker contract: `start`/`stop`/`heartbeat`/`update_config`/
//! `handle_request`, the shape every worker (Environment, Reward, Proxy)
//! implements so the Coordinator can manage them uniformly.

use crate::heartbeat::Heartbeat;
use async_trait::async_trait;
use atm_core::WorkerKind;
use serde_json::Value;

#[async_trait]
pub trait Worker: Send + Sync {
    fn kind(&self) -> WorkerKind;

    /// Starts the worker's background loop (idempotent: calling twice while
    /// already running is a no-op).
    async fn start(&self);

    /// Stops the worker's background loop and waits for it to exit.
    async fn stop(&self);

    async fn heartbeat(&self) -> Heartbeat;

    /// Merges `delta` into the worker's live configuration.
    fn update_config(&self, delta: Value);

    async fn handle_request(&self, request: Value) -> Value;
}

pub(crate) fn error_response(message: impl Into<String>) -> Value {
    serde_json::json!({ "success": false, "error": message.into() })
}

pub(crate) fn require_str<'a>(request: &'a Value, field: &str) -> Result<&'a str, Value> {
    request
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| error_response(format!("missing required field: {field}")))
}
