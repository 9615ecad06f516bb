// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The HTTP façade (§6): one task per inbound request, each routed either to
//! the Coordinator directly or through to the worker it names.

use crate::state::AppState;
use atm_core::{WorkerId, WorkerKind};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use atm_workers::Worker;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/coordinator/status", get(coordinator_status))
        .route("/api/coordinator/workers", get(coordinator_workers))
        .route("/api/workers/:id/start", post(worker_start))
        .route("/api/workers/:id/stop", post(worker_stop))
        .route("/api/workers/:id/restart", post(worker_restart))
        .route("/api/workers/:id/config", put(worker_config))
        .route("/api/workers/:id/status", get(worker_status))
        .route("/api/env/create", post(env_create))
        .route("/api/env/save", post(env_save))
        .route("/api/env/load", post(env_load))
        .route("/api/env/step", post(env_step))
        .route("/api/env/remove", post(env_remove))
        .route("/api/env/actions", get(env_actions))
        .route("/api/reward/calculate", post(reward_calculate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "success": false, "error": message.into() }))).into_response()
}

async fn coordinator_status(State(state): State<AppState>) -> Json<Value> {
    let workers = state.coordinator.all_statuses();
    Json(json!({
        "status": "ok",
        "id": "coordinator",
        "worker_count": workers.len(),
    }))
}

async fn coordinator_workers(State(state): State<AppState>) -> Json<Value> {
    let workers: Vec<Value> = state
        .coordinator
        .all_statuses()
        .into_iter()
        .map(|record| {
            json!({
                "id": record.id.as_str(),
                "kind": record.kind.as_str(),
                "status": record.status,
                "last_heartbeat": record.last_heartbeat_ts,
            })
        })
        .collect();
    Json(json!({ "workers": workers }))
}

async fn worker_start(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(worker) = state.coordinator.worker(&WorkerId::new(id)) else {
        return error(StatusCode::NOT_FOUND, "unknown worker");
    };
    worker.start().await;
    Json(json!({ "success": true })).into_response()
}

async fn worker_stop(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(worker) = state.coordinator.worker(&WorkerId::new(id)) else {
        return error(StatusCode::NOT_FOUND, "unknown worker");
    };
    worker.stop().await;
    Json(json!({ "success": true })).into_response()
}

async fn worker_restart(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(worker) = state.coordinator.worker(&WorkerId::new(id)) else {
        return error(StatusCode::NOT_FOUND, "unknown worker");
    };
    worker.stop().await;
    worker.start().await;
    Json(json!({ "success": true })).into_response()
}

async fn worker_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(delta): Json<Value>,
) -> Response {
    let Some(worker) = state.coordinator.worker(&WorkerId::new(id)) else {
        return error(StatusCode::NOT_FOUND, "unknown worker");
    };
    worker.update_config(delta);
    Json(json!({ "success": true })).into_response()
}

async fn worker_status(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.coordinator.status(&WorkerId::new(id)) {
        Some(record) => Json(json!({
            "id": record.id.as_str(),
            "kind": record.kind.as_str(),
            "status": record.status,
            "last_heartbeat_ts": record.last_heartbeat_ts,
            "resources": record.resources,
        }))
        .into_response(),
        None => error(StatusCode::NOT_FOUND, "unknown worker"),
    }
}

fn require_field<'a>(body: &'a Value, field: &str) -> Result<&'a Value, Response> {
    body.get(field)
        .filter(|v| !v.is_null())
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, format!("missing required field: {field}")))
}

async fn env_worker(state: &AppState) -> Result<std::sync::Arc<dyn atm_workers::Worker>, Response> {
    state
        .coordinator
        .first_of_kind(WorkerKind::Environment)
        .map(|(_, worker)| worker)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "no environment worker registered"))
}

async fn reward_worker(state: &AppState) -> Result<std::sync::Arc<dyn atm_workers::Worker>, Response> {
    state
        .coordinator
        .first_of_kind(WorkerKind::Reward)
        .map(|(_, worker)| worker)
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "no reward worker registered"))
}

async fn env_create(State(state): State<AppState>) -> Response {
    let worker = match env_worker(&state).await {
        Ok(w) => w,
        Err(r) => return r,
    };
    Json(worker.handle_request(json!({ "action": "create" })).await).into_response()
}

async fn env_save(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let worker = match env_worker(&state).await {
        Ok(w) => w,
        Err(r) => return r,
    };
    let trajectory_id = match require_field(&body, "trajectory_id") {
        Ok(v) => v.clone(),
        Err(r) => return r,
    };
    let request = json!({ "action": "save", "trajectory_id": trajectory_id });
    let mut response = worker.handle_request(request).await;
    if response.get("success").and_then(Value::as_bool) == Some(true) {
        if let (Some(id), Some(obj)) = (trajectory_id.as_str(), response.as_object_mut()) {
            let path = state.snapshot_dir.join(format!("{id}.json"));
            obj.insert("snapshot_path".to_string(), json!(path.display().to_string()));
        }
    }
    Json(response).into_response()
}

async fn env_load(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let worker = match env_worker(&state).await {
        Ok(w) => w,
        Err(r) => return r,
    };
    let trajectory_id = match require_field(&body, "trajectory_id") {
        Ok(v) => v.clone(),
        Err(r) => return r,
    };
    let request = json!({ "action": "load", "trajectory_id": trajectory_id });
    Json(worker.handle_request(request).await).into_response()
}

async fn env_step(State(state): State<AppState>, Json(mut body): Json<Value>) -> Response {
    let worker = match env_worker(&state).await {
        Ok(w) => w,
        Err(r) => return r,
    };
    if require_field(&body, "trajectory_id").is_err() {
        return error(StatusCode::BAD_REQUEST, "missing required field: trajectory_id");
    }
    let command = body
        .as_object_mut()
        .and_then(|obj| obj.remove("command").or_else(|| obj.remove("action")));
    let Some(command) = command else {
        return error(StatusCode::BAD_REQUEST, "missing required field: command");
    };
    let trajectory_id = body.get("trajectory_id").cloned().unwrap_or(Value::Null);
    let request = json!({ "action": "step", "trajectory_id": trajectory_id, "command": command });
    Json(worker.handle_request(request).await).into_response()
}

async fn env_remove(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let worker = match env_worker(&state).await {
        Ok(w) => w,
        Err(r) => return r,
    };
    let trajectory_id = match require_field(&body, "trajectory_id") {
        Ok(v) => v.clone(),
        Err(r) => return r,
    };
    let request = json!({ "action": "remove", "trajectory_id": trajectory_id });
    Json(worker.handle_request(request).await).into_response()
}

async fn env_actions() -> Json<Value> {
    Json(json!({
        "success": true,
        "actions": [
            "click", "double_tap", "long_press", "input_text", "navigate_back",
            "navigate_home", "keyboard_enter", "scroll", "swipe", "swipe_raw",
            "open_app", "answer", "wait", "keycode", "screenshot",
        ],
    }))
}

async fn reward_calculate(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let worker = match reward_worker(&state).await {
        Ok(w) => w,
        Err(r) => return r,
    };
    for field in ["reward_type", "trajectory_id", "trajectory_data"] {
        if require_field(&body, field).is_err() {
            return error(StatusCode::BAD_REQUEST, format!("missing required field: {field}"));
        }
    }
    let mut request = body;
    if let Some(obj) = request.as_object_mut() {
        obj.insert("action".to_string(), json!("calculate_reward"));
    }
    Json(worker.handle_request(request).await).into_response()
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
