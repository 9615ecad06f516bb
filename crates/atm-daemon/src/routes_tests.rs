// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use atm_core::{SystemClock, WorkerId, WorkerKind};
use atm_workers::{Coordinator, RewardWorker};
use http_body_util::BodyExt;
use std::sync::Arc;

async fn state_with_reward_worker() -> AppState {
    let coordinator = Arc::new(Coordinator::new(SystemClock));
    let reward: Arc<dyn Worker> = Arc::new(RewardWorker::new(SystemClock));
    coordinator
        .register(WorkerId::new("reward-0"), WorkerKind::Reward, reward)
        .await;
    AppState {
        coordinator,
        snapshot_dir: std::env::temp_dir(),
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn coordinator_status_reports_worker_count() {
    let state = state_with_reward_worker().await;
    let Json(body) = coordinator_status(State(state)).await;
    assert_eq!(body["worker_count"], json!(1));
}

#[tokio::test]
async fn coordinator_workers_lists_the_registered_worker() {
    let state = state_with_reward_worker().await;
    let Json(body) = coordinator_workers(State(state)).await;
    let workers = body["workers"].as_array().unwrap();
    assert_eq!(workers.len(), 1);
    assert_eq!(workers[0]["id"], json!("reward-0"));
    assert_eq!(workers[0]["kind"], json!("reward"));
}

#[tokio::test]
async fn worker_status_404s_for_unknown_id() {
    let state = state_with_reward_worker().await;
    let response = worker_status(State(state), Path("does-not-exist".to_string())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn worker_status_200s_for_known_id() {
    let state = state_with_reward_worker().await;
    let response = worker_status(State(state), Path("reward-0".to_string())).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn worker_start_stop_restart_404_for_unknown_id() {
    let state = state_with_reward_worker().await;
    assert_eq!(
        worker_start(State(state.clone()), Path("nope".to_string())).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        worker_stop(State(state.clone()), Path("nope".to_string())).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        worker_restart(State(state), Path("nope".to_string())).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn reward_calculate_returns_computed_reward() {
    let state = state_with_reward_worker().await;
    let body = json!({
        "reward_type": "efficiency",
        "trajectory_id": "t1",
        "trajectory_data": { "goal_reached": true, "actions": ["tap", "tap", "tap", "tap"] },
    });
    let response = reward_calculate(State(state), Json(body)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let parsed = body_json(response).await;
    assert_eq!(parsed["reward"], json!(0.25));
}

#[tokio::test]
async fn reward_calculate_400s_on_missing_field() {
    let state = state_with_reward_worker().await;
    let body = json!({ "reward_type": "efficiency" });
    let response = reward_calculate(State(state), Json(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reward_calculate_404s_without_a_registered_reward_worker() {
    let coordinator = Arc::new(Coordinator::new(SystemClock));
    let state = AppState {
        coordinator,
        snapshot_dir: std::env::temp_dir(),
    };
    let body = json!({
        "reward_type": "efficiency",
        "trajectory_id": "t1",
        "trajectory_data": {},
    });
    let response = reward_calculate(State(state), Json(body)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn env_step_404s_without_a_registered_environment_worker() {
    let state = state_with_reward_worker().await;
    let body = json!({ "trajectory_id": "t1", "command": "click 1 2" });
    let response = env_step(State(state), Json(body)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn env_actions_lists_the_known_action_kinds() {
    let Json(body) = env_actions().await;
    let actions = body["actions"].as_array().unwrap();
    assert!(actions.contains(&json!("click")));
    assert!(actions.contains(&json!("open_app")));
}
