// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker identity and the status record the Coordinator keeps per worker.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier assigned to a worker at registration time.
    pub struct WorkerId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Idle,
    Running,
    Stopped,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    Environment,
    Reward,
    Proxy,
}

impl WorkerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerKind::Environment => "environment",
            WorkerKind::Reward => "reward",
            WorkerKind::Proxy => "proxy",
        }
    }
}

/// Coordinator-side bookkeeping record for one registered worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id: WorkerId,
    pub kind: WorkerKind,
    pub status: WorkerStatus,
    pub last_heartbeat_ts: i64,
    pub resources: serde_json::Map<String, serde_json::Value>,
}

impl WorkerRecord {
    pub fn new(id: WorkerId, kind: WorkerKind, now_secs: i64) -> Self {
        Self {
            id,
            kind,
            status: WorkerStatus::Idle,
            last_heartbeat_ts: now_secs,
            resources: serde_json::Map::new(),
        }
    }

    pub fn is_stale(&self, now_secs: i64, max_silence_secs: i64) -> bool {
        self.status == WorkerStatus::Error || now_secs - self.last_heartbeat_ts > max_silence_secs
    }
}
