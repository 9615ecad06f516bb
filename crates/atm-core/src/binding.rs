// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `DeviceBinding`: the record TM owns for each live trajectory_id -> device pairing.

use crate::TrajectoryId;
use serde::{Deserialize, Serialize};

/// Status of a device binding. Transitions are driven exclusively by TM (see
/// `atm-engine::trajectory_manager`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingStatus {
    Starting,
    Running,
    Saved,
    Stopped,
    Error,
}

/// A trajectory's binding to a specific emulator instance.
///
/// `has_process_handle` stands in for an owned `tokio::process::Child`: a real
/// process handle cannot be `Clone`/`Serialize`, so the binding table stores this
/// flag (and the engine's live handle table stores the real handle keyed by the
/// same `device_id`) rather than embedding the handle directly. Adopted
/// (attach-existing) bindings have `has_process_handle = false` for their
/// lifetime, since TM never spawned their process and must not try to kill it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceBinding {
    pub trajectory_id: TrajectoryId,
    pub device_id: String,
    pub console_port: u16,
    pub bridge_port: u16,
    pub has_process_handle: bool,
    pub snapshot_name: String,
    pub status: BindingStatus,
    pub created_at_epoch_secs: i64,
    pub last_action_at_epoch_secs: Option<i64>,
}

impl DeviceBinding {
    pub fn touch(&mut self, now_secs: i64) {
        self.last_action_at_epoch_secs = Some(now_secs);
    }

    pub fn idle_secs(&self, now_secs: i64) -> Option<i64> {
        self.last_action_at_epoch_secs
            .map(|t| (now_secs - t).max(0))
    }
}

#[cfg(test)]
#[path = "binding_tests.rs"]
mod tests;
