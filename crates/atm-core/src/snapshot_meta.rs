// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SnapshotMeta`: the JSON record persisted per trajectory at
//! `<snapshot_dir>/<trajectory_id>.json`. Atomic write/read lives in `atm-storage`;
//! this module only owns the shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub trajectory_id: String,
    pub device_id: String,
    pub port: u16,
    pub snapshot_name: String,
    pub timestamp: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_field_names_match_the_external_contract() {
        let meta = SnapshotMeta {
            trajectory_id: "t1".into(),
            device_id: "emulator-5554".into(),
            port: 5554,
            snapshot_name: "sandbox_t1".into(),
            timestamp: 1_700_000_000.0,
        };
        let json = serde_json::to_value(&meta).unwrap();
        for key in ["trajectory_id", "device_id", "port", "snapshot_name", "timestamp"] {
            assert!(json.get(key).is_some(), "missing field {key}");
        }
    }
}
