// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn meta(trajectory_id: &str) -> SnapshotMeta {
    SnapshotMeta {
        trajectory_id: trajectory_id.to_string(),
        device_id: "emulator-5554".to_string(),
        port: 5554,
        snapshot_name: "sandbox_abcd".to_string(),
        timestamp: 1_700_000_000.0,
    }
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    store.save(&meta("t1")).unwrap();

    let loaded = store.load("t1").unwrap().unwrap();
    assert_eq!(loaded.trajectory_id, "t1");
    assert_eq!(loaded.port, 5554);
}

#[test]
fn load_missing_returns_none() {
    let dir = tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    assert!(store.load("nope").unwrap().is_none());
}

#[test]
fn remove_is_idempotent() {
    let dir = tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    store.save(&meta("t1")).unwrap();
    store.remove("t1").unwrap();
    assert!(!store.exists("t1"));
    store.remove("t1").unwrap();
}

#[test]
fn save_overwrites_existing_record() {
    let dir = tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    store.save(&meta("t1")).unwrap();
    let mut updated = meta("t1");
    updated.port = 5556;
    store.save(&updated).unwrap();

    assert_eq!(store.load("t1").unwrap().unwrap().port, 5556);
}
