// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn writes_and_replaces_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("data.json");

    atomic_write(&path, b"{\"a\":1}").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\":1}");

    atomic_write(&path, b"{\"a\":2}").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"a\":2}");
}

#[test]
fn leaves_no_tmp_file_behind_on_success() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.json");
    atomic_write(&path, b"hello").unwrap();
    assert!(!path.with_extension("tmp").exists());
}
