// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persists one `SnapshotMeta` JSON file per trajectory under a snapshot
//! directory, keyed by trajectory id.

use crate::atomic_write::{atomic_write, AtomicWriteError};
use atm_core::SnapshotMeta;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotStoreError {
    #[error(transparent)]
    Write(#[from] AtomicWriteError),
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse snapshot meta at {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
}

/// Filesystem-backed store for per-trajectory `SnapshotMeta` records.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, trajectory_id: &str) -> PathBuf {
        self.dir.join(format!("{trajectory_id}.json"))
    }

    /// Writes `meta` durably, replacing any existing record for the same id.
    pub fn save(&self, meta: &SnapshotMeta) -> Result<PathBuf, SnapshotStoreError> {
        let path = self.path_for(&meta.trajectory_id);
        let bytes = serde_json::to_vec_pretty(meta).expect("SnapshotMeta always serializes");
        atomic_write(&path, &bytes)?;
        Ok(path)
    }

    pub fn load(&self, trajectory_id: &str) -> Result<Option<SnapshotMeta>, SnapshotStoreError> {
        let path = self.path_for(trajectory_id);
        if !path.exists() {
            return Ok(None);
        }
        load_from(&path).map(Some)
    }

    pub fn exists(&self, trajectory_id: &str) -> bool {
        self.path_for(trajectory_id).exists()
    }

    /// Removes the record for `trajectory_id`; succeeds (no-op) if absent.
    pub fn remove(&self, trajectory_id: &str) -> Result<(), SnapshotStoreError> {
        let path = self.path_for(trajectory_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SnapshotStoreError::Read {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }
}

fn load_from(path: &Path) -> Result<SnapshotMeta, SnapshotStoreError> {
    let raw = std::fs::read_to_string(path).map_err(|e| SnapshotStoreError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&raw).map_err(|e| SnapshotStoreError::Parse {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
#[path = "snapshot_store_tests.rs"]
mod tests;
