// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance lock: an exclusive `flock` on a PID file in the logging
//! directory, held for the process lifetime. Prevents two `atmd` processes
//! from racing over the same claim/snapshot directories.

use fs2::FileExt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to open lock file at {path}: {source}")]
    Open { path: String, source: std::io::Error },
    #[error("another atmd instance is already running (lock held at {0})")]
    AlreadyRunning(PathBuf),
}

/// Held for the process lifetime; the lock releases when this is dropped.
pub struct InstanceLock {
    _file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn acquire(log_dir: &Path) -> Result<Self, LockError> {
        std::fs::create_dir_all(log_dir).map_err(|source| LockError::Open {
            path: log_dir.display().to_string(),
            source,
        })?;
        let path = log_dir.join("atmd.pid");

        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.display().to_string(),
                source,
            })?;

        file.try_lock_exclusive().map_err(|_| LockError::AlreadyRunning(path.clone()))?;

        let mut file = file;
        let _ = file.set_len(0);
        let _ = writeln!(file, "{}", std::process::id());

        Ok(Self { _file: file, path })
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
