// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-process device claims: one `<device_id>.lock` file per claimed
//! device, created with exclusive-create semantics so two processes racing
//! for the same port can never both win.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("device {0} is already claimed")]
    AlreadyClaimed(String),
    #[error("I/O error on claim file {path}: {source}")]
    Io { path: String, source: std::io::Error },
}

/// A held claim on a device. Dropping it does NOT release the file — release
/// is explicit via `ClaimStore::release`, matching the spec's "only the
/// owning process may delete it" rule (an implicit drop-release would let an
/// unrelated panic silently free another task's claim).
#[derive(Debug, Clone)]
pub struct Claim {
    pub device_id: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ClaimStore {
    dir: PathBuf,
}

impl ClaimStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, device_id: &str) -> PathBuf {
        self.dir.join(format!("{device_id}.lock"))
    }

    /// Atomically creates the claim file for `device_id`, writing the
    /// current process's PID as its content. Fails with `AlreadyClaimed` if
    /// the file already exists.
    pub fn acquire(&self, device_id: &str) -> Result<Claim, ClaimError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ClaimError::Io {
            path: self.dir.display().to_string(),
            source: e,
        })?;
        let path = self.path_for(device_id);
        let pid = std::process::id();
        match std::fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                use std::io::Write;
                file.write_all(pid.to_string().as_bytes()).map_err(|e| ClaimError::Io {
                    path: path.display().to_string(),
                    source: e,
                })?;
                Ok(Claim {
                    device_id: device_id.to_string(),
                    path,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(ClaimError::AlreadyClaimed(device_id.to_string()))
            }
            Err(e) => Err(ClaimError::Io {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }

    pub fn is_claimed(&self, device_id: &str) -> bool {
        self.path_for(device_id).exists()
    }

    /// Releases a claim; succeeds (no-op) if the file is already gone.
    pub fn release(&self, claim: &Claim) -> Result<(), ClaimError> {
        match std::fs::remove_file(&claim.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClaimError::Io {
                path: claim.path.display().to_string(),
                source: e,
            }),
        }
    }
}

#[cfg(test)]
#[path = "claim_tests.rs"]
mod tests;
