// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-tmp/fsync/rename/fsync-dir: the durable-write sequence used for
//! every file this crate persists, so a crash never leaves a partially
//! written snapshot in place.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtomicWriteError {
    #[error("I/O error writing {path}: {source}")]
    Io { path: String, source: std::io::Error },
}

fn io_err(path: &Path, source: std::io::Error) -> AtomicWriteError {
    AtomicWriteError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Writes `data` to `path` atomically: write to a sibling `.tmp` file, fsync
/// it, rename over the destination, then fsync the containing directory so
/// the rename itself is durable.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AtomicWriteError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;

    let tmp_path = path.with_extension("tmp");
    {
        let mut tmp = File::create(&tmp_path).map_err(|e| io_err(&tmp_path, e))?;
        tmp.write_all(data).map_err(|e| io_err(&tmp_path, e))?;
        tmp.sync_all().map_err(|e| io_err(&tmp_path, e))?;
    }
    std::fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))?;

    let dir = File::open(parent).map_err(|e| io_err(parent, e))?;
    dir.sync_all().map_err(|e| io_err(parent, e))?;
    Ok(())
}

#[cfg(test)]
#[path = "atomic_write_tests.rs"]
mod tests;
