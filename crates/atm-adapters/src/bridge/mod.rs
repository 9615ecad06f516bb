// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device Control Client: a thin wrapper over the external device-bridge CLI
//! (`adb`). Every call spawns a subprocess; buffering/binary-vs-text capture is
//! the implementer's choice per call site.

mod adb;

pub use adb::AdbBridge;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{BridgeCall, FakeBridge};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from device-bridge operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    #[error("device bridge CLI not available: {0}")]
    BridgeUnavailable(String),
    #[error("command failed (exit {exit_code}): {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },
    #[error("command timed out after {0:?}")]
    TimedOut(Duration),
}

/// Result of a bridge command invocation.
#[derive(Debug, Clone, Default)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// One `list_devices()` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceEntry {
    pub device_id: String,
    pub state: String,
}

/// Raw bytes result, used for screenshot capture which must not go through
/// lossy UTF-8 decoding.
#[derive(Debug, Clone, Default)]
pub struct ExecBytesOutput {
    pub stdout: Vec<u8>,
    pub exit_code: i32,
}

#[async_trait]
pub trait DeviceBridge: Clone + Send + Sync + 'static {
    /// Idempotent; called once at startup. Fails with `BridgeUnavailable` if
    /// the CLI cannot be located.
    async fn ensure_bridge_server(&self) -> Result<(), BridgeError>;

    /// Runs `args` against `device_id` (or host-wide if `None`), returning
    /// captured text output. Raises `CommandFailed` only when `check` is true
    /// and the exit code is non-zero.
    async fn exec(
        &self,
        device_id: Option<&str>,
        args: &[&str],
        timeout: Option<Duration>,
        check: bool,
    ) -> Result<ExecOutput, BridgeError>;

    /// Like `exec`, but captures stdout as raw bytes (for screenshots).
    async fn exec_bytes(
        &self,
        device_id: Option<&str>,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<ExecBytesOutput, BridgeError>;

    /// Parses the CLI's tabular device listing, ignoring header/blank lines.
    async fn list_devices(&self) -> Result<Vec<DeviceEntry>, BridgeError>;
}

/// Default per-call timeout when the caller does not supply one.
pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(15);

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
