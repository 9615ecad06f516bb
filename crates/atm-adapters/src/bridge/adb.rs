// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `adb`-backed device bridge.

use super::{BridgeError, DeviceBridge, DeviceEntry, ExecBytesOutput, ExecOutput, DEFAULT_EXEC_TIMEOUT};
use crate::subprocess::run_with_timeout;
use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

/// Real device-bridge adapter, shelling out to an `adb`-compatible CLI.
#[derive(Debug, Clone)]
pub struct AdbBridge {
    adb_path: String,
}

impl AdbBridge {
    pub fn new(adb_path: impl Into<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
        }
    }

    fn command(&self, device_id: Option<&str>, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.adb_path);
        if let Some(id) = device_id {
            cmd.args(["-s", id]);
        }
        cmd.args(args);
        cmd
    }
}

impl Default for AdbBridge {
    fn default() -> Self {
        Self::new("adb")
    }
}

#[async_trait]
impl DeviceBridge for AdbBridge {
    async fn ensure_bridge_server(&self) -> Result<(), BridgeError> {
        let mut cmd = Command::new(&self.adb_path);
        cmd.args(["start-server"]);
        let output = run_with_timeout(cmd, DEFAULT_EXEC_TIMEOUT, "adb start-server")
            .await
            .map_err(BridgeError::BridgeUnavailable)?;
        if !output.status.success() {
            return Err(BridgeError::BridgeUnavailable(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        Ok(())
    }

    async fn exec(
        &self,
        device_id: Option<&str>,
        args: &[&str],
        timeout: Option<Duration>,
        check: bool,
    ) -> Result<ExecOutput, BridgeError> {
        let cmd = self.command(device_id, args);
        let output = run_with_timeout(cmd, timeout.unwrap_or(DEFAULT_EXEC_TIMEOUT), "adb exec")
            .await
            .map_err(|_| BridgeError::TimedOut(timeout.unwrap_or(DEFAULT_EXEC_TIMEOUT)))?;

        let exit_code = output.status.code().unwrap_or(-1);
        if check && !output.status.success() {
            return Err(BridgeError::CommandFailed {
                exit_code,
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code,
        })
    }

    async fn exec_bytes(
        &self,
        device_id: Option<&str>,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<ExecBytesOutput, BridgeError> {
        let cmd = self.command(device_id, args);
        let output = run_with_timeout(cmd, timeout.unwrap_or(DEFAULT_EXEC_TIMEOUT), "adb exec_bytes")
            .await
            .map_err(|_| BridgeError::TimedOut(timeout.unwrap_or(DEFAULT_EXEC_TIMEOUT)))?;

        Ok(ExecBytesOutput {
            stdout: output.stdout,
            exit_code: output.status.code().unwrap_or(-1),
        })
    }

    async fn list_devices(&self) -> Result<Vec<DeviceEntry>, BridgeError> {
        let output = self.exec(None, &["devices"], None, false).await?;
        Ok(parse_devices(&output.stdout))
    }
}

/// Parses `adb devices` output, skipping the `List of devices attached` header
/// and blank lines.
fn parse_devices(raw: &str) -> Vec<DeviceEntry> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with("List of devices") {
                return None;
            }
            let mut parts = line.split_whitespace();
            let device_id = parts.next()?.to_string();
            let state = parts.next()?.to_string();
            Some(DeviceEntry { device_id, state })
        })
        .collect()
}

#[cfg(test)]
#[path = "adb_tests.rs"]
mod tests;
