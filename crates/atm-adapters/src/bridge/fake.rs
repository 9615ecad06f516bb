// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic in-memory bridge for tests that exercise ES/PCA/AT/OB without
//! a real emulator or `adb` binary.

use super::{BridgeError, DeviceBridge, DeviceEntry, ExecBytesOutput, ExecOutput};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// One recorded call, for assertions in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeCall {
    pub device_id: Option<String>,
    pub args: Vec<String>,
}

#[derive(Default)]
struct Inner {
    devices: Vec<DeviceEntry>,
    /// Canned text responses keyed by the joined argument string.
    responses: HashMap<String, Result<ExecOutput, BridgeError>>,
    calls: Vec<BridgeCall>,
    bridge_available: bool,
}

/// Fake [`DeviceBridge`]. Clone shares state (like the real adapter sharing one
/// `adb` server process).
#[derive(Clone)]
pub struct FakeBridge {
    inner: Arc<Mutex<Inner>>,
}

impl Default for FakeBridge {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                bridge_available: true,
                ..Default::default()
            })),
        }
    }
}

impl FakeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_devices(&self, devices: Vec<DeviceEntry>) {
        self.inner.lock().devices = devices;
    }

    pub fn set_bridge_available(&self, available: bool) {
        self.inner.lock().bridge_available = available;
    }

    /// Registers a canned response for an exact `args.join(" ")` key.
    pub fn on(&self, args_key: &str, response: Result<ExecOutput, BridgeError>) {
        self.inner.lock().responses.insert(args_key.to_string(), response);
    }

    pub fn calls(&self) -> Vec<BridgeCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl DeviceBridge for FakeBridge {
    async fn ensure_bridge_server(&self) -> Result<(), BridgeError> {
        if self.inner.lock().bridge_available {
            Ok(())
        } else {
            Err(BridgeError::BridgeUnavailable("fake bridge disabled".into()))
        }
    }

    async fn exec(
        &self,
        device_id: Option<&str>,
        args: &[&str],
        _timeout: Option<Duration>,
        check: bool,
    ) -> Result<ExecOutput, BridgeError> {
        let key = args.join(" ");
        let mut guard = self.inner.lock();
        guard.calls.push(BridgeCall {
            device_id: device_id.map(str::to_string),
            args: args.iter().map(|s| s.to_string()).collect(),
        });
        let canned = guard.responses.get(&key).cloned();
        drop(guard);

        let output = canned.unwrap_or(Ok(ExecOutput::default()))?;
        if check && output.exit_code != 0 {
            return Err(BridgeError::CommandFailed {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    async fn exec_bytes(
        &self,
        device_id: Option<&str>,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<ExecBytesOutput, BridgeError> {
        let text = self.exec(device_id, args, timeout, false).await?;
        Ok(ExecBytesOutput {
            stdout: text.stdout.into_bytes(),
            exit_code: text.exit_code,
        })
    }

    async fn list_devices(&self) -> Result<Vec<DeviceEntry>, BridgeError> {
        Ok(self.inner.lock().devices.clone())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
