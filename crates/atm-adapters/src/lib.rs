// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: the device bridge CLI, the reverse-proxy
//! daemon, and raw subprocess execution helpers.

pub mod bridge;
pub mod proxy_process;
pub mod subprocess;

pub use bridge::{AdbBridge, BridgeError, DeviceBridge, DeviceEntry, ExecBytesOutput, ExecOutput};
pub use proxy_process::{ProxyError, ProxyHandle, ProxyProcess, RealProxyProcess};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use bridge::{BridgeCall, FakeBridge};
#[cfg(any(test, feature = "test-support"))]
pub use proxy_process::FakeProxyProcess;
