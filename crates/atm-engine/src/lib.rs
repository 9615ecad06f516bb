// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! atm-engine: the emulator trajectory manager. Composes the Port & Claim
//! Allocator, Emulator Supervisor, Action Translator, and Observation
//! Builder behind the Trajectory Manager's single binding table.

pub mod at;
pub mod error;
pub mod es;
pub mod ob;
pub mod pca;
pub mod tm;

pub use at::{translate, ActionInput};
pub use error::EngineError;
pub use es::{EmulatorOptions, DEFAULT_BOOT_TIMEOUT};
pub use ob::ObResult;
pub use pca::{Allocation, Pca, DEFAULT_SCAN_LIMIT};
pub use tm::{CreateResult, EmulatorLauncher, EmulatorProcess, RealEmulatorLauncher, TmConfig, TrajectoryManager};

#[cfg(any(test, feature = "test-support"))]
pub use tm::{FakeEmulatorLauncher, FakeEmulatorProcess};
