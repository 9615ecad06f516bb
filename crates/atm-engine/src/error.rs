// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds surfaced by the engine back to the HTTP façade.

use atm_adapters::BridgeError;
use atm_core::ActionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("device bridge unavailable: {0}")]
    BridgeUnavailable(String),
    #[error("no ports available after scanning the configured limit")]
    NoPortsAvailable,
    #[error("emulator boot timed out after {0:?}")]
    BootTimeout(std::time::Duration),
    #[error("unknown trajectory: {0}")]
    UnknownTrajectory(String),
    #[error("snapshot missing for trajectory: {0}")]
    SnapshotMissing(String),
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("command failed (exit {exit_code}): {stderr}")]
    CommandFailed { exit_code: i32, stderr: String },
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<BridgeError> for EngineError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::BridgeUnavailable(msg) => EngineError::BridgeUnavailable(msg),
            BridgeError::TimedOut(d) => EngineError::BootTimeout(d),
            BridgeError::CommandFailed { exit_code, stderr } => {
                EngineError::CommandFailed { exit_code, stderr }
            }
        }
    }
}

impl From<ActionError> for EngineError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Invalid(msg) => EngineError::InvalidAction(msg),
        }
    }
}
