// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port & Claim Allocator: hands out a `(console_port, bridge_port)` pair
//! not in use by any in-process binding, not present in the bridge's device
//! listing, and whose claim file can be created atomically.

use crate::error::EngineError;
use atm_adapters::DeviceBridge;
use atm_storage::{Claim, ClaimStore};
use parking_lot::Mutex;
use std::collections::HashSet;

/// Default number of ports scanned before giving up.
pub const DEFAULT_SCAN_LIMIT: u32 = 200;

pub struct Pca {
    claims: ClaimStore,
    base_port: u16,
    scan_limit: u32,
    // Serializes the scan-then-claim sequence across concurrent callers in
    // this process; the claim file itself is what serializes across processes.
    scan_lock: Mutex<()>,
}

pub struct Allocation {
    pub console_port: u16,
    pub bridge_port: u16,
    pub device_id: String,
    pub claim: Claim,
}

impl Pca {
    pub fn new(claims: ClaimStore, base_port: u16) -> Self {
        Self {
            claims,
            base_port,
            scan_limit: DEFAULT_SCAN_LIMIT,
            scan_lock: Mutex::new(()),
        }
    }

    pub fn with_scan_limit(mut self, limit: u32) -> Self {
        self.scan_limit = limit;
        self
    }

    /// Scans `base_port, base_port+2, …` for a free, unclaimed even port and
    /// atomically claims it. `in_process_ports` is the set of console ports
    /// already bound to a live trajectory in this process.
    pub async fn allocate(
        &self,
        bridge: &impl DeviceBridge,
        in_process_ports: &HashSet<u16>,
    ) -> Result<Allocation, EngineError> {
        let _guard = self.scan_lock.lock();

        let bridge_devices: HashSet<String> = bridge
            .list_devices()
            .await
            .map_err(EngineError::from)?
            .into_iter()
            .map(|d| d.device_id)
            .collect();

        let mut port = self.base_port;
        if port % 2 != 0 {
            port += 1;
        }

        for _ in 0..self.scan_limit {
            let device_id = format!("emulator-{}", port + 1);
            let already_used = in_process_ports.contains(&port) || bridge_devices.contains(&device_id);

            if !already_used {
                match self.claims.acquire(&device_id) {
                    Ok(claim) => {
                        return Ok(Allocation {
                            console_port: port,
                            bridge_port: port + 1,
                            device_id,
                            claim,
                        });
                    }
                    Err(_) => {
                        // Lost the race for this port's claim file; keep scanning.
                    }
                }
            }
            port += 2;
        }

        Err(EngineError::NoPortsAvailable)
    }

    /// Claims a specific, already-known device id (used by TM's attach-existing
    /// path, which does not scan — the candidate device is already chosen).
    pub fn claim_existing(&self, device_id: &str) -> Result<Claim, EngineError> {
        self.claims
            .acquire(device_id)
            .map_err(|_| EngineError::NoPortsAvailable)
    }

    pub fn release(&self, claim: &Claim) -> Result<(), EngineError> {
        self.claims
            .release(claim)
            .map_err(|e| EngineError::Internal(e.to_string()))
    }
}

#[cfg(test)]
#[path = "pca_tests.rs"]
mod tests;
