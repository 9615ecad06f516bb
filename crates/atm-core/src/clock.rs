// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wall-clock abstraction.
//!
//! Heartbeat staleness (worker restart), idle-trajectory sweeps, and reward-cache
//! eviction all compare "now" against a stored timestamp. Routing that comparison
//! through a trait lets tests advance time deterministically instead of sleeping.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time, in epoch seconds.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now_secs(&self) -> i64;
}

/// Production clock backed by the system wall clock.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Deterministic clock for tests. Starts at a fixed instant and only moves
/// when told to via [`FakeClock::advance`].
#[derive(Clone)]
pub struct FakeClock {
    secs: Arc<AtomicI64>,
}

impl FakeClock {
    pub fn new(start_secs: i64) -> Self {
        Self {
            secs: Arc::new(AtomicI64::new(start_secs)),
        }
    }

    pub fn advance(&self, delta_secs: i64) {
        self.secs.fetch_add(delta_secs, Ordering::SeqCst);
    }

    pub fn set(&self, secs: i64) {
        self.secs.store(secs, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Clock for FakeClock {
    fn now_secs(&self) -> i64 {
        self.secs.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
