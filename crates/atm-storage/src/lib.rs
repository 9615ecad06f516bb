// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable storage: atomic snapshot-metadata persistence and cross-process
//! device claims.

mod atomic_write;
mod claim;
mod snapshot_store;

pub use atomic_write::{atomic_write, AtomicWriteError};
pub use claim::{Claim, ClaimError, ClaimStore};
pub use snapshot_store::{SnapshotStore, SnapshotStoreError};
