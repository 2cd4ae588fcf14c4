// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ordo-storage: the authoritative rank store and the analytical event sink

mod error;
pub mod rank;
pub mod sink;
pub mod traced;

pub use error::{SinkError, StoreError};
pub use rank::{MemoryRankStore, RankStore, SqliteRankStore, DEFAULT_PROJECT};
pub use sink::{EventRecord, EventSink, MemoryEventSink, SqliteEventSink};
pub use traced::{TracedEventSink, TracedRankStore};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use rank::{StoreCall, StoreOp};
