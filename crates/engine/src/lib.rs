// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Ordo engine: the write orchestrator and the ingestion pipeline

mod batcher;
mod error;
mod ingest;
mod orchestrator;

pub use batcher::{Batcher, BatcherStats};
pub use error::{IngestError, ServiceError};
pub use ingest::{IngestHandle, IngestWorker};
pub use orchestrator::{Orchestrator, OrchestratorConfig, ServiceDeps};
