// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ordo-core: shared building blocks for the Ordo item service
//!
//! This crate provides:
//! - The item data model (items, projects, rank deltas, list pages)
//! - The pure rank-shift plan used by every rank store
//! - Error classification shared by the request surface
//! - Configuration loading and the clock abstraction

pub mod clock;
pub mod config;
pub mod error;
pub mod keys;
pub mod model;
pub mod rank;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    BusConfig, CacheBackend, CacheConfig, Config, ConfigError, DaemonConfig, IngestConfig,
    ServiceConfig, StoreConfig,
};
pub use error::{ApiError, ErrorKind, StatusClass, ValidationError};
pub use model::{
    validate_name, Item, ItemDraft, ItemId, ItemPage, PageMeta, Pagination, Project, ProjectId,
    RankDelta,
};
pub use rank::ShiftPlan;
