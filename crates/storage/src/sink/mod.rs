// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only analytical event log

mod memory;
mod sqlite;

pub use memory::MemoryEventSink;
pub use sqlite::SqliteEventSink;

use crate::error::SinkError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ordo_core::{Item, ItemId, ProjectId};

/// One flattened row of the event log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub id: ItemId,
    pub project_id: ProjectId,
    pub name: String,
    /// Empty when the item has no description
    pub description: String,
    pub priority: i64,
    /// 0 or 1
    pub removed: u8,
    pub event_time: DateTime<Utc>,
}

impl EventRecord {
    pub fn from_item(item: &Item, event_time: DateTime<Utc>) -> Self {
        Self {
            id: item.id,
            project_id: item.project_id,
            name: item.name.clone(),
            description: item.description.clone().unwrap_or_default(),
            priority: item.priority,
            removed: u8::from(item.removed),
            event_time,
        }
    }
}

/// Destination of batched change events
#[async_trait]
pub trait EventSink: Clone + Send + Sync + 'static {
    /// Append every item as one event row, all or nothing
    ///
    /// The sink stamps each row with its own wall clock at write time.
    async fn write_batch(&self, items: &[Item]) -> Result<(), SinkError>;
}
