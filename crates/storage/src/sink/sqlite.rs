// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite event sink
//!
//! Rows go to a flat `events_log` table with no foreign keys. A batch is one
//! transaction with one prepared insert reused per row.

use super::{EventRecord, EventSink};
use crate::error::SinkError;
use async_trait::async_trait;
use ordo_core::{Clock, Item, ItemId, ProjectId, SystemClock};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS events_log (
  id INTEGER NOT NULL,
  project_id INTEGER NOT NULL,
  name TEXT NOT NULL,
  description TEXT NOT NULL,
  priority INTEGER NOT NULL,
  removed INTEGER NOT NULL,
  event_time TEXT NOT NULL
);
"#;

/// Event sink backed by a SQLite database
#[derive(Clone)]
pub struct SqliteEventSink<C = SystemClock> {
    conn: Arc<Mutex<Connection>>,
    clock: C,
}

impl SqliteEventSink<SystemClock> {
    pub fn open(path: &Path) -> Result<Self, SinkError> {
        Self::open_with_clock(path, SystemClock)
    }

    pub fn open_in_memory() -> Result<Self, SinkError> {
        Self::from_connection(Connection::open_in_memory()?, SystemClock)
    }
}

impl<C: Clock> SqliteEventSink<C> {
    pub fn open_with_clock(path: &Path, clock: C) -> Result<Self, SinkError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SinkError::Backend(format!("create {}: {e}", parent.display())))?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::from_connection(conn, clock)
    }

    fn from_connection(conn: Connection, clock: C) -> Result<Self, SinkError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            clock,
        })
    }

    /// Every row in write order
    pub async fn records(&self) -> Result<Vec<EventRecord>, SinkError> {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(|e| e.into_inner());
            let mut stmt = conn.prepare(
                "SELECT id, project_id, name, description, priority, removed, event_time
                 FROM events_log ORDER BY rowid",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(EventRecord {
                    id: ItemId(row.get(0)?),
                    project_id: ProjectId(row.get(1)?),
                    name: row.get(2)?,
                    description: row.get(3)?,
                    priority: row.get(4)?,
                    removed: row.get(5)?,
                    event_time: row.get(6)?,
                })
            })?;
            let records = rows.collect::<Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await?
    }
}

#[async_trait]
impl<C: Clock> EventSink for SqliteEventSink<C> {
    async fn write_batch(&self, items: &[Item]) -> Result<(), SinkError> {
        if items.is_empty() {
            return Ok(());
        }
        let event_time = self.clock.utc_now();
        let records: Vec<EventRecord> = items
            .iter()
            .map(|item| EventRecord::from_item(item, event_time))
            .collect();
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().unwrap_or_else(|e| e.into_inner());
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO events_log
                     (id, project_id, name, description, priority, removed, event_time)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )?;
                for record in &records {
                    stmt.execute(params![
                        record.id.0,
                        record.project_id.0,
                        record.name,
                        record.description,
                        record.priority,
                        record.removed,
                        record.event_time,
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await?
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
