// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite rank store
//!
//! Every mutation opens an `IMMEDIATE` transaction, which takes the database
//! write lock up front; waits for that lock are bounded by the busy timeout.
//! Calls run on the blocking pool. Dropping a call's future interrupts the
//! statement in flight and marks the transaction cancelled so it rolls back
//! instead of committing.
//!
//! Commit is the point of no return. A call dropped once its commit has
//! started is not interrupted; the write lands and a warning is logged, even
//! though the dropped caller never sees the result. Callers that time out
//! must treat `Cancelled` as "outcome unknown" rather than "rolled back".

use super::{bounds, check_rank, RankStore, DEFAULT_PROJECT};
use crate::error::StoreError;
use async_trait::async_trait;
use ordo_core::{
    Clock, Item, ItemDraft, ItemId, ItemPage, Pagination, Project, ProjectId, RankDelta,
    ShiftPlan, SystemClock,
};
use rusqlite::{
    params, Connection, InterruptHandle, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS projects (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS items (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  project_id INTEGER NOT NULL REFERENCES projects(id),
  name TEXT NOT NULL CHECK (name <> ''),
  description TEXT,
  priority INTEGER NOT NULL,
  removed INTEGER NOT NULL DEFAULT 0,
  created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_project_priority ON items(project_id, priority);
CREATE INDEX IF NOT EXISTS idx_items_name ON items(name);
"#;

const ITEM_COLUMNS: &str = "id, project_id, name, description, priority, removed, created_at";

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: ItemId(row.get(0)?),
        project_id: ProjectId(row.get(1)?),
        name: row.get(2)?,
        description: row.get(3)?,
        priority: row.get(4)?,
        removed: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn select_item(
    tx: &Transaction<'_>,
    project_id: ProjectId,
    id: ItemId,
) -> Result<Item, StoreError> {
    let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE project_id = ?1 AND id = ?2");
    tx.query_row(&sql, params![project_id.0, id.0], item_from_row)
        .optional()?
        .ok_or(StoreError::NotFound { project_id, id })
}

const PENDING: u8 = 0;
const RUNNING: u8 = 1;
const COMMITTING: u8 = 2;
const FINISHED: u8 = 3;
const CANCELLED: u8 = 4;

/// Cancellation state shared between a call's future and its blocking task
///
/// Drop and commit race through one compare-and-swap, so exactly one wins.
struct CallState {
    phase: AtomicU8,
}

impl CallState {
    fn new() -> Self {
        Self {
            phase: AtomicU8::new(PENDING),
        }
    }

    fn advance(&self, from: u8, to: u8) -> Result<(), StoreError> {
        self.phase
            .compare_exchange(from, to, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| StoreError::Cancelled)
    }

    /// Claim the commit; fails if the caller already went away
    fn begin_commit(&self) -> Result<(), StoreError> {
        self.advance(RUNNING, COMMITTING)
    }
}

/// Interrupts the call's statement if the awaiting future goes away
struct CancelOnDrop {
    state: Arc<CallState>,
    interrupt: Arc<InterruptHandle>,
    armed: bool,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if self.state.advance(PENDING, CANCELLED).is_ok() {
            return;
        }
        if self.state.advance(RUNNING, CANCELLED).is_ok() {
            self.interrupt.interrupt();
            return;
        }
        if self.state.phase.load(Ordering::SeqCst) == COMMITTING {
            tracing::warn!("caller dropped during commit; write kept");
        }
    }
}

/// Rank store backed by a SQLite database
#[derive(Clone)]
pub struct SqliteRankStore<C = SystemClock> {
    conn: Arc<Mutex<Connection>>,
    interrupt: Arc<InterruptHandle>,
    clock: C,
}

impl SqliteRankStore<SystemClock> {
    pub fn open(path: &Path, busy_timeout: Duration) -> Result<Self, StoreError> {
        Self::open_with_clock(path, busy_timeout, SystemClock)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?, SystemClock)
    }
}

impl<C: Clock> SqliteRankStore<C> {
    pub fn open_with_clock(
        path: &Path,
        busy_timeout: Duration,
        clock: C,
    ) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Backend(format!("create {}: {e}", parent.display())))?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::from_connection(conn, clock)
    }

    fn from_connection(conn: Connection, clock: C) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            "INSERT OR IGNORE INTO projects (id, name, created_at) VALUES (1, ?1, ?2)",
            params![DEFAULT_PROJECT, clock.utc_now()],
        )?;
        let interrupt = Arc::new(conn.get_interrupt_handle());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            interrupt,
            clock,
        })
    }

    /// Run `op` on the blocking pool with cancellation on drop
    async fn call<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &CallState) -> Result<T, StoreError> + Send + 'static,
    {
        let state = Arc::new(CallState::new());
        let mut guard = CancelOnDrop {
            state: Arc::clone(&state),
            interrupt: Arc::clone(&self.interrupt),
            armed: true,
        };

        let conn = Arc::clone(&self.conn);
        let result = tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().unwrap_or_else(|e| e.into_inner());
            state.advance(PENDING, RUNNING)?;
            let result = op(&mut conn, &state);
            // Keep a late drop from interrupting the next call on this connection
            state.phase.store(FINISHED, Ordering::SeqCst);
            result
        })
        .await;

        guard.armed = false;
        result?
    }
}

#[async_trait]
impl<C: Clock> RankStore for SqliteRankStore<C> {
    async fn create_project(&self, name: &str) -> Result<Project, StoreError> {
        let name = name.to_string();
        let created_at = self.clock.utc_now();
        self.call(move |conn, call| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO projects (name, created_at) VALUES (?1, ?2)",
                params![name, created_at],
            )?;
            let id = ProjectId(tx.last_insert_rowid());
            call.begin_commit()?;
            tx.commit()?;
            Ok(Project {
                id,
                name,
                created_at,
            })
        })
        .await
    }

    async fn create(&self, project_id: ProjectId, draft: &ItemDraft) -> Result<Item, StoreError> {
        draft.validate()?;
        let draft = draft.clone();
        let created_at = self.clock.utc_now();
        self.call(move |conn, call| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute(
                "INSERT INTO items (project_id, name, description, priority, removed, created_at)
                 VALUES (?1, ?2, ?3,
                         (SELECT COALESCE(MAX(priority), 0) + 1 FROM items WHERE project_id = ?1),
                         0, ?4)",
                params![project_id.0, draft.name, draft.description, created_at],
            )?;
            let item = select_item(&tx, project_id, ItemId(tx.last_insert_rowid()))?;
            call.begin_commit()?;
            tx.commit()?;
            Ok(item)
        })
        .await
    }

    async fn get(&self, project_id: ProjectId, id: ItemId) -> Result<Item, StoreError> {
        self.call(move |conn, _| {
            let tx = conn.transaction()?;
            select_item(&tx, project_id, id)
        })
        .await
    }

    async fn update(
        &self,
        project_id: ProjectId,
        id: ItemId,
        draft: &ItemDraft,
    ) -> Result<Item, StoreError> {
        draft.validate()?;
        let draft = draft.clone();
        self.call(move |conn, call| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            select_item(&tx, project_id, id)?;
            tx.execute(
                "UPDATE items SET name = ?1, description = ?2 WHERE project_id = ?3 AND id = ?4",
                params![draft.name, draft.description, project_id.0, id.0],
            )?;
            let item = select_item(&tx, project_id, id)?;
            call.begin_commit()?;
            tx.commit()?;
            Ok(item)
        })
        .await
    }

    async fn remove(&self, project_id: ProjectId, id: ItemId) -> Result<(), StoreError> {
        self.call(move |conn, call| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            select_item(&tx, project_id, id)?;
            tx.execute(
                "UPDATE items SET removed = 1 WHERE project_id = ?1 AND id = ?2",
                params![project_id.0, id.0],
            )?;
            call.begin_commit()?;
            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn list(&self, page: Pagination) -> Result<ItemPage, StoreError> {
        let (limit, offset) = bounds(page);
        self.call(move |conn, _| {
            let tx = conn.transaction()?;
            let items = {
                let sql = format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id LIMIT ?1 OFFSET ?2");
                let mut stmt = tx.prepare(&sql)?;
                let rows = stmt.query_map(params![limit, offset], item_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            };
            let total: i64 = tx.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
            let removed: i64 = tx.query_row(
                "SELECT COUNT(*) FROM items WHERE removed = 1",
                [],
                |row| row.get(0),
            )?;
            Ok(ItemPage::new(items, total, removed, page))
        })
        .await
    }

    async fn reorder(
        &self,
        project_id: ProjectId,
        id: ItemId,
        new_rank: i64,
    ) -> Result<Vec<RankDelta>, StoreError> {
        self.call(move |conn, call| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let current = select_item(&tx, project_id, id)?.priority;
            let max: i64 = tx.query_row(
                "SELECT COALESCE(MAX(priority), 0) FROM items WHERE project_id = ?1",
                params![project_id.0],
                |row| row.get(0),
            )?;
            check_rank(new_rank, max)?;

            let plan = ShiftPlan::new(current, new_rank);
            let mut deltas = Vec::new();
            if let Some((low, high)) = plan.range() {
                let mut stmt = tx.prepare(
                    "UPDATE items SET priority = priority + ?1
                     WHERE project_id = ?2 AND id <> ?3 AND priority BETWEEN ?4 AND ?5
                     RETURNING id, priority",
                )?;
                let rows = stmt.query_map(
                    params![plan.step(), project_id.0, id.0, low, high],
                    |row| Ok(RankDelta::new(ItemId(row.get(0)?), row.get(1)?)),
                )?;
                for delta in rows {
                    deltas.push(delta?);
                }
            }
            deltas.sort_by_key(|delta| delta.priority);

            tx.execute(
                "UPDATE items SET priority = ?1 WHERE project_id = ?2 AND id = ?3",
                params![new_rank, project_id.0, id.0],
            )?;
            deltas.push(RankDelta::new(id, new_rank));

            call.begin_commit()?;
            tx.commit()?;
            Ok(deltas)
        })
        .await
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
