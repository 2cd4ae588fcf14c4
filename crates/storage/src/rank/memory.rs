// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory rank store
//!
//! Transactions are staged: each mutation runs against a copy of the state
//! while holding the store lock, and the copy replaces the live state only
//! when the whole mutation succeeds. Dropping a mutation midway (timeout,
//! injected failure) discards the copy.

use super::{bounds, check_rank, RankStore, DEFAULT_PROJECT};
use crate::error::StoreError;
use async_trait::async_trait;
use ordo_core::{
    Clock, Item, ItemDraft, ItemId, ItemPage, Pagination, Project, ProjectId, RankDelta,
    ShiftPlan, SystemClock,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Rank store operation, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    CreateProject,
    Create,
    Get,
    Update,
    Remove,
    List,
    Reorder,
}

/// Recorded rank store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    CreateProject { name: String },
    Create { project_id: ProjectId, name: String },
    Get { project_id: ProjectId, id: ItemId },
    Update { project_id: ProjectId, id: ItemId },
    Remove { project_id: ProjectId, id: ItemId },
    List { page: Pagination },
    Reorder { project_id: ProjectId, id: ItemId, new_rank: i64 },
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    projects: BTreeMap<ProjectId, Project>,
    items: BTreeMap<ItemId, Item>,
    next_project: i64,
    next_item: i64,
}

impl MemoryState {
    fn item(&self, project_id: ProjectId, id: ItemId) -> Result<&Item, StoreError> {
        self.items
            .get(&id)
            .filter(|item| item.project_id == project_id)
            .ok_or(StoreError::NotFound { project_id, id })
    }

    fn item_mut(&mut self, project_id: ProjectId, id: ItemId) -> Result<&mut Item, StoreError> {
        self.items
            .get_mut(&id)
            .filter(|item| item.project_id == project_id)
            .ok_or(StoreError::NotFound { project_id, id })
    }

    fn max_rank(&self, project_id: ProjectId) -> i64 {
        self.items
            .values()
            .filter(|item| item.project_id == project_id)
            .map(|item| item.priority)
            .max()
            .unwrap_or(0)
    }
}

/// Rank store backed by process memory
#[derive(Clone)]
pub struct MemoryRankStore<C = SystemClock> {
    state: Arc<tokio::sync::Mutex<MemoryState>>,
    faults: Arc<Mutex<HashSet<StoreOp>>>,
    latency: Arc<Mutex<Option<Duration>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    clock: C,
}

impl MemoryRankStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryRankStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryRankStore<C> {
    /// Create an empty store holding only the default project
    pub fn with_clock(clock: C) -> Self {
        let mut state = MemoryState {
            next_project: 1,
            next_item: 1,
            ..MemoryState::default()
        };
        let seed = Project {
            id: ProjectId(state.next_project),
            name: DEFAULT_PROJECT.to_string(),
            created_at: clock.utc_now(),
        };
        state.projects.insert(seed.id, seed);
        state.next_project += 1;

        Self {
            state: Arc::new(tokio::sync::Mutex::new(state)),
            faults: Arc::new(Mutex::new(HashSet::new())),
            latency: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
            clock,
        }
    }

    fn record(&self, call: StoreCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn take_fault(&self, op: StoreOp) -> Result<(), StoreError> {
        if self
            .faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&op)
        {
            return Err(StoreError::Backend(format!("injected {op:?} failure")));
        }
        Ok(())
    }

    async fn read<T>(
        &self,
        op: StoreOp,
        f: impl FnOnce(&MemoryState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let state = self.state.lock().await;
        self.take_fault(op)?;
        f(&state)
    }

    /// Run `f` against a staged copy and publish it only on success
    async fn transact<T>(
        &self,
        op: StoreOp,
        f: impl FnOnce(&mut MemoryState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock().await;
        let mut staged = state.clone();
        let value = f(&mut staged)?;
        self.take_fault(op)?;

        let latency = *self.latency.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }

        *state = staged;
        Ok(value)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl<C: Clock> MemoryRankStore<C> {
    /// Fail the next call of `op` after its changes are staged
    pub fn fail_next(&self, op: StoreOp) {
        self.faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(op);
    }

    /// Delay every commit, to exercise cancellation
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(|e| e.into_inner()) = latency;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Ranks of every item in a project, keyed by item id
    pub async fn ranks(&self, project_id: ProjectId) -> BTreeMap<ItemId, i64> {
        self.state
            .lock()
            .await
            .items
            .values()
            .filter(|item| item.project_id == project_id)
            .map(|item| (item.id, item.priority))
            .collect()
    }
}

#[async_trait]
impl<C: Clock> RankStore for MemoryRankStore<C> {
    async fn create_project(&self, name: &str) -> Result<Project, StoreError> {
        self.record(StoreCall::CreateProject {
            name: name.to_string(),
        });
        let created_at = self.clock.utc_now();
        self.transact(StoreOp::CreateProject, |state| {
            let project = Project {
                id: ProjectId(state.next_project),
                name: name.to_string(),
                created_at,
            };
            state.next_project += 1;
            state.projects.insert(project.id, project.clone());
            Ok(project)
        })
        .await
    }

    async fn create(&self, project_id: ProjectId, draft: &ItemDraft) -> Result<Item, StoreError> {
        self.record(StoreCall::Create {
            project_id,
            name: draft.name.clone(),
        });
        draft.validate()?;
        let created_at = self.clock.utc_now();
        self.transact(StoreOp::Create, |state| {
            if !state.projects.contains_key(&project_id) {
                return Err(StoreError::Constraint(format!(
                    "FOREIGN KEY constraint failed: no project {project_id}"
                )));
            }
            let item = Item {
                id: ItemId(state.next_item),
                project_id,
                name: draft.name.clone(),
                description: draft.description.clone(),
                priority: state.max_rank(project_id) + 1,
                removed: false,
                created_at,
            };
            state.next_item += 1;
            state.items.insert(item.id, item.clone());
            Ok(item)
        })
        .await
    }

    async fn get(&self, project_id: ProjectId, id: ItemId) -> Result<Item, StoreError> {
        self.record(StoreCall::Get { project_id, id });
        self.read(StoreOp::Get, |state| state.item(project_id, id).cloned())
            .await
    }

    async fn update(
        &self,
        project_id: ProjectId,
        id: ItemId,
        draft: &ItemDraft,
    ) -> Result<Item, StoreError> {
        self.record(StoreCall::Update { project_id, id });
        draft.validate()?;
        self.transact(StoreOp::Update, |state| {
            let item = state.item_mut(project_id, id)?;
            item.name = draft.name.clone();
            item.description = draft.description.clone();
            Ok(item.clone())
        })
        .await
    }

    async fn remove(&self, project_id: ProjectId, id: ItemId) -> Result<(), StoreError> {
        self.record(StoreCall::Remove { project_id, id });
        self.transact(StoreOp::Remove, |state| {
            state.item_mut(project_id, id)?.removed = true;
            Ok(())
        })
        .await
    }

    async fn list(&self, page: Pagination) -> Result<ItemPage, StoreError> {
        self.record(StoreCall::List { page });
        let (limit, offset) = bounds(page);
        self.read(StoreOp::List, |state| {
            let items = state
                .items
                .values()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect();
            let total = state.items.len() as i64;
            let removed = state.items.values().filter(|item| item.removed).count() as i64;
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
        self.record(StoreCall::Reorder {
            project_id,
            id,
            new_rank,
        });
        self.transact(StoreOp::Reorder, |state| {
            let current = state.item(project_id, id)?.priority;
            check_rank(new_rank, state.max_rank(project_id))?;

            let plan = ShiftPlan::new(current, new_rank);
            let mut deltas: Vec<RankDelta> = state
                .items
                .values_mut()
                .filter(|item| item.project_id == project_id && item.id != id)
                .filter(|item| plan.shifts(item.priority))
                .map(|item| {
                    item.priority = plan.shifted(item.priority);
                    RankDelta::new(item.id, item.priority)
                })
                .collect();
            deltas.sort_by_key(|delta| delta.priority);

            state.item_mut(project_id, id)?.priority = new_rank;
            deltas.push(RankDelta::new(id, new_rank));
            Ok(deltas)
        })
        .await
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
