// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authoritative item storage with dense per-project ranks

mod memory;
mod sqlite;

pub use memory::MemoryRankStore;
#[cfg(any(test, feature = "test-support"))]
pub use memory::{StoreCall, StoreOp};
pub use sqlite::SqliteRankStore;

use crate::error::StoreError;
use async_trait::async_trait;
use ordo_core::{
    Item, ItemDraft, ItemId, ItemPage, Pagination, Project, ProjectId, RankDelta, ValidationError,
};

/// Name of the project every fresh store starts with
pub const DEFAULT_PROJECT: &str = "default";

/// Store of items and their ranks
///
/// Implementations keep ranks dense (`1..=N` per project, removed items
/// included) across every operation, and run each mutation in a single
/// transaction that either commits whole or leaves no trace.
#[async_trait]
pub trait RankStore: Clone + Send + Sync + 'static {
    /// Add a project and return it
    async fn create_project(&self, name: &str) -> Result<Project, StoreError>;

    /// Insert an item at the bottom of its project's ranking
    async fn create(&self, project_id: ProjectId, draft: &ItemDraft) -> Result<Item, StoreError>;

    async fn get(&self, project_id: ProjectId, id: ItemId) -> Result<Item, StoreError>;

    /// Replace name and description; the rank is untouched
    async fn update(
        &self,
        project_id: ProjectId,
        id: ItemId,
        draft: &ItemDraft,
    ) -> Result<Item, StoreError>;

    /// Mark an item removed without renumbering its project
    async fn remove(&self, project_id: ProjectId, id: ItemId) -> Result<(), StoreError>;

    /// One page of items ordered by id, with store-wide totals
    async fn list(&self, page: Pagination) -> Result<ItemPage, StoreError>;

    /// Move an item to `new_rank`, shifting the items in between
    ///
    /// Returns a delta for every shifted item ordered by new rank, followed
    /// by the target's delta last.
    async fn reorder(
        &self,
        project_id: ProjectId,
        id: ItemId,
        new_rank: i64,
    ) -> Result<Vec<RankDelta>, StoreError>;
}

/// Reject targets outside the project's current ranks
pub(crate) fn check_rank(rank: i64, max: i64) -> Result<(), ValidationError> {
    if rank < 1 || rank > max {
        return Err(ValidationError::RankOutOfRange { rank, max });
    }
    Ok(())
}

/// Clamp pagination to values a store can apply
pub(crate) fn bounds(page: Pagination) -> (i64, i64) {
    (page.limit.max(0), page.offset.max(0))
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
