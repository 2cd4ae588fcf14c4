// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced storage wrappers for consistent observability

use crate::error::{SinkError, StoreError};
use crate::rank::RankStore;
use crate::sink::EventSink;
use async_trait::async_trait;
use ordo_core::{Item, ItemDraft, ItemId, ItemPage, Pagination, Project, ProjectId, RankDelta};
use tracing::Instrument;

/// Wrapper that adds tracing to any RankStore
#[derive(Clone)]
pub struct TracedRankStore<S> {
    inner: S,
}

impl<S> TracedRankStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

/// Log the outcome of a store call; a missing item is not an error here
fn log_outcome<T>(result: &Result<T, StoreError>, elapsed: std::time::Duration, what: &str) {
    let elapsed_ms = elapsed.as_millis() as u64;
    match result {
        Ok(_) => tracing::debug!(elapsed_ms, "{what}"),
        Err(e @ (StoreError::NotFound { .. } | StoreError::Validation(_))) => {
            tracing::debug!(elapsed_ms, error = %e, "rejected")
        }
        Err(e) => tracing::error!(elapsed_ms, error = %e, "failed"),
    }
}

#[async_trait]
impl<S: RankStore> RankStore for TracedRankStore<S> {
    async fn create_project(&self, name: &str) -> Result<Project, StoreError> {
        let span = tracing::info_span!("store.create_project", name);
        async {
            let result = self.inner.create_project(name).await;
            if let Ok(project) = &result {
                tracing::info!(project_id = %project.id, "project created");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn create(&self, project_id: ProjectId, draft: &ItemDraft) -> Result<Item, StoreError> {
        let span = tracing::info_span!("store.create", %project_id);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.create(project_id, draft).await;
            log_outcome(&result, start.elapsed(), "created");
            if let Ok(item) = &result {
                tracing::debug!(item_id = %item.id, priority = item.priority, "assigned rank");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn get(&self, project_id: ProjectId, id: ItemId) -> Result<Item, StoreError> {
        let result = self.inner.get(project_id, id).await;
        tracing::trace!(%project_id, item_id = %id, found = result.is_ok(), "store.get");
        result
    }

    async fn update(
        &self,
        project_id: ProjectId,
        id: ItemId,
        draft: &ItemDraft,
    ) -> Result<Item, StoreError> {
        let span = tracing::info_span!("store.update", %project_id, item_id = %id);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.update(project_id, id, draft).await;
            log_outcome(&result, start.elapsed(), "updated");
            result
        }
        .instrument(span)
        .await
    }

    async fn remove(&self, project_id: ProjectId, id: ItemId) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.remove", %project_id, item_id = %id);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.remove(project_id, id).await;
            log_outcome(&result, start.elapsed(), "removed");
            result
        }
        .instrument(span)
        .await
    }

    async fn list(&self, page: Pagination) -> Result<ItemPage, StoreError> {
        let result = self.inner.list(page).await;
        tracing::trace!(
            limit = page.limit,
            offset = page.offset,
            count = result.as_ref().map(|p| p.items.len()).ok(),
            "store.list"
        );
        result
    }

    async fn reorder(
        &self,
        project_id: ProjectId,
        id: ItemId,
        new_rank: i64,
    ) -> Result<Vec<RankDelta>, StoreError> {
        let span = tracing::info_span!("store.reorder", %project_id, item_id = %id, new_rank);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.reorder(project_id, id, new_rank).await;
            log_outcome(&result, start.elapsed(), "reordered");
            if let Ok(deltas) = &result {
                tracing::info!(count = deltas.len(), "ranks shifted");
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any EventSink
#[derive(Clone)]
pub struct TracedEventSink<K> {
    inner: K,
}

impl<K> TracedEventSink<K> {
    pub fn new(inner: K) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &K {
        &self.inner
    }
}

#[async_trait]
impl<K: EventSink> EventSink for TracedEventSink<K> {
    async fn write_batch(&self, items: &[Item]) -> Result<(), SinkError> {
        let span = tracing::info_span!("sink.write_batch", count = items.len());
        async {
            let start = std::time::Instant::now();
            let result = self.inner.write_batch(items).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "batch written"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "batch write failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
