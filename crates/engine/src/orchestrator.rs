// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write orchestration over the rank store, cache and publisher
//!
//! Every mutation runs the same sequence: validate, store call under the
//! operation deadline, cache invalidation, then publish of the resulting
//! state. Invalidation is always best-effort. Publishing is best-effort
//! except on remove, where a failure is returned to the caller after the
//! store change has committed.
//!
//! Reads are cache-aside: a hit is returned without touching the store; a
//! miss reads the store and fills the cache.

use crate::error::ServiceError;
use ordo_adapters::{Cache, Publisher};
use ordo_core::keys::{item_key, list_key, LIST_NAMESPACE};
use ordo_core::{Config, Item, ItemDraft, ItemId, ItemPage, Pagination, ProjectId, RankDelta};
use ordo_storage::{RankStore, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// Orchestrator adapter dependencies
pub struct ServiceDeps<S, C, P> {
    pub store: S,
    pub cache: C,
    pub publisher: P,
}

/// Orchestrator tuning taken from [`Config`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub cache_ttl: Duration,
    pub op_timeout: Duration,
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        Self {
            cache_ttl: config.cache.ttl,
            op_timeout: config.service.op_timeout,
        }
    }
}

/// Coordinates item mutations and reads
#[derive(Clone)]
pub struct Orchestrator<S, C, P> {
    store: S,
    cache: C,
    publisher: P,
    config: OrchestratorConfig,
}

impl<S, C, P> Orchestrator<S, C, P>
where
    S: RankStore,
    C: Cache,
    P: Publisher,
{
    pub fn new(deps: ServiceDeps<S, C, P>, config: OrchestratorConfig) -> Self {
        Self {
            store: deps.store,
            cache: deps.cache,
            publisher: deps.publisher,
            config,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn create(
        &self,
        project_id: ProjectId,
        draft: ItemDraft,
    ) -> Result<Item, ServiceError> {
        draft.validate()?;
        let item = self
            .guarded_write(self.store.create(project_id, &draft), &[])
            .await?;

        self.invalidate(&[item_key(project_id, item.id)]).await;
        self.publish_best_effort(&item).await;
        Ok(item)
    }

    /// Cache-aside read of one item
    pub async fn get(&self, project_id: ProjectId, id: ItemId) -> Result<Item, ServiceError> {
        let key = item_key(project_id, id);
        if let Some(item) = self.cached::<Item>(&key).await {
            return Ok(item);
        }

        let item = self.guarded(self.store.get(project_id, id)).await?;
        self.fill(&key, &item).await;
        Ok(item)
    }

    pub async fn update(
        &self,
        project_id: ProjectId,
        id: ItemId,
        draft: ItemDraft,
    ) -> Result<Item, ServiceError> {
        draft.validate()?;
        let item = self
            .guarded_write(
                self.store.update(project_id, id, &draft),
                &[item_key(project_id, id)],
            )
            .await?;

        self.invalidate(&[item_key(project_id, id)]).await;
        self.publish_best_effort(&item).await;
        Ok(item)
    }

    /// Mark an item removed and publish it
    ///
    /// Returns the item as it stands after removal. A publish failure is an
    /// error here even though the removal itself has committed.
    pub async fn remove(&self, project_id: ProjectId, id: ItemId) -> Result<Item, ServiceError> {
        let mut item = self.guarded(self.store.get(project_id, id)).await?;
        self.guarded_write(self.store.remove(project_id, id), &[item_key(project_id, id)])
            .await?;
        item.removed = true;

        self.invalidate(&[item_key(project_id, id)]).await;
        self.publish_required(&item).await?;
        Ok(item)
    }

    /// Cache-aside read of one page
    pub async fn list(&self, page: Pagination) -> Result<ItemPage, ServiceError> {
        let key = list_key(page);
        if let Some(cached) = self.cached::<ItemPage>(&key).await {
            return Ok(cached);
        }

        let result = self.guarded(self.store.list(page)).await?;
        self.fill(&key, &result).await;
        Ok(result)
    }

    /// Move an item to `new_rank`, returning every rank that changed
    pub async fn reorder(
        &self,
        project_id: ProjectId,
        id: ItemId,
        new_rank: i64,
    ) -> Result<Vec<RankDelta>, ServiceError> {
        let deltas = self
            .guarded_write(
                self.store.reorder(project_id, id, new_rank),
                &[item_key(project_id, id)],
            )
            .await?;

        let keys: Vec<String> = deltas
            .iter()
            .map(|delta| item_key(project_id, delta.id))
            .collect();
        self.invalidate(&keys).await;
        self.publish_best_effort(&deltas).await;
        Ok(deltas)
    }

    /// Run a store call under the operation deadline
    ///
    /// Expiry drops the call, which rolls back its transaction unless the
    /// commit had already started. `Cancelled` therefore means the outcome is
    /// unknown, not that nothing was written.
    async fn guarded<T, F>(&self, call: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.config.op_timeout, call).await {
            Ok(result) => result.map_err(ServiceError::from),
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.op_timeout.as_millis() as u64,
                    "store call timed out"
                );
                Err(ServiceError::Cancelled)
            }
        }
    }

    /// [`Self::guarded`] for writes; on expiry `keys` and every list page are
    /// dropped anyway, since the write may have landed
    async fn guarded_write<T, F>(&self, call: F, keys: &[String]) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let result = self.guarded(call).await;
        if matches!(result, Err(ServiceError::Cancelled)) {
            self.invalidate(keys).await;
        }
        result
    }

    /// Drop the given entity keys and every cached list page
    async fn invalidate(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.cache.invalidate(key).await {
                tracing::warn!(key = %key, error = %e, "cache invalidation failed");
            }
        }
        if let Err(e) = self.cache.invalidate_prefix(LIST_NAMESPACE).await {
            tracing::warn!(prefix = LIST_NAMESPACE, error = %e, "list invalidation failed");
        }
    }

    /// Decoded cache entry; read failures and undecodable entries count as misses
    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.cache.get(key).await {
            Ok(bytes) => bytes?,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read failed");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding undecodable cache entry");
                None
            }
        }
    }

    async fn fill<T: Serialize>(&self, key: &str, value: &T) {
        let bytes = match serde_json::to_vec(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache encode failed");
                return;
            }
        };
        if let Err(e) = self.cache.set(key, &bytes, self.config.cache_ttl).await {
            tracing::warn!(key, error = %e, "cache fill failed");
        }
    }

    /// Publish and log a failure instead of returning it
    async fn publish_best_effort<T: Serialize>(&self, value: &T) {
        if let Err(e) = self.publish_required(value).await {
            tracing::warn!(error = %e, "change event not published");
        }
    }

    async fn publish_required<T: Serialize>(&self, value: &T) -> Result<(), ServiceError> {
        let payload = serde_json::to_vec(value)?;
        self.publisher.publish(&payload).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
