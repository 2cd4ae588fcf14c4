// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::cache::{Cache, CacheError};
use crate::publish::{PublishError, Publisher};
use async_trait::async_trait;
use std::time::Duration;
use tracing::Instrument;

/// Wrapper that adds tracing to any Cache
#[derive(Clone)]
pub struct TracedCache<C> {
    inner: C,
}

impl<C> TracedCache<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: Cache> Cache for TracedCache<C> {
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let result = self.inner.set(key, value, ttl).await;
        match &result {
            Ok(()) => tracing::trace!(
                key,
                len = value.len(),
                ttl_ms = ttl.as_millis() as u64,
                "cache.set"
            ),
            // cache writes are best-effort, TTL bounds staleness
            Err(e) => tracing::warn!(key, error = %e, "cache set failed"),
        }
        result
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let result = self.inner.get(key).await;
        match &result {
            Ok(value) => tracing::trace!(key, hit = value.is_some(), "cache.get"),
            Err(e) => tracing::warn!(key, error = %e, "cache get failed"),
        }
        result
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let result = self.inner.invalidate(key).await;
        match &result {
            Ok(()) => tracing::debug!(key, "invalidated"),
            Err(e) => tracing::warn!(key, error = %e, "invalidate failed"),
        }
        result
    }

    async fn invalidate_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        let span = tracing::debug_span!("cache.invalidate_prefix", prefix);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.invalidate_prefix(prefix).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::debug!(elapsed_ms, "invalidated"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "invalidate failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

/// Wrapper that adds tracing to any Publisher
#[derive(Clone)]
pub struct TracedPublisher<P> {
    inner: P,
}

impl<P> TracedPublisher<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: Publisher> Publisher for TracedPublisher<P> {
    async fn publish(&self, payload: &[u8]) -> Result<(), PublishError> {
        let span = tracing::info_span!("publish", len = payload.len());
        async {
            let result = self.inner.publish(payload).await;
            match &result {
                Ok(()) => tracing::debug!("published"),
                Err(e) => tracing::error!(error = %e, "publish failed"),
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
