// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op cache for when caching is disabled.

use super::{Cache, CacheError};
use async_trait::async_trait;
use std::time::Duration;

/// Cache that stores nothing; every read is a miss.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpCache;

impl NoOpCache {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Cache for NoOpCache {
    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn invalidate(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    async fn invalidate_prefix(&self, _prefix: &str) -> Result<(), CacheError> {
        Ok(())
    }
}
