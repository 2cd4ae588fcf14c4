// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lookaside cache adapters

mod memory;
mod noop;
mod redis;

pub use self::memory::MemoryCache;
pub use self::noop::NoOpCache;
pub use self::redis::RedisCache;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{CacheCall, FakeCache};

use async_trait::async_trait;
use ordo_core::{CacheBackend, CacheConfig, Clock, SystemClock};
use std::time::Duration;
use thiserror::Error;

/// Errors from cache operations
///
/// A miss is not an error: `get` returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection failed: {0}")]
    Connect(String),
    #[error("cache command failed: {0}")]
    Command(String),
}

/// Key/value cache with per-entry TTL
#[async_trait]
pub trait Cache: Clone + Send + Sync + 'static {
    /// Store `value` under `key` for at most `ttl`
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    /// Fetch a live entry, `None` on miss or expiry
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Drop one entry; dropping an absent key succeeds
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;

    /// Drop every entry whose key starts with `prefix`
    async fn invalidate_prefix(&self, prefix: &str) -> Result<(), CacheError>;
}

/// Cache selected by configuration at startup
#[derive(Clone)]
pub enum ConfiguredCache<C: Clock = SystemClock> {
    Memory(MemoryCache<C>),
    Redis(RedisCache),
    None(NoOpCache),
}

impl ConfiguredCache<SystemClock> {
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        Self::connect_with_clock(config, SystemClock).await
    }
}

impl<C: Clock> ConfiguredCache<C> {
    pub async fn connect_with_clock(config: &CacheConfig, clock: C) -> Result<Self, CacheError> {
        match config.backend {
            CacheBackend::Memory => Ok(Self::Memory(MemoryCache::with_clock(clock))),
            CacheBackend::None => Ok(Self::None(NoOpCache::new())),
            CacheBackend::Redis => {
                let url = config
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| CacheError::Connect("no redis url configured".into()))?;
                let cache = RedisCache::connect(url, &config.key_prefix).await?;
                Ok(Self::Redis(cache))
            }
        }
    }

    pub fn backend(&self) -> CacheBackend {
        match self {
            Self::Memory(_) => CacheBackend::Memory,
            Self::Redis(_) => CacheBackend::Redis,
            Self::None(_) => CacheBackend::None,
        }
    }
}

#[async_trait]
impl<C: Clock> Cache for ConfiguredCache<C> {
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        match self {
            Self::Memory(cache) => cache.set(key, value, ttl).await,
            Self::Redis(cache) => cache.set(key, value, ttl).await,
            Self::None(cache) => cache.set(key, value, ttl).await,
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match self {
            Self::Memory(cache) => cache.get(key).await,
            Self::Redis(cache) => cache.get(key).await,
            Self::None(cache) => cache.get(key).await,
        }
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        match self {
            Self::Memory(cache) => cache.invalidate(key).await,
            Self::Redis(cache) => cache.invalidate(key).await,
            Self::None(cache) => cache.invalidate(key).await,
        }
    }

    async fn invalidate_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        match self {
            Self::Memory(cache) => cache.invalidate_prefix(prefix).await,
            Self::Redis(cache) => cache.invalidate_prefix(prefix).await,
            Self::None(cache) => cache.invalidate_prefix(prefix).await,
        }
    }
}
