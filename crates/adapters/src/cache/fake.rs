// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake cache for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{Cache, CacheError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded cache call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCall {
    Get { key: String },
    Set { key: String, ttl: Duration },
    Invalidate { key: String },
    InvalidatePrefix { prefix: String },
}

#[derive(Default)]
struct FakeCacheState {
    entries: HashMap<String, Vec<u8>>,
    calls: Vec<CacheCall>,
    fail_reads: bool,
    fail_writes: bool,
}

/// Fake cache that never expires entries and records every call
#[derive(Clone, Default)]
pub struct FakeCache {
    inner: Arc<Mutex<FakeCacheState>>,
}

impl FakeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<CacheCall> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Stored value for a key
    pub fn entry(&self, key: &str) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .get(key)
            .cloned()
    }

    /// Seed an entry without recording a call
    pub fn insert(&self, key: &str, value: impl Into<Vec<u8>>) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .insert(key.to_string(), value.into());
    }

    /// Make `get` fail
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).fail_reads = fail;
    }

    /// Make `set` and both invalidations fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).fail_writes = fail;
    }
}

fn injected() -> CacheError {
    CacheError::Command("injected failure".into())
}

#[async_trait]
impl Cache for FakeCache {
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.calls.push(CacheCall::Set {
            key: key.to_string(),
            ttl,
        });
        if inner.fail_writes {
            return Err(injected());
        }
        inner.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.calls.push(CacheCall::Get {
            key: key.to_string(),
        });
        if inner.fail_reads {
            return Err(injected());
        }
        Ok(inner.entries.get(key).cloned())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.calls.push(CacheCall::Invalidate {
            key: key.to_string(),
        });
        if inner.fail_writes {
            return Err(injected());
        }
        inner.entries.remove(key);
        Ok(())
    }

    async fn invalidate_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.calls.push(CacheCall::InvalidatePrefix {
            prefix: prefix.to_string(),
        });
        if inner.fail_writes {
            return Err(injected());
        }
        inner.entries.retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}
