// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake publisher for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{PublishError, Publisher};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct FakePublisherState {
    published: Vec<Vec<u8>>,
    fail: bool,
}

/// Fake publisher that records payloads instead of sending them
#[derive(Clone, Default)]
pub struct FakePublisher {
    inner: Arc<Mutex<FakePublisherState>>,
}

impl FakePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads published so far, failed attempts excluded
    pub fn published(&self) -> Vec<Vec<u8>> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .published
            .clone()
    }

    /// Make every publish fail until reset
    pub fn set_fail(&self, fail: bool) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).fail = fail;
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn publish(&self, payload: &[u8]) -> Result<(), PublishError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.fail {
            return Err(PublishError::Transport("injected failure".into()));
        }
        inner.published.push(payload.to_vec());
        Ok(())
    }
}
