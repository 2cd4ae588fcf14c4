// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory event sink

use super::{EventRecord, EventSink};
use crate::error::SinkError;
use async_trait::async_trait;
use ordo_core::{Clock, Item, SystemClock};
use std::sync::{Arc, Mutex};

/// Event sink that keeps every written batch in memory
#[derive(Clone)]
pub struct MemoryEventSink<C = SystemClock> {
    batches: Arc<Mutex<Vec<Vec<EventRecord>>>>,
    fail_next: Arc<Mutex<bool>>,
    clock: C,
}

impl MemoryEventSink<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryEventSink<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryEventSink<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            batches: Arc::new(Mutex::new(Vec::new())),
            fail_next: Arc::new(Mutex::new(false)),
            clock,
        }
    }

    /// Every batch written so far, in write order
    pub fn batches(&self) -> Vec<Vec<EventRecord>> {
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// All rows across batches
    pub fn records(&self) -> Vec<EventRecord> {
        self.batches().into_iter().flatten().collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl<C: Clock> MemoryEventSink<C> {
    /// Make the next write fail without storing anything
    pub fn fail_next(&self) {
        *self.fail_next.lock().unwrap_or_else(|e| e.into_inner()) = true;
    }
}

#[async_trait]
impl<C: Clock> EventSink for MemoryEventSink<C> {
    async fn write_batch(&self, items: &[Item]) -> Result<(), SinkError> {
        {
            let mut fail = self.fail_next.lock().unwrap_or_else(|e| e.into_inner());
            if std::mem::take(&mut *fail) {
                return Err(SinkError::Backend("injected write failure".into()));
            }
        }
        let event_time = self.clock.utc_now();
        let batch = items
            .iter()
            .map(|item| EventRecord::from_item(item, event_time))
            .collect();
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(batch);
        Ok(())
    }
}
