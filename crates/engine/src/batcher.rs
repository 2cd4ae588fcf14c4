// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Size-triggered batching of change events
//!
//! Events accumulate in a buffer guarded by one mutex. When an append brings
//! the buffer to the threshold, the buffer is swapped for an empty one under
//! the lock and the swapped-out batch is written after the lock is released,
//! so concurrent flushes may be in flight and reach the sink in any order.
//!
//! Nothing is staged durably: a crash loses whatever is buffered.

use crate::error::IngestError;
use ordo_core::Item;
use ordo_storage::EventSink;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Counters describing batcher activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatcherStats {
    pub buffered: usize,
    pub batches_written: u64,
    pub events_written: u64,
    pub rejected: u64,
}

/// Buffers decoded items and writes them to a sink in batches
pub struct Batcher<K> {
    sink: K,
    threshold: usize,
    buffer: Mutex<Vec<Item>>,
    batches_written: AtomicU64,
    events_written: AtomicU64,
    rejected: AtomicU64,
}

impl<K: EventSink> Batcher<K> {
    /// Create a batcher; a threshold of zero is treated as one
    pub fn new(sink: K, threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            sink,
            threshold,
            buffer: Mutex::new(Vec::with_capacity(threshold)),
            batches_written: AtomicU64::new(0),
            events_written: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Decode one raw event and buffer it, writing a batch at the threshold
    ///
    /// A malformed event leaves the buffer unchanged.
    pub async fn handle(&self, raw: &[u8]) -> Result<(), IngestError> {
        let item: Item = serde_json::from_slice(raw).map_err(|e| {
            self.rejected.fetch_add(1, Ordering::Relaxed);
            IngestError::Decode(e)
        })?;

        let ready = {
            let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
            buffer.push(item);
            if buffer.len() >= self.threshold {
                Some(std::mem::replace(
                    &mut *buffer,
                    Vec::with_capacity(self.threshold),
                ))
            } else {
                None
            }
        };

        match ready {
            Some(batch) => self.write(batch).await,
            None => Ok(()),
        }
    }

    /// Write whatever is buffered; an empty buffer writes nothing
    pub async fn flush(&self) -> Result<(), IngestError> {
        let batch = std::mem::take(&mut *self.buffer.lock().unwrap_or_else(|e| e.into_inner()));
        if batch.is_empty() {
            return Ok(());
        }
        self.write(batch).await
    }

    pub fn buffered(&self) -> usize {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn stats(&self) -> BatcherStats {
        BatcherStats {
            buffered: self.buffered(),
            batches_written: self.batches_written.load(Ordering::Relaxed),
            events_written: self.events_written.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }

    /// Write one batch; on failure the batch is dropped
    async fn write(&self, batch: Vec<Item>) -> Result<(), IngestError> {
        let count = batch.len();
        match self.sink.write_batch(&batch).await {
            Ok(()) => {
                self.batches_written.fetch_add(1, Ordering::Relaxed);
                self.events_written.fetch_add(count as u64, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                tracing::error!(count, error = %e, "dropping batch after failed write");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "batcher_tests.rs"]
mod tests;
