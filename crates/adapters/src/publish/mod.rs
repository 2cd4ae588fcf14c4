// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Change publishing adapters

mod bus;

pub use bus::{BusMessage, BusPublisher, MessageBus, SubjectPattern, Subscription, SubscriptionId};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePublisher;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from publish operations
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("message bus is closed")]
    Closed,
    #[error("publish failed: {0}")]
    Transport(String),
}

/// Fire-and-forget publisher bound to one subject
///
/// No batching and no retry; order is kept per publisher instance only.
#[async_trait]
pub trait Publisher: Clone + Send + Sync + 'static {
    async fn publish(&self, payload: &[u8]) -> Result<(), PublishError>;
}
