// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for the cache and the message bus

pub mod cache;
pub mod publish;
pub mod traced;

pub use cache::{Cache, CacheError, ConfiguredCache, MemoryCache, NoOpCache, RedisCache};
pub use publish::{
    BusMessage, BusPublisher, MessageBus, PublishError, Publisher, SubjectPattern, Subscription,
    SubscriptionId,
};
pub use traced::{TracedCache, TracedPublisher};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use cache::{CacheCall, FakeCache};
#[cfg(any(test, feature = "test-support"))]
pub use publish::FakePublisher;
