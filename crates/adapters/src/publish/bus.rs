// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process message bus routing payloads to subject subscribers

use super::{PublishError, Publisher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Subject pattern for subscriptions
///
/// Subjects are `.`-separated tokens. Supports:
///   - Exact: "items"
///   - Single wildcard: "items.*" matches "items.created", not "items.a.b"
///   - Tail wildcard: "items.>" matches "items.a" and "items.a.b"
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectPattern(String);

impl SubjectPattern {
    pub fn new(pattern: &str) -> Self {
        Self(pattern.to_string())
    }

    /// Check if this pattern matches a subject
    pub fn matches(&self, subject: &str) -> bool {
        if self.0.is_empty() || subject.is_empty() {
            return false;
        }
        let pattern: Vec<&str> = self.0.split('.').collect();
        let tokens: Vec<&str> = subject.split('.').collect();
        Self::match_tokens(&pattern, &tokens)
    }

    fn match_tokens(pattern: &[&str], subject: &[&str]) -> bool {
        match (pattern.first(), subject.first()) {
            (None, None) => true,
            // > needs at least one token to consume
            (Some(&">"), Some(_)) => true,
            (Some(&"*"), Some(_)) => Self::match_tokens(&pattern[1..], &subject[1..]),
            (Some(p), Some(s)) if p == s => Self::match_tokens(&pattern[1..], &subject[1..]),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Subscriber handle for unsubscribing
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub String);

/// A payload delivered on a subject
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusMessage {
    pub subject: String,
    pub payload: Vec<u8>,
}

/// Receiving end of a subscription
///
/// After unsubscribing, messages already delivered can still be drained;
/// `next` then returns `None`.
pub struct Subscription {
    id: SubscriptionId,
    pattern: SubjectPattern,
    receiver: mpsc::UnboundedReceiver<BusMessage>,
}

impl Subscription {
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }

    pub fn pattern(&self) -> &SubjectPattern {
        &self.pattern
    }

    /// Wait for the next message
    pub async fn next(&mut self) -> Option<BusMessage> {
        self.receiver.recv().await
    }

    /// Take a message if one is already waiting
    pub fn try_next(&mut self) -> Option<BusMessage> {
        self.receiver.try_recv().ok()
    }
}

type Subscribers = HashMap<SubscriptionId, (SubjectPattern, mpsc::UnboundedSender<BusMessage>)>;

/// The message bus routes published payloads to matching subscribers
#[derive(Clone, Default)]
pub struct MessageBus {
    subscribers: Arc<RwLock<Subscribers>>,
    closed: Arc<AtomicBool>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to subjects matching `pattern`
    pub fn subscribe(&self, pattern: &str) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = SubscriptionId(uuid::Uuid::new_v4().to_string());
        let pattern = SubjectPattern::new(pattern);

        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        subs.insert(id.clone(), (pattern.clone(), tx));

        Subscription {
            id,
            pattern,
            receiver: rx,
        }
    }

    /// Stop delivering to a subscription
    pub fn unsubscribe(&self, id: &SubscriptionId) {
        let mut subs = self.subscribers.write().unwrap_or_else(|e| e.into_inner());
        subs.remove(id);
    }

    /// Deliver a payload to every matching subscriber
    ///
    /// Returns how many subscribers received it; zero is not an error.
    pub fn publish(&self, subject: &str, payload: Vec<u8>) -> Result<usize, PublishError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(PublishError::Closed);
        }

        let subs = self.subscribers.read().unwrap_or_else(|e| e.into_inner());
        let mut delivered = 0;
        for (pattern, tx) in subs.values() {
            if !pattern.matches(subject) {
                continue;
            }
            let message = BusMessage {
                subject: subject.to_string(),
                payload: payload.clone(),
            };
            if tx.send(message).is_ok() {
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    /// Refuse further publishes and end every subscription
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Get count of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

/// Publisher that sends every payload to one subject of a [`MessageBus`]
#[derive(Clone)]
pub struct BusPublisher {
    bus: MessageBus,
    subject: String,
}

impl BusPublisher {
    pub fn new(bus: MessageBus, subject: impl Into<String>) -> Self {
        Self {
            bus,
            subject: subject.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[async_trait]
impl Publisher for BusPublisher {
    async fn publish(&self, payload: &[u8]) -> Result<(), PublishError> {
        self.bus.publish(&self.subject, payload.to_vec())?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
