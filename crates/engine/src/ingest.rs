// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus consumer feeding the batcher
//!
//! Shutdown order: stop taking new messages, unsubscribe, hand the messages
//! already delivered to the batcher, then flush once.

use crate::batcher::Batcher;
use crate::error::IngestError;
use ordo_adapters::{BusMessage, MessageBus, Subscription};
use ordo_storage::EventSink;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Handle to a running ingest worker
pub struct IngestHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), IngestError>>,
}

impl IngestHandle {
    /// Stop the worker and wait for its final flush
    pub async fn shutdown(mut self) -> Result<(), IngestError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        match self.task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "ingest worker panicked");
                Ok(())
            }
        }
    }
}

/// Consumes change events from one bus subject
pub struct IngestWorker<K> {
    bus: MessageBus,
    batcher: Arc<Batcher<K>>,
}

impl<K: EventSink> IngestWorker<K> {
    pub fn new(bus: MessageBus, batcher: Arc<Batcher<K>>) -> Self {
        Self { bus, batcher }
    }

    /// Subscribe to `subject` and process messages on a background task
    ///
    /// The subscription exists when this returns, so nothing published
    /// afterwards is missed.
    pub fn spawn(self, subject: &str) -> IngestHandle {
        let subscription = self.bus.subscribe(subject);
        let (stop_tx, stop_rx) = oneshot::channel();
        tracing::info!(subject, "ingest worker subscribed");

        let task = tokio::spawn(self.run(subscription, stop_rx));
        IngestHandle {
            stop: Some(stop_tx),
            task,
        }
    }

    async fn run(
        self,
        mut subscription: Subscription,
        mut stop: oneshot::Receiver<()>,
    ) -> Result<(), IngestError> {
        loop {
            tokio::select! {
                _ = &mut stop => break,
                message = subscription.next() => match message {
                    Some(message) => self.consume(message).await,
                    None => break,
                },
            }
        }

        self.bus.unsubscribe(subscription.id());
        let mut drained = 0usize;
        while let Some(message) = subscription.try_next() {
            self.consume(message).await;
            drained += 1;
        }

        let result = self.batcher.flush().await;
        match &result {
            Ok(()) => tracing::info!(drained, "ingest worker stopped"),
            Err(e) => tracing::error!(drained, error = %e, "final flush failed"),
        }
        result
    }

    /// Feed one message to the batcher; failures are logged, never fatal
    async fn consume(&self, message: BusMessage) {
        match self.batcher.handle(&message.payload).await {
            Ok(()) => {}
            Err(IngestError::Decode(e)) => {
                tracing::warn!(
                    subject = %message.subject,
                    len = message.payload.len(),
                    error = %e,
                    "skipping event that is not an item record"
                );
            }
            Err(e) => tracing::error!(subject = %message.subject, error = %e, "ingest failed"),
        }
    }
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
