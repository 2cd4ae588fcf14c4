// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use fs2::FileExt;
use ordo_adapters::{
    BusPublisher, CacheError, ConfiguredCache, MessageBus, TracedCache, TracedPublisher,
};
use ordo_core::{Config, ConfigError};
use ordo_engine::{
    Batcher, IngestError, IngestHandle, IngestWorker, Orchestrator, OrchestratorConfig,
    ServiceDeps,
};
use ordo_storage::{
    SinkError, SqliteEventSink, SqliteRankStore, StoreError, TracedEventSink, TracedRankStore,
};
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::server::Server;

/// Rank store with tracing
pub type DaemonStore = TracedRankStore<SqliteRankStore>;

/// Cache with tracing
pub type DaemonCache = TracedCache<ConfiguredCache>;

/// Publisher with tracing
pub type DaemonPublisher = TracedPublisher<BusPublisher>;

/// Analytical sink with tracing
pub type DaemonSink = TracedEventSink<SqliteEventSink>;

/// Request server with concrete adapter types
pub type DaemonServer = Server<DaemonStore, DaemonCache, DaemonPublisher, DaemonSink>;

/// Daemon state during operation
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Unix socket listener
    pub listener: UnixListener,
    /// Request dispatch shared with connection tasks
    pub server: DaemonServer,
    bus: MessageBus,
    ingest: Option<IngestHandle>,
    /// Connection tasks still running
    connections: JoinSet<()>,
}

impl DaemonState {
    /// Handle an accepted connection on a task that shutdown waits for
    pub fn serve(&mut self, stream: UnixStream) {
        // Reap finished connections so the set only holds live ones
        while self.connections.try_join_next().is_some() {}

        let server = self.server.clone();
        self.connections.spawn(async move {
            if let Err(e) = server.handle_connection(stream).await {
                error!("Error handling connection: {}", e);
            }
        });
    }

    /// Shutdown the daemon gracefully
    ///
    /// Order: remove the socket so no new client connects, wait for every
    /// connection in flight, then drain and flush the ingest worker and close
    /// the bus. A failed final flush is reported after the lock file is
    /// removed.
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        if self.config.socket_path().exists() {
            if let Err(e) = std::fs::remove_file(self.config.socket_path()) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        let in_flight = self.connections.len();
        if in_flight > 0 {
            info!(in_flight, "waiting for open connections");
        }
        while let Some(joined) = self.connections.join_next().await {
            if let Err(e) = joined {
                error!("Connection task failed: {}", e);
            }
        }

        let flushed = match self.ingest.take() {
            Some(ingest) => ingest.shutdown().await,
            None => Ok(()),
        };
        self.bus.close();

        if self.config.lock_path().exists() {
            if let Err(e) = std::fs::remove_file(self.config.lock_path()) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        flushed?;
        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("Rank store error: {0}")]
    Store(#[from] StoreError),

    #[error("Event sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        // Another daemon owns the lock and its files
        Err(e @ LifecycleError::LockFailed(_)) => Err(e),
        Err(e) => {
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    let lock_path = config.lock_path();
    let socket_path = config.socket_path();

    // 1. Acquire lock file FIRST - prevents races
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID only once the lock is ours
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 2. Open stores before binding (fail fast, don't accept connections if broken)
    let store = SqliteRankStore::open(&config.store_path(), config.store.busy_timeout)?;
    let sink = SqliteEventSink::open(&config.sink_path())?;
    let cache = ConfiguredCache::connect(&config.cache).await?;
    let cache_backend = cache.backend();
    info!(
        store = %config.store_path().display(),
        sink = %config.sink_path().display(),
        cache = %cache_backend,
        "storage ready"
    );

    // 3. Wire the bus: ingest subscribes before the first publish can happen
    let bus = MessageBus::new();
    let batcher = Arc::new(Batcher::new(
        TracedEventSink::new(sink),
        config.ingest.batch_size,
    ));
    let ingest = IngestWorker::new(bus.clone(), Arc::clone(&batcher)).spawn(&config.bus.subject);

    let orchestrator = Orchestrator::new(
        ServiceDeps {
            store: TracedRankStore::new(store),
            cache: TracedCache::new(cache),
            publisher: TracedPublisher::new(BusPublisher::new(
                bus.clone(),
                config.bus.subject.clone(),
            )),
        },
        OrchestratorConfig::from(config),
    );
    let server = Server::new(orchestrator, batcher, cache_backend.to_string());

    // 4. Remove stale socket and bind (LAST - only after all validation passes)
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    let listener = match UnixListener::bind(&socket_path) {
        Ok(listener) => listener,
        Err(e) => {
            bus.close();
            let _ = ingest.shutdown().await;
            return Err(LifecycleError::BindFailed(socket_path, e));
        }
    };

    info!(
        "Daemon started with state in {}",
        config.state_dir.display()
    );

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        server,
        bus,
        ingest: Some(ingest),
        connections: JoinSet::new(),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config) {
    let socket_path = config.socket_path();
    if socket_path.exists() {
        let _ = std::fs::remove_file(&socket_path);
    }

    let lock_path = config.lock_path();
    if lock_path.exists() {
        let _ = std::fs::remove_file(&lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
