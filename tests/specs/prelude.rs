//! Shared harness for the specs

pub use ordo_core::{
    ErrorKind, Item, ItemDraft, ItemId, ItemPage, Pagination, ProjectId, RankDelta,
};
pub use ordo_engine::ServiceError;
pub use ordo_storage::{EventRecord, RankStore};
pub use similar_asserts::assert_eq;

use ordo_adapters::{BusPublisher, MemoryCache, MessageBus};
use ordo_engine::{Batcher, IngestHandle, IngestWorker, Orchestrator, OrchestratorConfig, ServiceDeps};
use ordo_storage::{SqliteEventSink, SqliteRankStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const DEFAULT: ProjectId = ProjectId(1);
pub const SUBJECT: &str = "items";

pub type SpecOrchestrator = Orchestrator<SqliteRankStore, MemoryCache, BusPublisher>;

/// Orchestrator, bus and ingest worker over on-disk databases
pub struct Stack {
    pub dir: TempDir,
    pub orchestrator: SpecOrchestrator,
    pub cache: MemoryCache,
    pub bus: MessageBus,
    pub sink: SqliteEventSink,
    pub batcher: Arc<Batcher<SqliteEventSink>>,
    ingest: Option<IngestHandle>,
}

impl Stack {
    pub fn start(batch_size: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let store =
            SqliteRankStore::open(&dir.path().join("items.db"), Duration::from_secs(5)).unwrap();
        let sink = SqliteEventSink::open(&dir.path().join("events.db")).unwrap();
        let cache = MemoryCache::new();
        let bus = MessageBus::new();

        let batcher = Arc::new(Batcher::new(sink.clone(), batch_size));
        let ingest = IngestWorker::new(bus.clone(), Arc::clone(&batcher)).spawn(SUBJECT);
        let orchestrator = Orchestrator::new(
            ServiceDeps {
                store,
                cache: cache.clone(),
                publisher: BusPublisher::new(bus.clone(), SUBJECT),
            },
            OrchestratorConfig {
                cache_ttl: Duration::from_secs(60),
                op_timeout: Duration::from_secs(5),
            },
        );

        Self {
            dir,
            orchestrator,
            cache,
            bus,
            sink,
            batcher,
            ingest: Some(ingest),
        }
    }

    /// Create items in order in one project
    pub async fn seed(&self, project_id: ProjectId, names: &[&str]) -> Vec<Item> {
        let mut items = Vec::new();
        for name in names {
            items.push(
                self.orchestrator
                    .create(project_id, ItemDraft::new(*name))
                    .await
                    .unwrap(),
            );
        }
        items
    }

    /// Every item's rank in a project, as (name, rank) sorted by rank
    pub async fn ranking(&self, project_id: ProjectId) -> Vec<(String, i64)> {
        let page = self
            .orchestrator
            .store()
            .list(Pagination::new(1000, 0))
            .await
            .unwrap();
        let mut ranks: Vec<(String, i64)> = page
            .items
            .into_iter()
            .filter(|item| item.project_id == project_id)
            .map(|item| (item.name, item.priority))
            .collect();
        ranks.sort_by_key(|(_, rank)| *rank);
        ranks
    }

    /// Stop the ingest worker and return the analytical log
    pub async fn stop(&mut self) -> Vec<EventRecord> {
        if let Some(ingest) = self.ingest.take() {
            ingest.shutdown().await.unwrap();
        }
        self.sink.records().await.unwrap()
    }
}

pub fn ranking(pairs: &[(&str, i64)]) -> Vec<(String, i64)> {
    pairs
        .iter()
        .map(|(name, rank)| (name.to_string(), *rank))
        .collect()
}
