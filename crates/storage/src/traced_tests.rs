// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{MemoryEventSink, MemoryRankStore, StoreOp};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

const P: ProjectId = ProjectId(1);

#[test]
fn reorder_logs_span_and_shift_count() {
    let (logs, result) = with_tracing(|| async {
        let store = TracedRankStore::new(MemoryRankStore::new());
        for name in ["a", "b", "c"] {
            store.create(P, &ItemDraft::new(name)).await.unwrap();
        }
        store.reorder(P, ItemId(3), 1).await
    });

    assert_eq!(result.unwrap().len(), 3);
    assert!(logs.contains("store.reorder"), "Logs:\n{logs}");
    assert!(logs.contains("new_rank=1"), "Logs:\n{logs}");
    assert!(logs.contains("ranks shifted"), "Logs:\n{logs}");
    assert!(logs.contains("count=3"), "Logs:\n{logs}");
    assert!(logs.contains("elapsed_ms"), "Logs:\n{logs}");
}

#[test]
fn store_failure_logs_error() {
    let (logs, result) = with_tracing(|| async {
        let memory = MemoryRankStore::new();
        let store = TracedRankStore::new(memory.clone());
        let item = store.create(P, &ItemDraft::new("a")).await.unwrap();
        memory.fail_next(StoreOp::Remove);
        store.remove(P, item.id).await
    });

    assert!(result.is_err());
    assert!(logs.contains("ERROR"), "Logs:\n{logs}");
    assert!(logs.contains("injected Remove failure"), "Logs:\n{logs}");
}

#[test]
fn missing_item_is_not_logged_as_error() {
    let (logs, result) = with_tracing(|| async {
        let store = TracedRankStore::new(MemoryRankStore::new());
        store.update(P, ItemId(9), &ItemDraft::new("x")).await
    });

    assert!(matches!(result, Err(StoreError::NotFound { .. })));
    assert!(!logs.contains("ERROR"), "Logs:\n{logs}");
    assert!(logs.contains("rejected"), "Logs:\n{logs}");
}

#[test]
fn sink_logs_batch_size() {
    let (logs, result) = with_tracing(|| async {
        let sink = TracedEventSink::new(MemoryEventSink::new());
        sink.write_batch(&[]).await
    });

    assert!(result.is_ok());
    assert!(logs.contains("sink.write_batch"), "Logs:\n{logs}");
    assert!(logs.contains("count=0"), "Logs:\n{logs}");
    assert!(logs.contains("batch written"), "Logs:\n{logs}");
}

#[test]
fn sink_failure_logs_error() {
    let (logs, result) = with_tracing(|| async {
        let memory = MemoryEventSink::new();
        memory.fail_next();
        TracedEventSink::new(memory).write_batch(&[]).await
    });

    assert!(result.is_err());
    assert!(logs.contains("batch write failed"), "Logs:\n{logs}");
}
