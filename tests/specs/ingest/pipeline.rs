//! Ingestion specs
//!
//! Every published item state lands in the analytical log as one flat row.

use crate::prelude::*;
use crate::prelude::assert_eq;

fn rows(records: &[EventRecord]) -> Vec<(i64, String, i64, u8)> {
    records
        .iter()
        .map(|r| (r.id.0, r.name.clone(), r.priority, r.removed))
        .collect()
}

#[tokio::test]
async fn every_mutation_reaches_the_event_log() {
    let mut stack = Stack::start(10);
    let items = stack.seed(DEFAULT, &["A", "B"]).await;
    stack
        .orchestrator
        .update(DEFAULT, items[0].id, ItemDraft::new("A2"))
        .await
        .unwrap();
    stack.orchestrator.remove(DEFAULT, items[1].id).await.unwrap();

    let records = stack.stop().await;

    assert_eq!(
        rows(&records),
        vec![
            (1, "A".to_string(), 1, 0),
            (2, "B".to_string(), 2, 0),
            (1, "A2".to_string(), 1, 0),
            (2, "B".to_string(), 2, 1),
        ]
    );
    assert!(records.iter().all(|r| r.project_id == DEFAULT));
    assert!(records.iter().all(|r| r.description.is_empty()));
}

#[tokio::test]
async fn reorder_deltas_are_not_logged() {
    let mut stack = Stack::start(10);
    let items = stack.seed(DEFAULT, &["A", "B"]).await;
    stack
        .orchestrator
        .reorder(DEFAULT, items[1].id, 1)
        .await
        .unwrap();

    let records = stack.stop().await;

    assert_eq!(records.len(), 2);
    assert_eq!(stack.batcher.stats().rejected, 1);
}

#[tokio::test]
async fn full_batches_are_written_before_shutdown() {
    let mut stack = Stack::start(2);
    stack.seed(DEFAULT, &["A", "B", "C"]).await;

    let mut written = 0;
    for _ in 0..200 {
        written = stack.sink.records().await.unwrap().len();
        if written == 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(written, 2);
    assert_eq!(stack.batcher.buffered(), 1);

    let records = stack.stop().await;
    assert_eq!(records.len(), 3);
    let stats = stack.batcher.stats();
    assert_eq!(stats.batches_written, 2);
    assert_eq!(stats.events_written, 3);
}

#[tokio::test]
async fn description_is_flattened_to_text() {
    let mut stack = Stack::start(10);
    stack
        .orchestrator
        .create(DEFAULT, ItemDraft::new("A").with_description("first item"))
        .await
        .unwrap();

    let records = stack.stop().await;

    assert_eq!(records[0].description, "first item");
}

#[tokio::test]
async fn malformed_bus_traffic_does_not_stop_ingestion() {
    let mut stack = Stack::start(10);
    stack
        .bus
        .publish(SUBJECT, b"{\"unexpected\":true}".to_vec())
        .unwrap();
    stack.seed(DEFAULT, &["A"]).await;

    let records = stack.stop().await;

    assert_eq!(rows(&records), vec![(1, "A".to_string(), 1, 0)]);
    assert_eq!(stack.batcher.stats().rejected, 1);
}

#[tokio::test]
async fn event_log_survives_reopen() {
    let mut stack = Stack::start(10);
    stack.seed(DEFAULT, &["A"]).await;
    stack.stop().await;

    let reopened =
        ordo_storage::SqliteEventSink::open(&stack.dir.path().join("events.db")).unwrap();

    assert_eq!(reopened.records().await.unwrap().len(), 1);
}
