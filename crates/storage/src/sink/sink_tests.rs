// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Utc};
use crate::sink::MemoryEventSink;
use ordo_core::FakeClock;
use tempfile::tempdir;

fn item(id: i64, description: Option<&str>, removed: bool) -> Item {
    Item {
        id: ItemId(id),
        project_id: ProjectId(1),
        name: format!("item-{id}"),
        description: description.map(str::to_string),
        priority: id,
        removed,
        created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn batch_is_flattened_into_rows() {
    let at = Utc.with_ymd_and_hms(2026, 5, 6, 7, 8, 9).unwrap();
    let sink = SqliteEventSink::from_connection(
        Connection::open_in_memory().unwrap(),
        FakeClock::at(at),
    )
    .unwrap();

    sink.write_batch(&[item(1, Some("first"), false), item(2, None, true)])
        .await
        .unwrap();

    let records = sink.records().await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].description, "first");
    assert_eq!(records[0].removed, 0);
    assert_eq!(records[1].description, "");
    assert_eq!(records[1].removed, 1);
    assert!(records.iter().all(|r| r.event_time == at));
}

#[tokio::test]
async fn empty_batch_writes_nothing() {
    let sink = SqliteEventSink::open_in_memory().unwrap();
    sink.write_batch(&[]).await.unwrap();
    assert!(sink.records().await.unwrap().is_empty());
}

#[tokio::test]
async fn batches_append_in_write_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("events.db");
    {
        let sink = SqliteEventSink::open(&path).unwrap();
        sink.write_batch(&[item(1, None, false), item(2, None, false)])
            .await
            .unwrap();
    }

    let sink = SqliteEventSink::open(&path).unwrap();
    sink.write_batch(&[item(3, None, false)]).await.unwrap();

    let ids: Vec<i64> = sink
        .records()
        .await
        .unwrap()
        .iter()
        .map(|r| r.id.0)
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn duplicate_events_are_kept() {
    let sink = SqliteEventSink::open_in_memory().unwrap();
    sink.write_batch(&[item(1, None, false)]).await.unwrap();
    sink.write_batch(&[item(1, None, false)]).await.unwrap();
    assert_eq!(sink.records().await.unwrap().len(), 2);
}

#[tokio::test]
async fn memory_sink_keeps_batch_boundaries() {
    let sink = MemoryEventSink::new();
    sink.write_batch(&[item(1, None, false), item(2, None, false)])
        .await
        .unwrap();
    sink.write_batch(&[item(3, None, false)]).await.unwrap();

    let sizes: Vec<usize> = sink.batches().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 1]);
    assert_eq!(sink.records().len(), 3);
}

#[tokio::test]
async fn memory_sink_failure_stores_nothing() {
    let sink = MemoryEventSink::new();
    sink.fail_next();

    assert!(sink.write_batch(&[item(1, None, false)]).await.is_err());
    assert!(sink.batches().is_empty());

    sink.write_batch(&[item(1, None, false)]).await.unwrap();
    assert_eq!(sink.batches().len(), 1);
}
