// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

const P: ProjectId = ProjectId(1);

async fn seeded(names: &[&str]) -> (MemoryRankStore, Vec<Item>) {
    let store = MemoryRankStore::new();
    let mut items = Vec::new();
    for name in names {
        items.push(store.create(P, &ItemDraft::new(*name)).await.unwrap());
    }
    (store, items)
}

#[tokio::test]
async fn fresh_store_holds_the_default_project() {
    let store = MemoryRankStore::new();
    let created = store.create(P, &ItemDraft::new("a")).await.unwrap();
    assert_eq!(created.project_id, P);

    let next = store.create_project("second").await.unwrap();
    assert_eq!(next.id, ProjectId(2));
}

#[tokio::test]
async fn failed_reorder_leaves_no_partial_shift() {
    let (store, items) = seeded(&["A", "B", "C", "D"]).await;
    let before = store.ranks(P).await;

    store.fail_next(StoreOp::Reorder);
    let err = store.reorder(P, items[3].id, 1).await.unwrap_err();

    assert!(matches!(err, StoreError::Backend(_)));
    assert_eq!(store.ranks(P).await, before);

    // the fault is consumed
    store.reorder(P, items[3].id, 1).await.unwrap();
    assert_eq!(store.ranks(P).await[&items[3].id], 1);
}

#[tokio::test]
async fn failed_create_does_not_consume_a_rank() {
    let (store, _) = seeded(&["A"]).await;

    store.fail_next(StoreOp::Create);
    assert!(store.create(P, &ItemDraft::new("B")).await.is_err());

    let next = store.create(P, &ItemDraft::new("C")).await.unwrap();
    assert_eq!(next.priority, 2);
}

#[tokio::test]
async fn abandoned_reorder_rolls_back() {
    let (store, items) = seeded(&["A", "B", "C"]).await;
    let before = store.ranks(P).await;
    store.set_latency(Some(Duration::from_millis(500)));

    let result = tokio::time::timeout(
        Duration::from_millis(20),
        store.reorder(P, items[2].id, 1),
    )
    .await;

    assert!(result.is_err());
    store.set_latency(None);
    assert_eq!(store.ranks(P).await, before);
}

#[tokio::test]
async fn calls_are_recorded_in_order() {
    let (store, items) = seeded(&["A"]).await;
    store.get(P, items[0].id).await.unwrap();
    store.list(Pagination::default()).await.unwrap();

    assert_eq!(
        store.calls(),
        vec![
            StoreCall::Create {
                project_id: P,
                name: "A".into()
            },
            StoreCall::Get {
                project_id: P,
                id: items[0].id
            },
            StoreCall::List {
                page: Pagination::default()
            },
        ]
    );
}

#[tokio::test]
async fn negative_pagination_is_clamped() {
    let (store, _) = seeded(&["A", "B"]).await;
    let page = store.list(Pagination::new(-1, -5)).await.unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.meta.total, 2);
}
