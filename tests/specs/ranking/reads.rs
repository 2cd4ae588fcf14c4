//! Cache-aside read specs

use crate::prelude::*;
use crate::prelude::assert_eq;

#[tokio::test]
async fn get_is_served_from_cache_after_first_read() {
    let stack = Stack::start(10);
    let items = stack.seed(DEFAULT, &["A"]).await;

    let first = stack.orchestrator.get(DEFAULT, items[0].id).await.unwrap();
    assert_eq!(stack.cache.len(), 1);
    let second = stack.orchestrator.get(DEFAULT, items[0].id).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn update_is_visible_on_next_get() {
    let stack = Stack::start(10);
    let items = stack.seed(DEFAULT, &["A"]).await;
    stack.orchestrator.get(DEFAULT, items[0].id).await.unwrap();

    stack
        .orchestrator
        .update(
            DEFAULT,
            items[0].id,
            ItemDraft::new("A prime").with_description("edited"),
        )
        .await
        .unwrap();
    let got = stack.orchestrator.get(DEFAULT, items[0].id).await.unwrap();

    assert_eq!(got.name, "A prime");
    assert_eq!(got.description.as_deref(), Some("edited"));
}

#[tokio::test]
async fn reorder_is_visible_on_next_get_of_shifted_items() {
    let stack = Stack::start(10);
    let items = stack.seed(DEFAULT, &["A", "B", "C"]).await;
    for item in &items {
        stack.orchestrator.get(DEFAULT, item.id).await.unwrap();
    }

    stack
        .orchestrator
        .reorder(DEFAULT, items[2].id, 1)
        .await
        .unwrap();

    let mut ranks = Vec::new();
    for item in &items {
        ranks.push(stack.orchestrator.get(DEFAULT, item.id).await.unwrap().priority);
    }
    assert_eq!(ranks, vec![2, 3, 1]);
}

#[tokio::test]
async fn list_reports_store_wide_counts() {
    let stack = Stack::start(10);
    let other = stack
        .orchestrator
        .store()
        .create_project("other")
        .await
        .unwrap()
        .id;
    let items = stack.seed(DEFAULT, &["A", "B"]).await;
    stack.seed(other, &["X"]).await;
    stack.orchestrator.remove(DEFAULT, items[0].id).await.unwrap();

    let page: ItemPage = stack.orchestrator.list(Pagination::new(2, 0)).await.unwrap();

    assert_eq!(page.meta.total, 3);
    assert_eq!(page.meta.removed, 1);
    assert_eq!(page.meta.limit, 2);
    assert_eq!(page.items.len(), 2);
}

#[tokio::test]
async fn cached_list_is_dropped_by_any_mutation() {
    let stack = Stack::start(10);
    stack.seed(DEFAULT, &["A"]).await;
    let page = Pagination::default();
    assert_eq!(stack.orchestrator.list(page).await.unwrap().items.len(), 1);

    stack.seed(DEFAULT, &["B"]).await;

    let listed = stack.orchestrator.list(page).await.unwrap();
    assert_eq!(listed.meta.total, 2);
    let names: Vec<&str> = listed.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[tokio::test]
async fn empty_name_is_rejected_without_side_effects() {
    let mut stack = Stack::start(1);

    let err = stack
        .orchestrator
        .create(DEFAULT, ItemDraft::new(""))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(stack.ranking(DEFAULT).await, Vec::new());
    assert_eq!(stack.stop().await, Vec::new());
}
