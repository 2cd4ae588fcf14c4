//! Reorder specs
//!
//! Ranks stay a dense permutation and every shifted item is reported.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[tokio::test]
async fn move_to_top_shifts_the_items_in_between() {
    let stack = Stack::start(10);
    let items = stack.seed(DEFAULT, &["A", "B", "C", "D"]).await;

    let deltas = stack
        .orchestrator
        .reorder(DEFAULT, items[2].id, 1)
        .await
        .unwrap();

    assert_eq!(
        deltas,
        vec![
            RankDelta::new(items[0].id, 2),
            RankDelta::new(items[1].id, 3),
            RankDelta::new(items[2].id, 1),
        ]
    );
    assert_eq!(
        stack.ranking(DEFAULT).await,
        ranking(&[("C", 1), ("A", 2), ("B", 3), ("D", 4)])
    );
}

#[tokio::test]
async fn move_down_shifts_the_items_in_between_up() {
    let stack = Stack::start(10);
    let items = stack.seed(DEFAULT, &["A", "B", "C", "D"]).await;

    let deltas = stack
        .orchestrator
        .reorder(DEFAULT, items[0].id, 4)
        .await
        .unwrap();

    assert_eq!(deltas.len(), 4);
    assert_eq!(deltas.last(), Some(&RankDelta::new(items[0].id, 4)));
    assert_eq!(
        stack.ranking(DEFAULT).await,
        ranking(&[("B", 1), ("C", 2), ("D", 3), ("A", 4)])
    );
}

#[tokio::test]
async fn reorder_there_and_back_restores_ranks() {
    let stack = Stack::start(10);
    let items = stack.seed(DEFAULT, &["A", "B", "C", "D", "E"]).await;
    let before = stack.ranking(DEFAULT).await;

    stack
        .orchestrator
        .reorder(DEFAULT, items[1].id, 5)
        .await
        .unwrap();
    stack
        .orchestrator
        .reorder(DEFAULT, items[1].id, 2)
        .await
        .unwrap();

    assert_eq!(stack.ranking(DEFAULT).await, before);
}

#[tokio::test]
async fn same_rank_reports_only_the_target() {
    let stack = Stack::start(10);
    let items = stack.seed(DEFAULT, &["A", "B", "C"]).await;

    let deltas = stack
        .orchestrator
        .reorder(DEFAULT, items[1].id, 2)
        .await
        .unwrap();

    assert_eq!(deltas, vec![RankDelta::new(items[1].id, 2)]);
    assert_eq!(
        stack.ranking(DEFAULT).await,
        ranking(&[("A", 1), ("B", 2), ("C", 3)])
    );
}

#[tokio::test]
async fn removed_items_keep_their_rank_and_still_shift() {
    let stack = Stack::start(10);
    let items = stack.seed(DEFAULT, &["A", "B", "C"]).await;
    stack.orchestrator.remove(DEFAULT, items[1].id).await.unwrap();

    stack
        .orchestrator
        .reorder(DEFAULT, items[2].id, 1)
        .await
        .unwrap();

    assert_eq!(
        stack.ranking(DEFAULT).await,
        ranking(&[("C", 1), ("A", 2), ("B", 3)])
    );
}

#[tokio::test]
async fn rank_outside_the_project_is_rejected() {
    let stack = Stack::start(10);
    let items = stack.seed(DEFAULT, &["A", "B"]).await;

    for rank in [0, 3, -1] {
        let err = stack
            .orchestrator
            .reorder(DEFAULT, items[0].id, rank)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert_eq!(
        stack.ranking(DEFAULT).await,
        ranking(&[("A", 1), ("B", 2)])
    );
}

#[tokio::test]
async fn projects_rank_independently() {
    let stack = Stack::start(10);
    let other = stack
        .orchestrator
        .store()
        .create_project("other")
        .await
        .unwrap()
        .id;
    let mine = stack.seed(DEFAULT, &["A", "B"]).await;
    stack.seed(other, &["X", "Y"]).await;

    stack
        .orchestrator
        .reorder(DEFAULT, mine[1].id, 1)
        .await
        .unwrap();

    assert_eq!(stack.ranking(other).await, ranking(&[("X", 1), ("Y", 2)]));
    assert_eq!(
        stack.ranking(DEFAULT).await,
        ranking(&[("B", 1), ("A", 2)])
    );
}

#[tokio::test]
async fn reorder_of_item_in_another_project_is_not_found() {
    let stack = Stack::start(10);
    let other = stack
        .orchestrator
        .store()
        .create_project("other")
        .await
        .unwrap()
        .id;
    let items = stack.seed(other, &["X"]).await;

    let err = stack
        .orchestrator
        .reorder(DEFAULT, items[0].id, 1)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound { .. }));
}
