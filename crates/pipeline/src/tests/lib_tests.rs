use std::time::Duration;

use super::*;

const SECOND: Duration = Duration::from_secs(1);

fn pipeline(initial_size: u64) -> MutationPipeline {
    MutationPipeline::new(SharedStore::seeded(initial_size), FlushSchedule::default())
}

async fn selected(pipeline: &MutationPipeline) -> Vec<ItemId> {
    pipeline.store().read().await.selected_order()
}

#[tokio::test(start_paused = true)]
async fn select_is_applied_only_after_its_window_closes() {
    let pipeline = pipeline(100);
    assert_eq!(pipeline.submit_select(ItemId(7)), Ok(Submission::Queued));

    tokio::time::advance(Duration::from_millis(999)).await;
    let report = pipeline.flush_due(OperationKind::Select).await;
    assert_eq!(report.applied, 0);
    assert!(selected(&pipeline).await.is_empty());

    tokio::time::advance(Duration::from_millis(1)).await;
    let report = pipeline.flush_due(OperationKind::Select).await;
    assert_eq!(report.applied, 1);
    assert_eq!(selected(&pipeline).await, vec![ItemId(7)]);
}

#[tokio::test(start_paused = true)]
async fn duplicate_submissions_apply_once() {
    let pipeline = pipeline(100);
    assert_eq!(pipeline.submit_select(ItemId(3)), Ok(Submission::Queued));
    assert_eq!(pipeline.submit_select(ItemId(3)), Ok(Submission::AlreadyPending));

    tokio::time::advance(SECOND).await;
    let report = pipeline.flush_due(OperationKind::Select).await;
    assert_eq!((report.applied, report.rejected), (1, 0));
}

#[tokio::test(start_paused = true)]
async fn select_then_deselect_before_flush_leaves_id_unselected() {
    let pipeline = pipeline(100);
    pipeline.submit_select(ItemId(5)).expect("valid");
    pipeline.submit_deselect(ItemId(5)).expect("valid");

    tokio::time::advance(SECOND).await;
    pipeline.flush_due(OperationKind::Select).await;
    let report = pipeline.flush_due(OperationKind::Deselect).await;
    assert_eq!(report.rejected, 1);

    let store = pipeline.store().read().await;
    assert!(!store.is_selected(ItemId(5)));
}

#[tokio::test(start_paused = true)]
async fn rejected_entries_do_not_abort_the_rest_of_the_batch() {
    let pipeline = pipeline(10);
    for id in [2, 99, 4] {
        pipeline.submit_select(ItemId(id)).expect("valid");
    }

    tokio::time::advance(SECOND).await;
    let report = pipeline.flush_due(OperationKind::Select).await;
    assert_eq!((report.applied, report.rejected), (2, 1));
    assert_eq!(selected(&pipeline).await, vec![ItemId(2), ItemId(4)]);
}

#[tokio::test(start_paused = true)]
async fn reorder_applies_the_latest_intent_with_unnamed_ids_as_tail() {
    let pipeline = pipeline(10);
    for id in [1, 2, 3, 4] {
        pipeline.submit_select(ItemId(id)).expect("valid");
    }
    tokio::time::advance(SECOND).await;
    pipeline.flush_due(OperationKind::Select).await;

    pipeline.submit_reorder(&[2, 1]).expect("valid");
    pipeline.submit_reorder(&[4, 3]).expect("valid");
    tokio::time::advance(SECOND).await;
    let report = pipeline.flush_due(OperationKind::Reorder).await;
    assert_eq!(report.applied, 1);
    assert_eq!(
        selected(&pipeline).await,
        vec![ItemId(4), ItemId(3), ItemId(1), ItemId(2)]
    );
}

#[tokio::test]
async fn invalid_submissions_never_reach_a_queue() {
    let pipeline = pipeline(10);
    assert_eq!(
        pipeline.submit_add(ItemId(0)),
        Err(ValidationError::NotPositive(0))
    );
    assert_eq!(
        pipeline.submit_reorder(&[1, 1]),
        Err(ValidationError::DuplicateInOrder(ItemId(1)))
    );
    assert_eq!(
        pipeline.submit_reorder(&[-4]),
        Err(ValidationError::NotPositive(-4))
    );
    assert_eq!(pipeline.queue_stats().total(), 0);
}

#[tokio::test(start_paused = true)]
async fn added_ids_wait_for_the_membership_window() {
    let pipeline = pipeline(10);
    pipeline.submit_add(ItemId(500)).expect("valid");

    tokio::time::advance(SECOND * 9).await;
    pipeline.flush_due(OperationKind::AddItem).await;
    assert!(!pipeline.store().read().await.contains(ItemId(500)));

    tokio::time::advance(SECOND).await;
    pipeline.flush_due(OperationKind::AddItem).await;
    let page = pipeline
        .list_available(&PageQuery::new("500", 0, 20))
        .await;
    assert_eq!(page.items, vec![ItemId(500)]);
}

#[tokio::test]
async fn drain_all_applies_pending_work_immediately() {
    let pipeline = pipeline(10);
    pipeline.submit_add(ItemId(11)).expect("valid");
    pipeline.submit_select(ItemId(11)).expect("valid");

    let reports = pipeline.drain_all().await;
    let applied: usize = reports.iter().map(|report| report.applied).sum();
    assert_eq!(applied, 2);
    assert_eq!(selected(&pipeline).await, vec![ItemId(11)]);
    assert_eq!(pipeline.queue_stats().total(), 0);
}

#[tokio::test]
async fn listing_clamps_the_page_window() {
    let pipeline = pipeline(100);
    let page = pipeline
        .list_available(&PageQuery {
            filter: None,
            offset: Some("-5".into()),
            limit: Some("500".into()),
        })
        .await;
    assert_eq!(page.offset, 0);
    assert_eq!(page.limit, 20);
    assert_eq!(page.items.len(), 20);
    assert_eq!(page.items[0], ItemId(1));
}

#[tokio::test(start_paused = true)]
async fn spawned_flush_loops_apply_work_and_stop_on_shutdown() {
    let pipeline = Arc::new(pipeline(50));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = pipeline.spawn(shutdown_rx);
    assert_eq!(handles.len(), 4);

    pipeline.submit_select(ItemId(9)).expect("valid");
    pipeline.submit_select(ItemId(1)).expect("valid");
    tokio::time::sleep(SECOND * 2 + Duration::from_millis(10)).await;
    assert_eq!(selected(&pipeline).await, vec![ItemId(9), ItemId(1)]);

    pipeline.submit_reorder(&[1, 9]).expect("valid");
    tokio::time::sleep(SECOND * 2 + Duration::from_millis(10)).await;
    assert_eq!(selected(&pipeline).await, vec![ItemId(1), ItemId(9)]);

    shutdown_tx.send(true).expect("loops listening");
    for handle in handles {
        handle.await.expect("loop exits cleanly");
    }
}
