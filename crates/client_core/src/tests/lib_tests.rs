use std::sync::Arc;

use super::*;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use shared::{domain::OperationKind, error::ErrorCode};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct ServerState {
    selected: Arc<Vec<ItemId>>,
    reorders: Arc<Mutex<Vec<Vec<i64>>>>,
    selects: Arc<Mutex<Vec<i64>>>,
}

async fn handle_list_selected(
    State(state): State<ServerState>,
    Query(q): Query<PageQuery>,
) -> Json<ItemsPage> {
    let (offset, limit) = (q.offset(), q.limit());
    let items = state
        .selected
        .iter()
        .copied()
        .filter(|id| id.to_string().contains(q.filter()))
        .skip(offset)
        .take(limit)
        .collect();
    Json(ItemsPage {
        items,
        offset,
        limit,
    })
}

async fn handle_select(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<QueuedResponse>), (StatusCode, Json<ApiError>)> {
    let mut selects = state.selects.lock().await;
    if selects.contains(&id) {
        return Err((
            StatusCode::CONFLICT,
            Json(ApiError::new(ErrorCode::AlreadyQueued, "already queued")),
        ));
    }
    selects.push(id);
    Ok((
        StatusCode::ACCEPTED,
        Json(QueuedResponse {
            kind: OperationKind::Select,
            id: Some(ItemId(id as u64)),
            message: "queued".into(),
        }),
    ))
}

async fn handle_reorder(
    State(state): State<ServerState>,
    Json(req): Json<ReorderRequest>,
) -> (StatusCode, Json<QueuedResponse>) {
    state.reorders.lock().await.push(req.order);
    (
        StatusCode::ACCEPTED,
        Json(QueuedResponse {
            kind: OperationKind::Reorder,
            id: None,
            message: "queued".into(),
        }),
    )
}

async fn spawn_selection_server(selected: Vec<ItemId>) -> anyhow::Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState {
        selected: Arc::new(selected),
        reorders: Arc::new(Mutex::new(Vec::new())),
        selects: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/api/selected", get(handle_list_selected))
        .route("/api/selected/reorder", put(handle_reorder))
        .route("/api/selected/:id", post(handle_select))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

#[test]
fn rejects_unparseable_server_url() {
    assert!(matches!(
        SelectionClient::new("not a url"),
        Err(ClientError::InvalidUrl(_))
    ));
}

#[tokio::test]
async fn fetch_all_selected_walks_every_page() {
    let selected: Vec<ItemId> = (1..=45).map(ItemId).collect();
    let (server_url, _state) = spawn_selection_server(selected.clone())
        .await
        .expect("spawn server");
    let client = SelectionClient::new(&server_url).expect("client");

    let all = client.fetch_all_selected("").await.expect("pages");
    assert_eq!(all, selected);

    let filtered = client.fetch_all_selected("4").await.expect("pages");
    let expected: Vec<ItemId> = [4, 14, 24, 34, 40, 41, 42, 43, 44, 45]
        .into_iter()
        .map(ItemId)
        .collect();
    assert_eq!(filtered, expected);
}

#[tokio::test]
async fn conflict_answers_surface_as_already_queued() {
    let (server_url, state) = spawn_selection_server(Vec::new())
        .await
        .expect("spawn server");
    let client = SelectionClient::new(&server_url).expect("client");

    let queued = client.select_item(ItemId(9)).await.expect("first select");
    assert_eq!(queued.id, Some(ItemId(9)));

    let error = client
        .select_item(ItemId(9))
        .await
        .expect_err("second select conflicts");
    assert!(error.is_already_queued());
    assert_eq!(*state.selects.lock().await, vec![9]);
}

#[tokio::test]
async fn dragged_order_reaches_the_server_through_the_submission_queue() {
    let selected: Vec<ItemId> = [7, 100, 17, 200, 27].into_iter().map(ItemId).collect();
    let (server_url, state) = spawn_selection_server(selected.clone())
        .await
        .expect("spawn server");
    let client = SelectionClient::new(&server_url).expect("client");

    let mut list = SelectedList::new(
        client.fetch_all_selected("").await.expect("selected"),
        "7",
    );
    let order = list
        .drag(ItemId(27), ItemId(7))
        .expect("reconciles")
        .expect("order changed");

    let queue = SubmissionQueue::new(client, batching::FlushSchedule::default());
    queue.queue_reorder(order);
    let outcome = queue.flush_all().await;
    assert_eq!(outcome, FlushOutcome { sent: 1, failed: 0 });

    assert_eq!(*state.reorders.lock().await, vec![vec![27, 100, 7, 200, 17]]);
}
