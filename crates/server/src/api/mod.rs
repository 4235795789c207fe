use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use pipeline::Submission;
use shared::{
    domain::{ItemId, OperationKind},
    error::{ApiError, ErrorCode},
    protocol::{
        items_route, queue_route, reorder_route, selected_route, AddItemRequest, ItemsPage,
        PageQuery, QueueStats, QueuedResponse, ReorderRequest,
    },
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::debug;

use crate::app_state::AppState;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub(crate) fn build_router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.max_body_bytes;
    Router::new()
        .route("/healthz", get(healthz))
        .route(items_route(), get(list_items).post(add_item))
        .route(selected_route(), get(list_selected))
        .route(reorder_route(), put(reorder_selected))
        .route(
            &format!("{}/:id", selected_route()),
            post(select_item).delete(deselect_item),
        )
        .route(queue_route(), get(queue_stats))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn list_items(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<ItemsPage>> {
    let Query(q) =
        query.map_err(|rejection| malformed(rejection.status(), rejection.body_text()))?;
    Ok(Json(state.pipeline.list_available(&q).await))
}

async fn list_selected(
    State(state): State<Arc<AppState>>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<ItemsPage>> {
    let Query(q) =
        query.map_err(|rejection| malformed(rejection.status(), rejection.body_text()))?;
    Ok(Json(state.pipeline.list_selected(&q).await))
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AddItemRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<QueuedResponse>)> {
    let Json(req) =
        body.map_err(|rejection| malformed(rejection.status(), rejection.body_text()))?;
    let id = req.id.parse().map_err(validation)?;
    let submission = state.pipeline.submit_add(id).map_err(validation)?;
    queued(OperationKind::AddItem, id, submission, "queued for insertion")
}

async fn select_item(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<(StatusCode, Json<QueuedResponse>)> {
    let id = ItemId::parse(&raw_id).map_err(validation)?;
    let submission = state.pipeline.submit_select(id).map_err(validation)?;
    queued(OperationKind::Select, id, submission, "queued for selection")
}

async fn deselect_item(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<(StatusCode, Json<QueuedResponse>)> {
    let id = ItemId::parse(&raw_id).map_err(validation)?;
    let submission = state.pipeline.submit_deselect(id).map_err(validation)?;
    queued(OperationKind::Deselect, id, submission, "queued for deselection")
}

async fn reorder_selected(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ReorderRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<QueuedResponse>)> {
    let Json(req) =
        body.map_err(|rejection| malformed(rejection.status(), rejection.body_text()))?;
    let len = state
        .pipeline
        .submit_reorder(&req.order)
        .map_err(validation)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(QueuedResponse {
            kind: OperationKind::Reorder,
            id: None,
            message: format!("order of {len} ids queued"),
        }),
    ))
}

async fn queue_stats(State(state): State<Arc<AppState>>) -> Json<QueueStats> {
    Json(state.pipeline.queue_stats())
}

fn queued(
    kind: OperationKind,
    id: ItemId,
    submission: Submission,
    message: &str,
) -> ApiResult<(StatusCode, Json<QueuedResponse>)> {
    match submission {
        Submission::Queued => Ok((
            StatusCode::ACCEPTED,
            Json(QueuedResponse {
                kind,
                id: Some(id),
                message: message.to_string(),
            }),
        )),
        Submission::AlreadyPending => {
            debug!(%kind, %id, "submission folded into pending operation");
            Err((
                StatusCode::CONFLICT,
                Json(ApiError::new(
                    ErrorCode::AlreadyQueued,
                    format!("{kind} of {id} is already queued"),
                )),
            ))
        }
    }
}

/// Bodies and query strings the extractors could not read. An oversized body
/// keeps its 413; everything else is a 400.
fn malformed(status: StatusCode, message: String) -> (StatusCode, Json<ApiError>) {
    let status = if status == StatusCode::PAYLOAD_TOO_LARGE {
        status
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(ApiError::new(ErrorCode::Validation, message)))
}

fn validation(error: shared::error::ValidationError) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError::from(error)))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
