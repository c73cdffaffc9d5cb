use crate::middleware::correlation::CorrelationId;
use crate::middleware::user::Requester;
use crate::routes::error::map_error;
use crate::{AppState, build_service};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use cr_events::notice::StoredNotice;
use cr_events::types::EventRecord;
use utoipa::{IntoParams, ToSchema};

/// Sequence-based paging shared by the event and notice feeds.
#[derive(Debug, serde::Deserialize, ToSchema, IntoParams)]
pub struct PageQuery {
    after: Option<i64>,
    limit: Option<u32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/backends", get(list_backends))
        .route("/events", get(list_events))
        .route("/notices", get(list_notices))
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/backends",
    responses((status = 200, body = Vec<String>))
)]
pub(crate) async fn list_backends(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(
        state
            .registry
            .names()
            .into_iter()
            .map(ToString::to_string)
            .collect(),
    )
}

#[utoipa::path(
    get,
    path = "/api/events",
    params(PageQuery),
    responses((status = 200, body = Vec<EventRecord>))
)]
pub(crate) async fn list_events(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Query(query): Query<PageQuery>,
) -> Response {
    let result = build_service(&state)
        .and_then(|service| service.events().list(query.after, query.limit));
    match result {
        Ok(events) => Json(events).into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/notices",
    params(PageQuery),
    responses((status = 200, body = Vec<StoredNotice>))
)]
pub(crate) async fn list_notices(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(user): Requester,
    Query(query): Query<PageQuery>,
) -> Response {
    let result = build_service(&state)
        .and_then(|service| service.notices().list(&user, query.after, query.limit));
    match result {
        Ok(notices) => Json(notices).into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}
