use crate::middleware::correlation::CorrelationId;
use crate::middleware::user::Requester;
use crate::routes::error::map_error;
use crate::{AppState, build_service};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Extension, Json, Router};
use cr_core::types::{GroupRef, MemberGroup, UserId};
use cr_core::{CodeReposError, error::GroupError};
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGroupInput {
    pub kind: String,
    pub id: String,
    pub name: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/groups", get(list_groups).post(create_group))
        .route("/groups/{kind}/{group_id}", get(get_group))
        .route(
            "/groups/{kind}/{group_id}/members/{user_id}",
            put(add_member).delete(remove_member),
        )
        .with_state(state)
}

fn respond<T: serde::Serialize>(
    result: Result<T, CodeReposError>,
    status: StatusCode,
    correlation: CorrelationId,
) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(err) => map_error(&err, Some(correlation.0)).into_response(),
    }
}

fn parse_user(user_id: String) -> Result<UserId, CodeReposError> {
    UserId::new(user_id).map_err(|err| {
        GroupError::InvalidInput {
            message: err.to_string(),
        }
        .into()
    })
}

#[utoipa::path(
    get,
    path = "/api/groups",
    responses((status = 200, body = Vec<MemberGroup>))
)]
pub(crate) async fn list_groups(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(_user): Requester,
) -> Response {
    let result = build_service(&state).and_then(|service| service.groups().list());
    respond(result, StatusCode::OK, correlation)
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupInput,
    responses((status = 201, body = MemberGroup))
)]
pub(crate) async fn create_group(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(user): Requester,
    Json(input): Json<CreateGroupInput>,
) -> Response {
    let result = build_service(&state).and_then(|service| {
        let group = GroupRef::new(input.kind, input.id);
        service.groups().create(group.clone(), &input.name)?;
        // The creator is the group's first member.
        service.groups().add_member(&group, &user)?;
        service.groups().resolve(&group)
    });
    respond(result, StatusCode::CREATED, correlation)
}

#[utoipa::path(
    get,
    path = "/api/groups/{kind}/{group_id}",
    params(
        ("kind" = String, Path, description = "Group kind"),
        ("group_id" = String, Path, description = "Group id")
    ),
    responses((status = 200, body = MemberGroup))
)]
pub(crate) async fn get_group(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(_user): Requester,
    Path((kind, group_id)): Path<(String, String)>,
) -> Response {
    let result = build_service(&state)
        .and_then(|service| service.groups().resolve(&GroupRef::new(kind, group_id)));
    respond(result, StatusCode::OK, correlation)
}

#[utoipa::path(
    put,
    path = "/api/groups/{kind}/{group_id}/members/{user_id}",
    params(
        ("kind" = String, Path, description = "Group kind"),
        ("group_id" = String, Path, description = "Group id"),
        ("user_id" = String, Path, description = "Member to add")
    ),
    responses(
        (status = 200, body = MemberGroup),
        (status = 403, description = "Caller is not a member")
    )
)]
pub(crate) async fn add_member(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(actor): Requester,
    Path((kind, group_id, user_id)): Path<(String, String, String)>,
) -> Response {
    let result = build_service(&state).and_then(|service| {
        let group = GroupRef::new(kind, group_id);
        service.groups().admit(&actor, &group, &parse_user(user_id)?)
    });
    respond(result, StatusCode::OK, correlation)
}

#[utoipa::path(
    delete,
    path = "/api/groups/{kind}/{group_id}/members/{user_id}",
    params(
        ("kind" = String, Path, description = "Group kind"),
        ("group_id" = String, Path, description = "Group id"),
        ("user_id" = String, Path, description = "Member to remove")
    ),
    responses(
        (status = 200, body = MemberGroup),
        (status = 403, description = "Caller is not a member")
    )
)]
pub(crate) async fn remove_member(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(actor): Requester,
    Path((kind, group_id, user_id)): Path<(String, String, String)>,
) -> Response {
    let result = build_service(&state).and_then(|service| {
        let group = GroupRef::new(kind, group_id);
        service.groups().dismiss(&actor, &group, &parse_user(user_id)?)
    });
    respond(result, StatusCode::OK, correlation)
}
