use crate::middleware::correlation::CorrelationId;
use crate::middleware::user::Requester;
use crate::routes::error::map_error;
use crate::{AppState, build_service};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use cr_core::groups::Group;
use cr_core::types::{
    BrowseQuery, BrowseResult, Commit, CommitDetail, CommitsQuery, CreateRegistrationInput,
    GroupRef, Registration, UpdateRegistrationInput,
};
use cr_core::{CodeRepos, CodeReposError, RequestContext};
use cr_db::store::DbStore;
use cr_events::types::EventSource;
use serde::Serialize;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/repos", get(list_repos).post(create_repo))
        .route(
            "/repos/{slug}",
            get(get_repo).patch(edit_repo).delete(delete_repo),
        )
        .route("/repos/{slug}/commits", get(list_commits))
        .route("/repos/{slug}/commits/{commit_id}", get(view_commit))
        .route("/repos/{slug}/browse", get(browse))
        .route(
            "/groups/{kind}/{group_id}/repos",
            get(group_list_repos).post(group_create_repo),
        )
        .route(
            "/groups/{kind}/{group_id}/repos/{slug}",
            get(group_get_repo)
                .patch(group_edit_repo)
                .delete(group_delete_repo),
        )
        .route(
            "/groups/{kind}/{group_id}/repos/{slug}/commits",
            get(group_list_commits),
        )
        .route(
            "/groups/{kind}/{group_id}/repos/{slug}/commits/{commit_id}",
            get(group_view_commit),
        )
        .route(
            "/groups/{kind}/{group_id}/repos/{slug}/browse",
            get(group_browse),
        )
        .with_state(state)
}

/// Runs `f` against a per-request service, inside `scope` when the route is
/// group scoped. The group is loaded fresh so membership is current.
fn run<T: Serialize>(
    state: &AppState,
    correlation: CorrelationId,
    scope: Option<GroupRef>,
    status: StatusCode,
    f: impl FnOnce(&CodeRepos<DbStore>, Option<&dyn Group>, &RequestContext) -> Result<T, CodeReposError>,
) -> Response {
    let ctx = RequestContext::new(EventSource::Api, Some(correlation.0));
    let result = build_service(state).and_then(|service| match &scope {
        Some(group) => {
            let group = service.groups().resolve(group)?;
            f(&service, Some(&group), &ctx)
        }
        None => f(&service, None, &ctx),
    });
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(err) => map_error(&err, ctx.correlation_id).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/repos",
    responses((status = 200, body = Vec<Registration>))
)]
pub(crate) async fn list_repos(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(_user): Requester,
) -> Response {
    run(&state, correlation, None, StatusCode::OK, |service, group, _| {
        service.registrations().list(group)
    })
}

#[utoipa::path(
    post,
    path = "/api/repos",
    request_body = CreateRegistrationInput,
    responses((status = 201, body = Registration))
)]
pub(crate) async fn create_repo(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(user): Requester,
    Json(input): Json<CreateRegistrationInput>,
) -> Response {
    run(&state, correlation, None, StatusCode::CREATED, |service, group, ctx| {
        service.registrations().create(ctx, &user, group, input)
    })
}

#[utoipa::path(
    get,
    path = "/api/repos/{slug}",
    params(("slug" = String, Path, description = "Repository slug")),
    responses((status = 200, body = Registration))
)]
pub(crate) async fn get_repo(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(_user): Requester,
    Path(slug): Path<String>,
) -> Response {
    run(&state, correlation, None, StatusCode::OK, |service, group, _| {
        service.registrations().get(group, &slug)
    })
}

#[utoipa::path(
    patch,
    path = "/api/repos/{slug}",
    params(("slug" = String, Path, description = "Repository slug")),
    request_body = UpdateRegistrationInput,
    responses((status = 200, body = Registration))
)]
pub(crate) async fn edit_repo(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(user): Requester,
    Path(slug): Path<String>,
    Json(input): Json<UpdateRegistrationInput>,
) -> Response {
    run(&state, correlation, None, StatusCode::OK, |service, group, ctx| {
        service.registrations().edit(ctx, &user, group, &slug, input)
    })
}

#[utoipa::path(
    delete,
    path = "/api/repos/{slug}",
    params(("slug" = String, Path, description = "Repository slug")),
    responses((status = 200))
)]
pub(crate) async fn delete_repo(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(user): Requester,
    Path(slug): Path<String>,
) -> Response {
    run(&state, correlation, None, StatusCode::OK, |service, group, ctx| {
        service.registrations().delete(ctx, &user, group, &slug)?;
        Ok(serde_json::json!({ "ok": true }))
    })
}

#[utoipa::path(
    get,
    path = "/api/repos/{slug}/commits",
    params(("slug" = String, Path, description = "Repository slug"), CommitsQuery),
    responses((status = 200, body = Vec<Commit>))
)]
pub(crate) async fn list_commits(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(_user): Requester,
    Path(slug): Path<String>,
    Query(query): Query<CommitsQuery>,
) -> Response {
    run(&state, correlation, None, StatusCode::OK, |service, group, _| {
        service.browser().recent_commits(group, &slug, &query)
    })
}

#[utoipa::path(
    get,
    path = "/api/repos/{slug}/commits/{commit_id}",
    params(
        ("slug" = String, Path, description = "Repository slug"),
        ("commit_id" = String, Path, description = "Commit id or revision")
    ),
    responses((status = 200, body = CommitDetail))
)]
pub(crate) async fn view_commit(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(_user): Requester,
    Path((slug, commit_id)): Path<(String, String)>,
) -> Response {
    run(&state, correlation, None, StatusCode::OK, |service, group, _| {
        service.browser().view_commit(group, &slug, &commit_id)
    })
}

#[utoipa::path(
    get,
    path = "/api/repos/{slug}/browse",
    params(("slug" = String, Path, description = "Repository slug"), BrowseQuery),
    responses((status = 200, body = BrowseResult))
)]
pub(crate) async fn browse(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(_user): Requester,
    Path(slug): Path<String>,
    Query(query): Query<BrowseQuery>,
) -> Response {
    run(&state, correlation, None, StatusCode::OK, |service, group, _| {
        service
            .browser()
            .browse(group, &slug, &query.path, query.rev.as_deref())
    })
}

#[utoipa::path(
    get,
    path = "/api/groups/{kind}/{group_id}/repos",
    params(
        ("kind" = String, Path, description = "Group kind"),
        ("group_id" = String, Path, description = "Group id")
    ),
    responses((status = 200, body = Vec<Registration>))
)]
pub(crate) async fn group_list_repos(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(_user): Requester,
    Path((kind, group_id)): Path<(String, String)>,
) -> Response {
    let scope = Some(GroupRef::new(kind, group_id));
    run(&state, correlation, scope, StatusCode::OK, |service, group, _| {
        service.registrations().list(group)
    })
}

#[utoipa::path(
    post,
    path = "/api/groups/{kind}/{group_id}/repos",
    params(
        ("kind" = String, Path, description = "Group kind"),
        ("group_id" = String, Path, description = "Group id")
    ),
    request_body = CreateRegistrationInput,
    responses((status = 201, body = Registration))
)]
pub(crate) async fn group_create_repo(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(user): Requester,
    Path((kind, group_id)): Path<(String, String)>,
    Json(input): Json<CreateRegistrationInput>,
) -> Response {
    let scope = Some(GroupRef::new(kind, group_id));
    run(&state, correlation, scope, StatusCode::CREATED, |service, group, ctx| {
        service.registrations().create(ctx, &user, group, input)
    })
}

#[utoipa::path(
    get,
    path = "/api/groups/{kind}/{group_id}/repos/{slug}",
    params(
        ("kind" = String, Path, description = "Group kind"),
        ("group_id" = String, Path, description = "Group id"),
        ("slug" = String, Path, description = "Repository slug")
    ),
    responses((status = 200, body = Registration))
)]
pub(crate) async fn group_get_repo(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(_user): Requester,
    Path((kind, group_id, slug)): Path<(String, String, String)>,
) -> Response {
    let scope = Some(GroupRef::new(kind, group_id));
    run(&state, correlation, scope, StatusCode::OK, |service, group, _| {
        service.registrations().get(group, &slug)
    })
}

#[utoipa::path(
    patch,
    path = "/api/groups/{kind}/{group_id}/repos/{slug}",
    params(
        ("kind" = String, Path, description = "Group kind"),
        ("group_id" = String, Path, description = "Group id"),
        ("slug" = String, Path, description = "Repository slug")
    ),
    request_body = UpdateRegistrationInput,
    responses((status = 200, body = Registration))
)]
pub(crate) async fn group_edit_repo(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(user): Requester,
    Path((kind, group_id, slug)): Path<(String, String, String)>,
    Json(input): Json<UpdateRegistrationInput>,
) -> Response {
    let scope = Some(GroupRef::new(kind, group_id));
    run(&state, correlation, scope, StatusCode::OK, |service, group, ctx| {
        service.registrations().edit(ctx, &user, group, &slug, input)
    })
}

#[utoipa::path(
    delete,
    path = "/api/groups/{kind}/{group_id}/repos/{slug}",
    params(
        ("kind" = String, Path, description = "Group kind"),
        ("group_id" = String, Path, description = "Group id"),
        ("slug" = String, Path, description = "Repository slug")
    ),
    responses((status = 200))
)]
pub(crate) async fn group_delete_repo(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(user): Requester,
    Path((kind, group_id, slug)): Path<(String, String, String)>,
) -> Response {
    let scope = Some(GroupRef::new(kind, group_id));
    run(&state, correlation, scope, StatusCode::OK, |service, group, ctx| {
        service.registrations().delete(ctx, &user, group, &slug)?;
        Ok(serde_json::json!({ "ok": true }))
    })
}

#[utoipa::path(
    get,
    path = "/api/groups/{kind}/{group_id}/repos/{slug}/commits",
    params(
        ("kind" = String, Path, description = "Group kind"),
        ("group_id" = String, Path, description = "Group id"),
        ("slug" = String, Path, description = "Repository slug"),
        CommitsQuery
    ),
    responses((status = 200, body = Vec<Commit>))
)]
pub(crate) async fn group_list_commits(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(_user): Requester,
    Path((kind, group_id, slug)): Path<(String, String, String)>,
    Query(query): Query<CommitsQuery>,
) -> Response {
    let scope = Some(GroupRef::new(kind, group_id));
    run(&state, correlation, scope, StatusCode::OK, |service, group, _| {
        service.browser().recent_commits(group, &slug, &query)
    })
}

#[utoipa::path(
    get,
    path = "/api/groups/{kind}/{group_id}/repos/{slug}/commits/{commit_id}",
    params(
        ("kind" = String, Path, description = "Group kind"),
        ("group_id" = String, Path, description = "Group id"),
        ("slug" = String, Path, description = "Repository slug"),
        ("commit_id" = String, Path, description = "Commit id or revision")
    ),
    responses((status = 200, body = CommitDetail))
)]
pub(crate) async fn group_view_commit(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(_user): Requester,
    Path((kind, group_id, slug, commit_id)): Path<(String, String, String, String)>,
) -> Response {
    let scope = Some(GroupRef::new(kind, group_id));
    run(&state, correlation, scope, StatusCode::OK, |service, group, _| {
        service.browser().view_commit(group, &slug, &commit_id)
    })
}

#[utoipa::path(
    get,
    path = "/api/groups/{kind}/{group_id}/repos/{slug}/browse",
    params(
        ("kind" = String, Path, description = "Group kind"),
        ("group_id" = String, Path, description = "Group id"),
        ("slug" = String, Path, description = "Repository slug"),
        BrowseQuery
    ),
    responses((status = 200, body = BrowseResult))
)]
pub(crate) async fn group_browse(
    State(state): State<AppState>,
    Extension(correlation): Extension<CorrelationId>,
    Requester(_user): Requester,
    Path((kind, group_id, slug)): Path<(String, String, String)>,
    Query(query): Query<BrowseQuery>,
) -> Response {
    let scope = Some(GroupRef::new(kind, group_id));
    run(&state, correlation, scope, StatusCode::OK, |service, group, _| {
        service
            .browser()
            .browse(group, &slug, &query.path, query.rev.as_deref())
    })
}
