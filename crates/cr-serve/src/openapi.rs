use utoipa::OpenApi;

use crate::routes::groups::CreateGroupInput;
use crate::routes::meta::PageQuery;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use cr_core::types::{
    BrowseQuery, BrowseResult, ChangeKind, ChangedFile, Commit, CommitDetail, CommitsQuery,
    CreateRegistrationInput, FileContents, FolderEntry, GroupRef, MemberGroup, Registration,
    RegistrationId, UpdateRegistrationInput, UserId,
};
use cr_events::notice::StoredNotice;
use cr_events::types::{EventRecord, EventSource};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::repos::list_repos,
        crate::routes::repos::create_repo,
        crate::routes::repos::get_repo,
        crate::routes::repos::edit_repo,
        crate::routes::repos::delete_repo,
        crate::routes::repos::list_commits,
        crate::routes::repos::view_commit,
        crate::routes::repos::browse,
        crate::routes::repos::group_list_repos,
        crate::routes::repos::group_create_repo,
        crate::routes::repos::group_get_repo,
        crate::routes::repos::group_edit_repo,
        crate::routes::repos::group_delete_repo,
        crate::routes::repos::group_list_commits,
        crate::routes::repos::group_view_commit,
        crate::routes::repos::group_browse,
        crate::routes::groups::list_groups,
        crate::routes::groups::create_group,
        crate::routes::groups::get_group,
        crate::routes::groups::add_member,
        crate::routes::groups::remove_member,
        crate::routes::meta::list_backends,
        crate::routes::meta::list_events,
        crate::routes::meta::list_notices,
    ),
    components(schemas(
        Registration,
        CreateRegistrationInput,
        UpdateRegistrationInput,
        Commit,
        CommitDetail,
        ChangedFile,
        ChangeKind,
        FileContents,
        FolderEntry,
        BrowseResult,
        BrowseQuery,
        CommitsQuery,
        GroupRef,
        MemberGroup,
        CreateGroupInput,
        EventRecord,
        PageQuery,
        StoredNotice,
        EventSource,
        RegistrationId,
        UserId
    ))
)]
struct ApiDoc;

pub fn generate_spec() -> String {
    ApiDoc::openapi()
        .to_pretty_json()
        .unwrap_or_else(|_| "{}".to_string())
}

pub fn ensure_initialized() {
    let _ = ApiDoc::openapi();
}

pub fn router() -> Router {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_scoped_routes() {
        let spec: serde_json::Value = serde_json::from_str(&generate_spec()).unwrap();
        let paths = spec["paths"].as_object().unwrap();
        assert!(paths.contains_key("/api/repos/{slug}/browse"));
        assert!(paths.contains_key("/api/groups/{kind}/{group_id}/repos/{slug}"));
        assert!(spec["components"]["schemas"]
            .as_object()
            .unwrap()
            .contains_key("Registration"));
    }
}
