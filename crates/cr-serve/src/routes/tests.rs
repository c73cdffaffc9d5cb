use crate::notices::spawn_recorder;
use crate::{AppState, app};
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use cr_events::bus::EventBus;
use cr_events::notice::NoticeBus;
use cr_vcs::BackendRegistry;
use serde_json::{Value, json};
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tower::ServiceExt;

struct TestApp {
    _dir: TempDir,
    router: Router,
    _recorder: Option<JoinHandle<()>>,
}

impl TestApp {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState {
            db_path: dir.path().join("coderepos.db").to_string_lossy().to_string(),
            event_bus: EventBus::new(16),
            registry: Arc::new(BackendRegistry::with_installed()),
            notices: Some(NoticeBus::new(16)),
        };
        let recorder = spawn_recorder(&state);
        Self {
            _dir: dir,
            router: app(state),
            _recorder: recorder,
        }
    }

    /// Polls `/api/notices` until `user` has `count` notices; they are stored
    /// by a background task.
    async fn notices_for(&self, user: &str, count: usize) -> Vec<Value> {
        for _ in 0..200 {
            let (status, body) = self.call("GET", "/api/notices", Some(user), None).await;
            assert_eq!(status, StatusCode::OK);
            let notices = body.as_array().cloned().unwrap_or_default();
            if notices.len() >= count {
                return notices;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{user} never received {count} notice(s)");
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-correlation-id", "corr-test");
        if let Some(user) = user {
            builder = builder.header("x-user-id", user);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

fn repo_body(slug: &str, location: &str) -> Value {
    json!({
        "name": format!("Repo {slug}"),
        "slug": slug,
        "repository_type": "git",
        "location": location,
    })
}

#[tokio::test]
async fn requests_need_a_user() {
    let app = TestApp::new();
    let (status, body) = app.call("GET", "/api/repos", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthenticated");
    assert_eq!(body["correlation_id"], "corr-test");
}

#[tokio::test]
async fn group_scoped_registration_flow() {
    let app = TestApp::new();
    let (status, group) = app
        .call(
            "POST",
            "/api/groups",
            Some("u"),
            Some(json!({"kind": "project", "id": "g", "name": "G"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(group["members"], json!(["u"]));

    let (status, body) = app
        .call(
            "POST",
            "/api/groups/project/g/repos",
            Some("v"),
            Some(repo_body("r", "/srv/git/r")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You must be a member to create tasks");

    let (status, _) = app
        .call("PUT", "/api/groups/project/g/members/v", Some("u"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, created) = app
        .call(
            "POST",
            "/api/groups/project/g/repos",
            Some("v"),
            Some(repo_body("r", "/srv/git/r")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["creator"], "v");
    assert_eq!(created["group"], json!({"kind": "project", "id": "g"}));

    let (_, listed) = app
        .call("GET", "/api/groups/project/g/repos", Some("u"), None)
        .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let (_, global) = app.call("GET", "/api/repos", Some("u"), None).await;
    assert_eq!(global, json!([]));
    let (status, _) = app.call("GET", "/api/repos/r", Some("u"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call("DELETE", "/api/groups/project/g/repos/r", Some("u"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can't delete repositories that aren't yours");

    let (status, _) = app
        .call("DELETE", "/api/groups/project/g/repos/r", Some("v"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, listed) = app
        .call("GET", "/api/groups/project/g/repos", Some("u"), None)
        .await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn only_members_change_membership() {
    let app = TestApp::new();
    app.call(
        "POST",
        "/api/groups",
        Some("u"),
        Some(json!({"kind": "project", "id": "g", "name": "G"})),
    )
    .await;

    let (status, body) = app
        .call("PUT", "/api/groups/project/g/members/v", Some("v"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You must be a member to manage group members");

    let (status, _) = app
        .call(
            "POST",
            "/api/groups/project/g/repos",
            Some("v"),
            Some(repo_body("r", "/srv/git/r")),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call("DELETE", "/api/groups/project/g/members/u", Some("v"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, group) = app
        .call("GET", "/api/groups/project/g", Some("v"), None)
        .await;
    assert_eq!(group["members"], json!(["u"]));

    let (status, group) = app
        .call("PUT", "/api/groups/project/g/members/v", Some("u"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(group["members"], json!(["u", "v"]));
}

#[tokio::test]
async fn new_repositories_are_noticed_by_others() {
    let app = TestApp::new();
    app.call(
        "POST",
        "/api/groups",
        Some("u"),
        Some(json!({"kind": "project", "id": "g", "name": "G"})),
    )
    .await;
    app.call("PUT", "/api/groups/project/g/members/v", Some("u"), None)
        .await;
    let (status, _) = app
        .call(
            "POST",
            "/api/groups/project/g/repos",
            Some("v"),
            Some(repo_body("r", "/srv/git/r")),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let notices = app.notices_for("u", 1).await;
    assert_eq!(notices[0]["label"], "repository_new");
    assert_eq!(notices[0]["context"]["repository"]["slug"], "r");
    assert_eq!(notices[0]["context"]["group"]["name"], "G");
    let (_, own) = app.call("GET", "/api/notices", Some("v"), None).await;
    assert_eq!(own, json!([]));

    app.call("POST", "/api/repos", Some("u"), Some(repo_body("s", "/srv/git/s")))
        .await;
    let notices = app.notices_for("w", 1).await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0]["context"]["repository"]["slug"], "s");
    assert_eq!(app.notices_for("v", 1).await.len(), 1);
    assert_eq!(app.notices_for("u", 1).await.len(), 1);
}

#[tokio::test]
async fn unknown_group_is_not_found() {
    let app = TestApp::new();
    let (status, body) = app
        .call("GET", "/api/groups/project/nope/repos", Some("u"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn edit_and_conflicts() {
    let app = TestApp::new();
    app.call("POST", "/api/repos", Some("u"), Some(repo_body("a", "/a")))
        .await;
    app.call("POST", "/api/repos", Some("u"), Some(repo_body("b", "/b")))
        .await;

    let (status, edited) = app
        .call(
            "PATCH",
            "/api/repos/a",
            Some("w"),
            Some(json!({"name": "Alpha"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["name"], "Alpha");
    assert_eq!(edited["creator"], "u");

    let (status, body) = app
        .call("PATCH", "/api/repos/a", Some("u"), Some(json!({"slug": "b"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (status, _) = app
        .call("POST", "/api/repos", Some("u"), Some(repo_body("bad slug", "/c")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn git_repo() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "-q"]);
    git(dir.path(), &["config", "user.name", "Test User"]);
    git(dir.path(), &["config", "user.email", "test@example.com"]);
    git(dir.path(), &["config", "commit.gpgsign", "false"]);
    std::fs::create_dir_all(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("README"), "hello\n").unwrap();
    std::fs::write(dir.path().join("docs/index.md"), "# Docs\n").unwrap();
    git(dir.path(), &["add", "-A"]);
    git(dir.path(), &["commit", "-q", "-m", "initial"]);
    dir
}

#[tokio::test]
async fn browse_and_commits() {
    let repo = git_repo();
    let app = TestApp::new();
    let location = repo.path().to_string_lossy().to_string();
    let (status, _) = app
        .call("POST", "/api/repos", Some("u"), Some(repo_body("site", &location)))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, file) = app
        .call("GET", "/api/repos/site/browse?path=README", Some("u"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(file["kind"], "File");
    assert_eq!(file["file"]["content"], "hello\n");

    let (_, folder) = app
        .call("GET", "/api/repos/site/browse?path=docs/", Some("u"), None)
        .await;
    assert_eq!(folder["kind"], "Folder");
    assert_eq!(folder["files"][0]["path"], "docs/index.md");

    let (status, _) = app
        .call("GET", "/api/repos/site/browse?path=missing", Some("u"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, commits) = app
        .call("GET", "/api/repos/site/commits?limit=5", Some("u"), None)
        .await;
    let commits = commits.as_array().unwrap();
    assert_eq!(commits.len(), 1);
    let id = commits[0]["id"].as_str().unwrap().to_string();

    let (status, detail) = app
        .call("GET", &format!("/api/repos/site/commits/{id}"), Some("u"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["commit"]["id"], id.as_str());
}

#[tokio::test]
async fn backends_events_and_openapi() {
    let app = TestApp::new();
    let (_, backends) = app.call("GET", "/api/backends", None, None).await;
    assert_eq!(backends, json!(["git"]));

    app.call("POST", "/api/repos", Some("u"), Some(repo_body("a", "/a")))
        .await;
    let (_, events) = app.call("GET", "/api/events", None, None).await;
    assert_eq!(events[0]["body"]["type"], "RepositoryCreated");
    assert_eq!(events[0]["correlation_id"], "corr-test");
    assert_eq!(events[0]["source"], "api");

    let (status, spec) = app.call("GET", "/api/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(spec["paths"].get("/api/repos").is_some());
}
