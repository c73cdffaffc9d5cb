pub mod middleware;
pub mod notices;
pub mod openapi;
pub mod routes;

use axum::Router;
use cr_core::{CodeRepos, CodeReposError};
use cr_db::schema;
use cr_db::store::DbStore;
use cr_events::bus::EventBus;
use cr_events::notice::NoticeBus;
use cr_vcs::BackendRegistry;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    pub db_path: String,
    pub event_bus: EventBus,
    pub registry: Arc<BackendRegistry>,
    /// `None` when notifications are switched off.
    pub notices: Option<NoticeBus>,
}

/// Opens a fresh store connection for one request.
pub fn build_service(state: &AppState) -> Result<CodeRepos<DbStore>, CodeReposError> {
    let conn = schema::open_and_migrate(&state.db_path).map_err(|err| CodeReposError::Internal {
        message: err.to_string(),
    })?;
    let service = CodeRepos::new(
        DbStore::new(conn),
        Arc::clone(&state.registry),
        state.event_bus.clone(),
    );
    Ok(match &state.notices {
        Some(notices) => service.with_notifier(Arc::new(notices.clone())),
        None => service,
    })
}

pub fn app(state: AppState) -> Router {
    routes::router(state)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    let recorder = notices::spawn_recorder(&state);
    tracing::info!(%addr, notices = recorder.is_some(), "listening");
    let result = axum::serve(listener, app(state)).await;
    if let Some(recorder) = recorder {
        recorder.abort();
    }
    result
}
