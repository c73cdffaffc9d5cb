//! Keeps every notice sent on the bus so recipients can read it back through
//! `/api/notices`.

use crate::{AppState, build_service};
use cr_events::notice::Notice;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// Subscribes before returning, so nothing sent afterwards is missed. `None`
/// when notifications are switched off.
pub fn spawn_recorder(state: &AppState) -> Option<JoinHandle<()>> {
    let mut receiver = state.notices.as_ref()?.subscribe();
    let state = state.clone();
    Some(tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(notice) => record(&state, &notice),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notice recorder fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }))
}

fn record(state: &AppState, notice: &Notice) {
    let result = build_service(state).and_then(|service| service.notices().record(notice));
    if let Err(err) = result {
        tracing::warn!(label = %notice.label, error = %err, "could not store notice");
    }
}
