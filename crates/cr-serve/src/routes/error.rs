use axum::Json;
use axum::http::StatusCode;
use cr_core::error::{CodeReposError, GroupError, RegistrationError, VcsError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub code: &'static str,
    pub message: String,
    pub correlation_id: Option<String>,
}

pub fn map_error(
    err: &CodeReposError,
    correlation_id: Option<String>,
) -> (StatusCode, Json<ErrorEnvelope>) {
    let (status, code, message) = match err {
        CodeReposError::Registration(registration) => map_registration_error(registration),
        CodeReposError::Group(group) => map_group_error(group),
        CodeReposError::Vcs(vcs) => map_vcs_error(vcs),
        CodeReposError::Internal { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            message.clone(),
        ),
    };
    if status.is_server_error() {
        tracing::error!(%status, code, error = %message, "request failed");
    }

    (
        status,
        Json(ErrorEnvelope {
            code,
            message,
            correlation_id,
        }),
    )
}

fn map_registration_error(err: &RegistrationError) -> (StatusCode, &'static str, String) {
    match err {
        RegistrationError::NotFound => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        RegistrationError::SlugTaken { .. } => (StatusCode::CONFLICT, "conflict", err.to_string()),
        RegistrationError::UnknownRepositoryType { .. } | RegistrationError::Validation { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
        RegistrationError::PermissionDenied { .. } => {
            (StatusCode::FORBIDDEN, "forbidden", err.to_string())
        }
        RegistrationError::Storage { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
        ),
    }
}

fn map_group_error(err: &GroupError) -> (StatusCode, &'static str, String) {
    match err {
        GroupError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        GroupError::InvalidInput { .. } => {
            (StatusCode::BAD_REQUEST, "invalid_input", err.to_string())
        }
        GroupError::PermissionDenied { .. } => {
            (StatusCode::FORBIDDEN, "forbidden", err.to_string())
        }
        GroupError::Storage { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
        ),
    }
}

fn map_vcs_error(err: &VcsError) -> (StatusCode, &'static str, String) {
    match err {
        VcsError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
        VcsError::RepoUnavailable { .. } | VcsError::BackendError { .. } => (
            StatusCode::BAD_GATEWAY,
            "backend_unavailable",
            err.to_string(),
        ),
        VcsError::UnknownBackend { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            err.to_string(),
        ),
    }
}
