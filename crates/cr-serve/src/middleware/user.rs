use crate::middleware::correlation::CorrelationId;
use crate::routes::error::ErrorEnvelope;
use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use cr_core::types::UserId;

pub const HEADER_NAME: &str = "x-user-id";

/// The authenticated requester. Authentication happens upstream; this only
/// reads the identity it forwarded.
#[derive(Clone, Debug)]
pub struct Requester(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Requester {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(HEADER_NAME)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();
        UserId::new(value.to_string()).map(Requester).map_err(|_| {
            let correlation_id = parts
                .extensions
                .get::<CorrelationId>()
                .map(|value| value.0.clone());
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorEnvelope {
                    code: "unauthenticated",
                    message: format!("missing or invalid {HEADER_NAME} header"),
                    correlation_id,
                }),
            )
                .into_response()
        })
    }
}
