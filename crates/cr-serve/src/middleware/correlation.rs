use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use ulid::Ulid;

#[derive(Clone, Debug)]
pub struct CorrelationId(pub String);

pub const HEADER_NAME: &str = "x-correlation-id";
const MAX_LEN: usize = 128;

/// Tags every request with a correlation id, reusing the caller's when it is
/// usable, and echoes it on the response.
pub async fn correlation_middleware(mut request: Request<Body>, next: Next) -> Response {
    let id = incoming_id(request.headers()).unwrap_or_else(|| format!("corr_{}", Ulid::new()));
    request.extensions_mut().insert(CorrelationId(id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(HEADER_NAME), value);
    }
    response
}

fn incoming_id(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(HEADER_NAME)?.to_str().ok()?.trim();
    let usable = !value.is_empty()
        && value.len() <= MAX_LEN
        && value.chars().all(|c| c.is_ascii_graphic());
    usable.then(|| value.to_string())
}
