use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::state::AppState;

/// Body of every 401. Deliberately simpler than the error envelope.
pub const UNAUTHORIZED_MESSAGE: &str = "Invalid or missing API key";

/// `true` iff `header` is `Bearer <token>` (scheme case-insensitive) and
/// `<token>` equals `expected` exactly.
pub fn bearer_matches(header: Option<&HeaderValue>, expected: &str) -> bool {
    let Some(value) = header.and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let Some((scheme, token)) = value.split_once(' ') else {
        return false;
    };
    scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() && token == expected
}

/// Reject requests that do not carry the configured bearer secret.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let expected = state.config.api_key.as_deref().unwrap_or_default();
    let provided = req.headers().get(header::AUTHORIZATION);

    if expected.is_empty() || !bearer_matches(provided, expected) {
        warn!(
            path = %req.uri().path(),
            header_present = provided.is_some(),
            "rejected request with invalid or missing API key"
        );
        return (
            StatusCode::UNAUTHORIZED,
            axum::Json(serde_json::json!({ "error": UNAUTHORIZED_MESSAGE })),
        )
            .into_response();
    }

    next.run(req).await
}
