//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors are converted to an
//! OpenAI-style [`ErrorEnvelope`] with an appropriate status code.
//!
//! Backend failures are reported to the caller verbatim: the gateway is a
//! thin adapter and clients rely on the backend's own explanation.

use std::time::Duration;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hugchat_client::ClientError;
use thiserror::Error;
use tracing::{error, warn};

use crate::schemas::v1::error::{ErrorEnvelope, INTERNAL_ERROR, INVALID_REQUEST};

/// All errors that can occur in the gateway request lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Propagated from the HuggingChat session.
    #[error(transparent)]
    Backend(#[from] ClientError),

    /// The backend did not answer in time.
    #[error("backend did not respond within {}s", .0.as_secs())]
    Timeout(Duration),

    /// The caller sent an invalid or malformed request.
    #[error("{0}")]
    BadRequest(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Backend(_) | ServerError::Timeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = if status.is_client_error() {
            warn!(error = %self, "rejected request");
            INVALID_REQUEST
        } else {
            error!(error = %self, "request failed");
            INTERNAL_ERROR
        };
        (status, Json(ErrorEnvelope::new(kind, self.to_string()))).into_response()
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn envelope(err: ServerError) -> (StatusCode, ErrorEnvelope) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn backend_failure_is_internal_error_with_cause() {
        let (status, body) =
            envelope(ClientError::Upstream("Model is overloaded".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.kind, "internal_error");
        assert_eq!(body.error.message, "Model is overloaded");
        assert!(body.error.param.is_none());
        assert!(body.error.code.is_none());
    }

    #[tokio::test]
    async fn bad_request_is_invalid_request() {
        let (status, body) = envelope(ServerError::BadRequest("messages must not be empty".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.kind, "invalid_request");
        assert_eq!(body.error.message, "messages must not be empty");
    }

    #[tokio::test]
    async fn timeout_is_internal_error() {
        let (status, body) = envelope(ServerError::Timeout(Duration::from_secs(30))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "backend did not respond within 30s");
    }
}
