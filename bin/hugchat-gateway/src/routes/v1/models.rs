//! Model catalog route.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::debug;
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::v1::models::{ModelInfo, ModelListResponse};
use crate::state::AppState;
use crate::translate::{advertise, now};

#[derive(OpenApi)]
#[openapi(
    paths(list_models),
    components(schemas(ModelInfo, ModelListResponse))
)]
pub struct ModelsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/models", get(list_models))
}

/// List models (`GET /v1/models`).
///
/// Each backend model is advertised twice: as-is, and with an `-internet`
/// suffix that turns web search on.
#[utoipa::path(
    get,
    path = "/v1/models",
    tag = "v1::models",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Advertised catalog", body = ModelListResponse),
        (status = 401, description = "Invalid or missing API key"),
        (status = 500, description = "Backend error"),
    )
)]
pub async fn list_models(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ModelListResponse>, ServerError> {
    let timeout = state.config.request_timeout;
    let native = tokio::time::timeout(timeout, state.backend.list_models())
        .await
        .map_err(|_| ServerError::Timeout(timeout))??;

    debug!(count = native.len(), "fetched backend model catalog");

    Ok(Json(ModelListResponse {
        object: "list".into(),
        data: advertise(&native, now()),
    }))
}
