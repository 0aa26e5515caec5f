//! Response types for the model catalog (`GET /v1/models`).

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single model descriptor (OpenAI `/v1/models` format).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ModelInfo {
    /// Model identifier string.
    pub id: String,
    /// Always `"model"`.
    pub object: String,
    /// Unix timestamp of when the catalog was listed.
    pub created: i64,
    /// Always `"huggingface"`.
    pub owned_by: String,
}

/// Response body for `GET /v1/models`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelListResponse {
    /// Always `"list"`.
    pub object: String,
    /// Advertised models.
    pub data: Vec<ModelInfo>,
}
