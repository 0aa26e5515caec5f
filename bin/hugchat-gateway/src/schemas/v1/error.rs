//! OpenAI-style error envelope.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// `type` of an envelope for failures caused by the backend or the gateway.
pub const INTERNAL_ERROR: &str = "internal_error";
/// `type` of an envelope for requests the gateway could not accept.
pub const INVALID_REQUEST: &str = "invalid_request";

/// Detail object inside [`ErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Always serialized, as `null` when unset.
    pub param: Option<String>,
    /// Always serialized, as `null` when unset.
    pub code: Option<String>,
}

/// `{"error": {"message", "type", "param", "code"}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

impl ErrorEnvelope {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                kind: kind.to_owned(),
                param: None,
                code: None,
            },
        }
    }
}
