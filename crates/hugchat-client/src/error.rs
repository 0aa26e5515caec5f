use thiserror::Error;

/// Errors that can be returned by hugchat-client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// An HTTP request failed (network error, non-2xx status, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to serialize or deserialize JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The account could not be signed in to HuggingChat.
    #[error("login failed: {0}")]
    Login(String),

    /// HuggingChat answered with an error update; carries its message verbatim.
    #[error("{0}")]
    Upstream(String),

    /// A HuggingChat response was missing an expected field or had an unexpected shape.
    #[error("invalid HuggingChat response: {message}")]
    InvalidResponse { message: String },

    /// The model catalog is empty, so no default model can be chosen.
    #[error("HuggingChat reported no available models")]
    NoModels,
}
