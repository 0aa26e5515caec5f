//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use hugchat_client::ChatBackend;

use crate::config::Config;

/// State shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration (env-derived).
    pub config: Arc<Config>,
    /// The single signed-in backend session, acquired at startup.
    pub backend: Arc<dyn ChatBackend>,
    /// Model the backend answers with, reported by `/health`.
    pub backend_model: String,
}
