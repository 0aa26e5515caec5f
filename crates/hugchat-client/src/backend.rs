use async_trait::async_trait;

use crate::error::ClientError;
use crate::types::{FragmentStream, Reply};

/// The operations the gateway needs from a conversational backend.
///
/// Implementations are shared across concurrent requests behind an `Arc`,
/// so every method takes `&self`.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Ask `text` and wait for the complete answer.
    async fn ask(&self, text: &str, web_search: bool) -> Result<Reply, ClientError>;

    /// Ask `text` and return the answer as it is produced.
    ///
    /// Dropping the returned stream abandons the backend request.
    async fn ask_stream(&self, text: &str, web_search: bool)
    -> Result<FragmentStream, ClientError>;

    /// Model ids offered by the backend, in backend order.
    async fn list_models(&self) -> Result<Vec<String>, ClientError>;
}
