//! OpenAI-compatible chat-completion request / response types.
//!
//! Kept compatible with the OpenAI REST API so existing SDK clients work
//! unmodified. The one extension is the top-level `sources` array on
//! web-search completions.

use hugchat_client::WebSearchSource;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ── Requests ─────────────────────────────────────────────────────────────────

/// A single message in the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    /// The role of the message author (`"system"`, `"user"`, `"assistant"`).
    pub role: String,
    /// The content of the message.
    pub content: String,
}

/// Request body for `POST /v1/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionRequest {
    /// Model id to echo back. Ids containing `internet` enable web search.
    pub model: String,
    /// Conversation history; only the last message is sent to the backend.
    pub messages: Vec<ChatMessage>,
    /// When `true`, the response is streamed using SSE.
    #[serde(default)]
    pub stream: bool,
}

// ── Synchronous response ─────────────────────────────────────────────────────

/// A single choice in the completion response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatChoice {
    /// Zero-based index of this choice.
    pub index: u32,
    /// The generated message.
    pub message: ChatMessage,
    /// Why generation stopped; always `"stop"`.
    pub finish_reason: String,
}

/// Token accounting. The gateway does not tokenize, so every counter is zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A web page the answer was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchSource {
    pub link: String,
    pub title: String,
    pub hostname: String,
}

impl From<WebSearchSource> for SearchSource {
    fn from(s: WebSearchSource) -> Self {
        Self {
            link: s.link,
            title: s.title,
            hostname: s.hostname,
        }
    }
}

/// Response body for `POST /v1/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionResponse {
    /// Unique identifier for this completion.
    pub id: String,
    /// Always `"chat.completion"`.
    pub object: String,
    /// Unix timestamp of when the response was created.
    pub created: i64,
    /// The model id from the request, verbatim.
    pub model: String,
    /// Generated choices.
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
    /// Present only on web-search completions that reported sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SearchSource>>,
}

// ── Streaming response ───────────────────────────────────────────────────────

/// Incremental message content. Both fields are omitted on the terminal chunk,
/// which serializes the delta as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A single choice inside a streamed chunk.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: Delta,
    /// `null` until the terminal chunk, which carries `"stop"`.
    pub finish_reason: Option<String>,
}

/// One SSE event of a streamed completion.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionChunk {
    /// Shared by every chunk of one stream.
    pub id: String,
    /// Always `"chat.completion.chunk"`.
    pub object: String,
    pub created: i64,
    /// The model id from the request, verbatim.
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}
