//! OpenAI-compatible chat-completion route.
//!
//! Only the last message is forwarded to the backend; a model id containing
//! `internet` turns web search on.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::sse::Sse;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::StreamExt;
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::error::ServerError;
use crate::schemas::v1::chat::{
    ChatChoice, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    ChunkChoice, Delta, SearchSource, Usage,
};
use crate::state::AppState;
use crate::translate::{CompletionStream, Frame, build_completion, translate};

#[derive(OpenApi)]
#[openapi(
    paths(chat_completions),
    components(schemas(
        ChatCompletionRequest,
        ChatCompletionResponse,
        ChatCompletionChunk,
        ChatMessage,
        ChatChoice,
        ChunkChoice,
        Delta,
        SearchSource,
        Usage
    ))
)]
pub struct ChatApi;

/// Register chat-completion routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat/completions", post(chat_completions))
}

/// OpenAI chat completions (`POST /v1/chat/completions`).
///
/// When `stream: true` the reply is relayed fragment by fragment as SSE
/// `chat.completion.chunk` events, terminated by `data: [DONE]`.
#[utoipa::path(
    post,
    path = "/v1/chat/completions",
    tag = "v1::chat",
    security(("bearer" = [])),
    request_body = ChatCompletionRequest,
    responses(
        (status = 200, description = "Completion, or an SSE stream of chunks", body = ChatCompletionResponse),
        (status = 400, description = "Malformed body or empty messages"),
        (status = 401, description = "Invalid or missing API key"),
        (status = 500, description = "Backend error"),
    )
)]
pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<Response, ServerError> {
    let Json(req) = payload?;
    let stream = req.stream;
    let translated = translate(req)?;
    let timeout = state.config.request_timeout;

    debug!(
        model = %translated.model_echo,
        web_search = translated.web_search,
        prompt_len = translated.prompt.len(),
        stream,
        "chat completion request"
    );

    if stream {
        let fragments = tokio::time::timeout(
            timeout,
            state
                .backend
                .ask_stream(&translated.prompt, translated.web_search),
        )
        .await
        .map_err(|_| ServerError::Timeout(timeout))??;

        let events = CompletionStream::new(fragments, translated.model_echo, timeout)
            .into_stream()
            .map(Frame::into_event);

        return Ok(Sse::new(events).into_response());
    }

    let reply = tokio::time::timeout(
        timeout,
        state.backend.ask(&translated.prompt, translated.web_search),
    )
    .await
    .map_err(|_| ServerError::Timeout(timeout))??;

    let response = build_completion(reply, &translated);
    info!(
        id = %response.id,
        model = %response.model,
        content_len = response.choices.first().map_or(0, |c| c.message.content.len()),
        sources = response.sources.as_ref().map_or(0, Vec::len),
        "chat completion finished"
    );

    Ok(Json(response).into_response())
}
