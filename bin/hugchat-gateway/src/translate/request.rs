use crate::error::ServerError;
use crate::schemas::v1::chat::ChatCompletionRequest;

/// Marker in a model id that turns web search on.
pub const WEB_SEARCH_MARKER: &str = "internet";

/// What the backend call needs from an inbound chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedRequest {
    /// Content of the last message.
    pub prompt: String,
    pub web_search: bool,
    /// The request's model id, echoed back unmodified.
    pub model_echo: String,
}

/// Case-insensitive test for [`WEB_SEARCH_MARKER`] anywhere in `model`.
pub fn web_search_enabled(model: &str) -> bool {
    model.to_lowercase().contains(WEB_SEARCH_MARKER)
}

/// Reduce a chat-completion request to a single backend prompt.
///
/// Earlier turns are not forwarded: the backend sees only the last message.
pub fn translate(req: ChatCompletionRequest) -> Result<TranslatedRequest, ServerError> {
    let ChatCompletionRequest {
        model, messages, ..
    } = req;

    let prompt = messages
        .into_iter()
        .last()
        .map(|m| m.content)
        .ok_or_else(|| ServerError::BadRequest("messages must not be empty".into()))?;

    Ok(TranslatedRequest {
        prompt,
        web_search: web_search_enabled(&model),
        model_echo: model,
    })
}
