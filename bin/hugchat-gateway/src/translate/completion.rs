use hugchat_client::Reply;
use uuid::Uuid;

use super::request::TranslatedRequest;
use crate::schemas::v1::chat::{
    ChatChoice, ChatCompletionResponse, ChatMessage, SearchSource, Usage,
};

/// Fresh completion id in the OpenAI `chatcmpl-` format.
pub fn completion_id() -> String {
    format!("chatcmpl-{}", Uuid::new_v4())
}

/// Wrap one backend reply into a `chat.completion` object.
///
/// Sources are attached at the top level, and only when the request asked
/// for web search.
pub fn build_completion(reply: Reply, req: &TranslatedRequest) -> ChatCompletionResponse {
    let (content, sources) = reply.into_parts();

    let sources = sources
        .filter(|_| req.web_search)
        .filter(|s| !s.is_empty())
        .map(|s| s.into_iter().map(SearchSource::from).collect());

    ChatCompletionResponse {
        id: completion_id(),
        object: "chat.completion".into(),
        created: super::now(),
        model: req.model_echo.clone(),
        choices: vec![ChatChoice {
            index: 0,
            message: ChatMessage {
                role: "assistant".into(),
                content,
            },
            finish_reason: "stop".into(),
        }],
        usage: Usage::default(),
        sources,
    }
}
