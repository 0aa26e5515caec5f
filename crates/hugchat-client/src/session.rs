//! Authenticated HuggingChat session.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::backend::ChatBackend;
use crate::error::ClientError;
use crate::ndjson::{Update, decode_updates};
use crate::types::{Credentials, FragmentStream, Reply, WebSearchSource};

/// Cookie HuggingChat uses to identify a signed-in chat session.
const SESSION_COOKIE: &str = "hf-chat";

/// Connection settings for [`HuggingChatSession::login`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Hugging Face origin; the chat app lives under `{base_url}/chat`.
    pub base_url: String,
    /// Model to answer with. `None` picks the first model in the catalog.
    pub model: Option<String>,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            base_url: "https://huggingface.co".to_owned(),
            model: None,
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("hugchat-client/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// A signed-in HuggingChat account.
///
/// Acquired once and shared; every ask runs in its own conversation, so
/// concurrent callers never interfere with each other.
#[derive(Debug)]
pub struct HuggingChatSession {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct RemoteModel {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewConversation {
    conversation_id: String,
}

#[derive(Debug, Deserialize)]
struct ConversationMessage {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Conversation {
    #[serde(default)]
    messages: Vec<ConversationMessage>,
}

impl HuggingChatSession {
    /// Sign in with `credentials` and resolve the model to answer with.
    pub async fn login(
        credentials: &Credentials,
        options: SessionOptions,
    ) -> Result<Self, ClientError> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .user_agent(options.user_agent.as_str())
            .connect_timeout(options.connect_timeout)
            .cookie_provider(Arc::clone(&jar))
            .build()?;

        let base_url = options.base_url.trim_end_matches('/').to_owned();

        let resp = client
            .post(format!("{base_url}/login"))
            .form(&[
                ("username", credentials.email.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::Login(format!(
                "account login returned HTTP {}",
                resp.status()
            )));
        }

        let resp = client.post(format!("{base_url}/chat/login")).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::Login(format!(
                "chat login returned HTTP {}",
                resp.status()
            )));
        }

        let chat_url = Url::parse(&format!("{base_url}/chat/")).map_err(|e| {
            ClientError::Login(format!("invalid base url '{base_url}': {e}"))
        })?;
        if !has_cookie(jar.as_ref(), &chat_url, SESSION_COOKIE) {
            return Err(ClientError::Login(format!(
                "no '{SESSION_COOKIE}' session cookie was issued"
            )));
        }

        let mut session = Self {
            client,
            base_url,
            model: String::new(),
        };

        session.model = match options.model {
            Some(model) => model,
            None => session
                .list_models()
                .await?
                .into_iter()
                .next()
                .ok_or(ClientError::NoModels)?,
        };

        info!(email = %credentials.email, model = %session.model, "HuggingChat session ready");
        Ok(session)
    }

    /// Model every ask is answered with.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_url(&self, path: &str) -> String {
        format!("{}/chat{}", self.base_url, path)
    }

    /// Open a conversation and post `text` to it, returning the raw update
    /// stream and the guard that deletes the conversation afterwards.
    async fn send_message(
        &self,
        text: &str,
        web_search: bool,
    ) -> Result<(UpdateStream, ConversationCleanup), ClientError> {
        let created: NewConversation = self
            .client
            .post(self.chat_url("/conversation"))
            .json(&json!({ "model": self.model, "preprompt": "" }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let conversation_id = created.conversation_id;
        let cleanup = ConversationCleanup::new(
            self.client.clone(),
            self.chat_url(&format!("/conversation/{conversation_id}")),
        );

        let conversation: Conversation = self
            .client
            .get(self.chat_url(&format!("/api/conversation/{conversation_id}")))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let parent_id = conversation
            .messages
            .last()
            .map(|m| m.id.clone())
            .ok_or_else(|| ClientError::InvalidResponse {
                message: format!("conversation {conversation_id} has no root message"),
            })?;

        debug!(%conversation_id, %parent_id, web_search, "posting message");

        let data = json!({
            "inputs": text,
            "id": parent_id,
            "is_retry": false,
            "is_continue": false,
            "web_search": web_search,
            "tools": [],
        });
        let form = reqwest::multipart::Form::new().text("data", data.to_string());

        let resp = self
            .client
            .post(self.chat_url(&format!("/conversation/{conversation_id}")))
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        Ok((decode_updates(resp.bytes_stream()).boxed(), cleanup))
    }
}

type UpdateStream = BoxStream<'static, Result<Update, ClientError>>;

/// Deletes a conversation once its answer has been consumed.
///
/// [`ConversationCleanup::run`] deletes inline. Dropping the guard without
/// running it (early return, abandoned stream) deletes on a spawned task.
struct ConversationCleanup {
    client: Client,
    url: String,
    done: bool,
}

impl ConversationCleanup {
    fn new(client: Client, url: String) -> Self {
        Self {
            client,
            url,
            done: false,
        }
    }

    async fn run(mut self) {
        self.done = true;
        delete_conversation(&self.client, &self.url).await;
    }
}

impl Drop for ConversationCleanup {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let client = self.client.clone();
                let url = std::mem::take(&mut self.url);
                handle.spawn(async move { delete_conversation(&client, &url).await });
            }
            Err(_) => warn!(url = %self.url, "no runtime to delete conversation; left in place"),
        }
    }
}

async fn delete_conversation(client: &Client, url: &str) {
    let result = client
        .delete(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status);
    match result {
        Ok(_) => debug!(%url, "conversation deleted"),
        Err(e) => warn!(%url, error = %e, "failed to delete conversation"),
    }
}

/// Drain an update stream into one reply.
async fn collect_reply(updates: &mut UpdateStream) -> Result<Reply, ClientError> {
    let mut streamed = String::new();
    let mut final_answer = None;
    let mut sources: Vec<WebSearchSource> = Vec::new();

    while let Some(update) = updates.next().await {
        let update = update?;
        if let Some(message) = update.failure() {
            return Err(ClientError::Upstream(message));
        }
        if let Some(fragment) = update.fragment() {
            streamed.push_str(&fragment);
            continue;
        }
        match update {
            Update::FinalAnswer { text } => final_answer = Some(text),
            Update::WebSearch { sources: found } => sources.extend(found),
            _ => {}
        }
    }

    let text = final_answer.unwrap_or(streamed);
    if sources.is_empty() {
        Ok(Reply::Plain(text))
    } else {
        Ok(Reply::Structured {
            text,
            sources: Some(sources),
        })
    }
}

fn has_cookie(jar: &Jar, url: &Url, name: &str) -> bool {
    let Some(header) = jar.cookies(url) else {
        return false;
    };
    let Ok(header) = header.to_str() else {
        return false;
    };
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(key, _)| key == name)
}

#[async_trait]
impl ChatBackend for HuggingChatSession {
    async fn ask(&self, text: &str, web_search: bool) -> Result<Reply, ClientError> {
        let (mut updates, cleanup) = self.send_message(text, web_search).await?;
        let reply = collect_reply(&mut updates).await;
        drop(updates);
        cleanup.run().await;
        reply
    }

    async fn ask_stream(
        &self,
        text: &str,
        web_search: bool,
    ) -> Result<FragmentStream, ClientError> {
        let (updates, cleanup) = self.send_message(text, web_search).await?;

        let fragments = futures::stream::unfold(
            (updates, Some(cleanup)),
            |(mut updates, mut cleanup)| async move {
                loop {
                    let item = match updates.next().await {
                        Some(Ok(update)) => match update.failure() {
                            Some(message) => Err(ClientError::Upstream(message)),
                            None => match update.fragment() {
                                Some(fragment) => Ok(fragment),
                                None => continue,
                            },
                        },
                        Some(Err(e)) => Err(e),
                        None => {
                            if let Some(cleanup) = cleanup.take() {
                                cleanup.run().await;
                            }
                            return None;
                        }
                    };
                    return Some((item, (updates, cleanup)));
                }
            },
        );
        Ok(Box::pin(fragments))
    }

    async fn list_models(&self) -> Result<Vec<String>, ClientError> {
        let models: Vec<RemoteModel> = self
            .client
            .get(self.chat_url("/api/models"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(models
            .into_iter()
            .filter_map(|m| m.id.or(m.name))
            .collect())
    }
}
