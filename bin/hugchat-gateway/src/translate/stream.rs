//! Streaming adapter: backend text fragments in, OpenAI chunk events out.
//!
//! One [`CompletionStream`] per request. It pulls a fragment only when the
//! previous frame has been taken, so a slow client slows down consumption of
//! the backend stream instead of growing a buffer.
//!
//! ```text
//! Streaming ──exhausted──▶ Finalizing ──▶ Done ──▶ Closed
//!     │                                    ▲
//!     └──────── error / stalled ───────────┘
//! ```

use std::time::Duration;

use axum::response::sse::Event;
use futures::{Stream, StreamExt};
use hugchat_client::FragmentStream;
use tracing::{debug, warn};

use super::completion::completion_id;
use crate::schemas::v1::chat::{ChatCompletionChunk, ChunkChoice, Delta};

/// Payload of the final SSE event.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One unit written to the event stream.
#[derive(Debug, Clone)]
pub enum Frame {
    Chunk(ChatCompletionChunk),
    Done,
}

impl Frame {
    /// The `data:` payload of this frame.
    pub fn data(&self) -> Result<String, serde_json::Error> {
        match self {
            Frame::Chunk(chunk) => serde_json::to_string(chunk),
            Frame::Done => Ok(DONE_SENTINEL.to_owned()),
        }
    }

    /// Render as an SSE event, framed on the wire as `data: <payload>\n\n`.
    pub fn into_event(self) -> Result<Event, serde_json::Error> {
        Ok(Event::default().data(self.data()?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Streaming,
    Finalizing,
    Done,
    Closed,
}

pub struct CompletionStream {
    state: State,
    fragments: Option<FragmentStream>,
    id: String,
    created: i64,
    model: String,
    idle_timeout: Duration,
    role_sent: bool,
}

impl CompletionStream {
    /// `idle_timeout` bounds the wait for each fragment.
    pub fn new(fragments: FragmentStream, model_echo: String, idle_timeout: Duration) -> Self {
        Self {
            state: State::Streaming,
            fragments: Some(fragments),
            id: completion_id(),
            created: super::now(),
            model: model_echo,
            idle_timeout,
            role_sent: false,
        }
    }

    fn chunk(&self, delta: Delta, finish_reason: Option<&str>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk".into(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChunkChoice {
                index: 0,
                delta,
                finish_reason: finish_reason.map(str::to_owned),
            }],
        }
    }

    /// Release the backend stream and go straight to the sentinel.
    fn abort(&mut self) {
        self.fragments = None;
        self.state = State::Done;
    }

    /// Produce the next frame, or `None` once the sentinel has been emitted.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        loop {
            match self.state {
                State::Streaming => {
                    let Some(fragments) = self.fragments.as_mut() else {
                        self.state = State::Finalizing;
                        continue;
                    };

                    let next = tokio::time::timeout(self.idle_timeout, fragments.next()).await;
                    match next {
                        Ok(Some(Ok(text))) => {
                            if text.is_empty() {
                                continue;
                            }
                            let role = (!self.role_sent).then(|| "assistant".to_owned());
                            self.role_sent = true;
                            let delta = Delta {
                                role,
                                content: Some(text),
                            };
                            return Some(Frame::Chunk(self.chunk(delta, None)));
                        }
                        Ok(Some(Err(e))) => {
                            warn!(error = %e, model = %self.model, "backend stream failed; ending event stream");
                            self.abort();
                        }
                        Ok(None) => {
                            self.fragments = None;
                            self.state = State::Finalizing;
                        }
                        Err(_) => {
                            warn!(
                                timeout_secs = self.idle_timeout.as_secs(),
                                model = %self.model,
                                "backend stream stalled; ending event stream"
                            );
                            self.abort();
                        }
                    }
                }
                State::Finalizing => {
                    self.state = State::Done;
                    return Some(Frame::Chunk(self.chunk(Delta::default(), Some("stop"))));
                }
                State::Done => {
                    self.state = State::Closed;
                    return Some(Frame::Done);
                }
                State::Closed => return None,
            }
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Frame> + Send {
        futures::stream::unfold(self, |mut s| async move {
            let frame = s.next_frame().await?;
            Some((frame, s))
        })
    }
}

impl Drop for CompletionStream {
    fn drop(&mut self) {
        if self.state != State::Closed {
            debug!(id = %self.id, "event stream dropped before completion; backend stream released");
        }
    }
}
