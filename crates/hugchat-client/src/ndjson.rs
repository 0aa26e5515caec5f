//! Decoding of the newline-delimited JSON update stream HuggingChat sends
//! back while answering a message.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;

use crate::error::ClientError;
use crate::types::WebSearchSource;

/// One line of the answer stream.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Update {
    /// An incremental piece of the answer.
    Stream { token: String },
    /// The complete answer, sent once generation has finished.
    FinalAnswer { text: String },
    /// Web-search progress; only some of these carry sources.
    WebSearch {
        #[serde(default)]
        sources: Vec<WebSearchSource>,
    },
    /// The backend gave up on the request.
    Error { message: String },
    /// Generation progress: `started`, `keepAlive`, `finished` or `error`.
    Status {
        status: String,
        #[serde(default)]
        message: Option<String>,
    },
    /// Title and other updates the gateway has no use for.
    #[serde(other)]
    Other,
}

impl Update {
    /// Answer text carried by a `stream` update, without NUL padding.
    pub fn fragment(&self) -> Option<String> {
        match self {
            Update::Stream { token } => {
                let text = token.replace('\0', "");
                (!text.is_empty()).then_some(text)
            }
            _ => None,
        }
    }

    /// Failure reported by the backend, as an `error` update or an
    /// `error` status.
    pub fn failure(&self) -> Option<String> {
        match self {
            Update::Error { message } => Some(message.clone()),
            Update::Status { status, message } if status == "error" => Some(
                message
                    .clone()
                    .unwrap_or_else(|| "generation failed".to_owned()),
            ),
            _ => None,
        }
    }
}

struct LineReader<S> {
    body: S,
    buf: Vec<u8>,
    finished: bool,
}

impl<S> LineReader<S> {
    fn take_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.buf.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
        line.pop();
        Some(line)
    }

    fn take_remainder(&mut self) -> Option<Vec<u8>> {
        if self.buf.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buf))
        }
    }
}

fn parse_line(line: &[u8]) -> Option<Result<Update, ClientError>> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(serde_json::from_str(text).map_err(ClientError::from))
}

/// Turn a raw response body into a stream of decoded updates.
///
/// A transport error is yielded once and ends the stream.
pub fn decode_updates<S, E>(body: S) -> impl Stream<Item = Result<Update, ClientError>> + Send
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
    ClientError: From<E>,
{
    let reader = LineReader {
        body: body.boxed(),
        buf: Vec::new(),
        finished: false,
    };

    futures::stream::unfold(reader, |mut reader| async move {
        loop {
            if let Some(line) = reader.take_line() {
                match parse_line(&line) {
                    Some(item) => return Some((item, reader)),
                    None => continue,
                }
            }

            if reader.finished {
                let line = reader.take_remainder()?;
                match parse_line(&line) {
                    Some(item) => return Some((item, reader)),
                    None => return None,
                }
            }

            match reader.body.next().await {
                Some(Ok(bytes)) => reader.buf.extend_from_slice(&bytes),
                Some(Err(e)) => {
                    reader.finished = true;
                    reader.buf.clear();
                    return Some((Err(ClientError::from(e)), reader));
                }
                None => reader.finished = true,
            }
        }
    })
}
