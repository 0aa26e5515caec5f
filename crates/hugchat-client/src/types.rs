use std::fmt;
use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Account used to open the HuggingChat session.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// A page the backend consulted while answering with web search enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchSource {
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub hostname: String,
}

/// The backend's answer to a synchronous ask.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Bare answer text.
    Plain(String),
    /// Answer text plus the web-search metadata that grounded it.
    Structured {
        text: String,
        sources: Option<Vec<WebSearchSource>>,
    },
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Plain(text) => text,
            Reply::Structured { text, .. } => text,
        }
    }

    /// Sources attached to the answer, if the backend reported any.
    pub fn sources(&self) -> Option<&[WebSearchSource]> {
        match self {
            Reply::Plain(_) => None,
            Reply::Structured { sources, .. } => sources.as_deref(),
        }
    }

    pub fn into_parts(self) -> (String, Option<Vec<WebSearchSource>>) {
        match self {
            Reply::Plain(text) => (text, None),
            Reply::Structured { text, sources } => (text, sources),
        }
    }
}

/// Incremental answer text, in production order. Each call to
/// [`crate::ChatBackend::ask_stream`] yields a fresh, single-use stream.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;
