//! Client for the HuggingChat web API.
//!
//! [`ChatBackend`] is the surface the gateway depends on;
//! [`HuggingChatSession`] implements it against a signed-in account.
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), hugchat_client::ClientError> {
//! use futures::StreamExt;
//! use hugchat_client::{ChatBackend, Credentials, HuggingChatSession, SessionOptions};
//!
//! let creds = Credentials::new("me@example.com", "password");
//! let session = HuggingChatSession::login(&creds, SessionOptions::default()).await?;
//!
//! let reply = session.ask("What is Rust?", false).await?;
//! println!("{}", reply.text());
//!
//! let mut fragments = session.ask_stream("And Cargo?", true).await?;
//! while let Some(fragment) = fragments.next().await {
//!     print!("{}", fragment?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod ndjson;
pub mod session;
pub mod types;

pub use backend::ChatBackend;
pub use error::ClientError;
pub use session::{HuggingChatSession, SessionOptions};
pub use types::{Credentials, FragmentStream, Reply, WebSearchSource};
