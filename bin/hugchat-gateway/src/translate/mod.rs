//! Translation between the OpenAI wire format and the HuggingChat backend.
//!
//! Everything here is request-scoped: values are built once per request,
//! serialized and dropped.

pub mod catalog;
pub mod completion;
pub mod request;
pub mod stream;

pub use catalog::advertise;
pub use completion::build_completion;
pub use request::translate;
pub use stream::{CompletionStream, Frame};

/// Seconds since the Unix epoch, as stamped on every response object.
pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
