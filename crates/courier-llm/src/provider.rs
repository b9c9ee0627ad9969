//! The `CompletionProvider` trait and its streaming vocabulary.

use std::pin::Pin;

use async_trait::async_trait;
use courier_core::model::PromptMessage;
use futures::Stream;
use thiserror::Error;

/// One event from a streaming completion.
#[derive(Clone, Debug, PartialEq)]
pub enum CompletionEvent {
    /// Incremental text fragment.
    Delta {
        /// The fragment.
        text: String,
    },
    /// Backend signalled completion.
    Done,
}

/// Boxed stream of completion events.
pub type CompletionStream =
    Pin<Box<dyn Stream<Item = Result<CompletionEvent, ProviderError>> + Send>>;

/// Result alias for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Failures talking to the generation backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned a non-success status.
    #[error("api error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Body text or parsed error message.
        message: String,
    },

    /// Stream payload did not decode.
    #[error("invalid stream payload: {0}")]
    Decode(String),

    /// Provider is not configured (missing key or endpoint).
    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

/// A streaming text-completion backend.
///
/// One call produces an ordered sequence of text fragments followed by a
/// terminal [`CompletionEvent::Done`]. Implementations must not reorder
/// fragments; consumers concatenate them to reassemble the reply.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    /// Request a streaming completion over the given conversation.
    async fn stream(&self, messages: &[PromptMessage]) -> ProviderResult<CompletionStream>;
}
