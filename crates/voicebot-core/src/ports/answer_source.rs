//! Answer source port - anything that turns a question into answer text.
//!
//! An answer arrives as a lazy stream of text fragments. Concatenating the
//! fragments in order yields the full answer. A source that can only return
//! a complete answer yields it as a single fragment.

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::HistoryMessage;
use crate::locale::DEFAULT_LOCALE;

/// Ordered answer fragments; the stream ends after the last fragment or the
/// first error.
pub type FragmentStream = BoxStream<'static, Result<String, ProviderError>>;

/// Failures while producing an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The request could not be built (e.g. blank question).
    #[error("invalid answer request: {0}")]
    InvalidRequest(String),

    /// No credential is configured for the provider.
    #[error("missing provider credential")]
    MissingCredential,

    /// The provider could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered with a non-success status.
    #[error("provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The provider's response could not be interpreted.
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// One question plus the context it is asked in.
///
/// The serialized form is the body of the answer endpoint:
/// `{ "userText": ..., "history": [...], "locale": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub user_text: String,
    #[serde(default)]
    pub history: Vec<HistoryMessage>,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    DEFAULT_LOCALE.to_owned()
}

impl AnswerRequest {
    pub fn new(
        user_text: impl Into<String>,
        history: Vec<HistoryMessage>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            user_text: user_text.into(),
            history,
            locale: locale.into(),
        }
    }
}

/// A backend producing answers.
///
/// `answer` is synchronous and must not do work up front: all I/O happens
/// when the returned stream is polled, so dropping the stream cancels the
/// request.
pub trait AnswerSource: Send + Sync {
    /// Start answering `request`.
    fn answer(&self, request: AnswerRequest) -> FragmentStream;

    /// Short name for logs.
    fn name(&self) -> &'static str {
        "answer-source"
    }
}

/// Drain `stream` into the full answer text.
pub async fn collect_answer(mut stream: FragmentStream) -> Result<String, ProviderError> {
    let mut answer = String::new();
    let mut fragments = 0usize;
    while let Some(fragment) = stream.next().await {
        answer.push_str(&fragment?);
        fragments += 1;
    }
    tracing::trace!(fragments, chars = answer.len(), "Collected answer");
    Ok(answer)
}
