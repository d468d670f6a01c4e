//! Port definitions (trait abstractions) for external capabilities.
//!
//! Ports define the interfaces that the turn controller expects from the
//! speech platform and the language-model backend. They contain no
//! implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - Every operation the controller issues carries an [`OperationId`];
//!   every event a port reports back carries the id of the operation it
//!   belongs to. The controller drops events for operations that are no
//!   longer current, so adapters never need to filter late callbacks.
//! - Port traits take `&self` so they are object-safe and shareable;
//!   adapters use interior mutability for their own state.
//! - `cancel`/`stop`/`abort` must be safe to call when nothing is active.

pub mod answer_source;
pub mod speech_input;
pub mod speech_output;

use serde::{Deserialize, Serialize};

pub use answer_source::{AnswerRequest, AnswerSource, FragmentStream, ProviderError, collect_answer};
pub use speech_input::{InputError, InputEvent, SpeechInputPort};
pub use speech_output::{OutputError, OutputEvent, SpeechOutputPort, Utterance, VoiceDescriptor};

/// Identity of one controller-issued operation (listen session, answer
/// request or utterance).
///
/// Ids are allocated from a single monotonically increasing counter per
/// controller, so ids of different kinds never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(u64);

impl OperationId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "op#{}", self.0)
    }
}
