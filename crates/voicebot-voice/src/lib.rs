#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

// Used by the integration tests under tests/
#[cfg(test)]
use mockall as _;
#[cfg(test)]
use tokio_test as _;

pub mod controller;
pub mod mock_answer;
pub mod session;
pub mod text_utils;
pub mod voices;

// Re-export key types for convenience
pub use controller::{
    AnswerEvent, CANCELLED_ANSWER, CancelReason, EMPTY_ANSWER_PLACEHOLDER, FALLBACK_ANSWER,
    PendingAnswer, PortEvent, Transcript, TurnController,
};
pub use mock_answer::{DEFAULT_FRAGMENT_DELAY, MockAnswerSource, MockLanguage, compose_answer};
pub use session::{PortEventSender, SessionHandle, TurnSession, port_channel};
pub use voices::{select_voice, voices_for_language};
