//! Errors returned by turn controller operations.

use thiserror::Error;

use crate::domain::ConversationState;
use crate::ports::InputError;

/// Why a user-facing operation was refused or failed.
///
/// Refusals leave the controller's state unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    /// An answer is in flight; the operation is not allowed until it ends.
    #[error("an answer is already in progress (state: {0})")]
    Busy(ConversationState),

    /// Nothing to submit after trimming.
    #[error("input is empty")]
    EmptyInput,

    /// The host has no speech recognizer.
    #[error("speech input is not supported on this host")]
    InputUnsupported,

    /// The host has no speech synthesizer.
    #[error("speech output is not supported on this host")]
    OutputUnsupported,

    /// The recognizer refused to start.
    #[error("speech input failed to start: {0}")]
    Input(#[from] InputError),

    /// There is no completed answer to replay.
    #[error("no completed answer to speak")]
    NothingToSpeak,

    /// The owning session task has shut down.
    #[error("turn session is closed")]
    SessionClosed,
}
