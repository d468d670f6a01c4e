//! The turn-taking state machine's state.

use serde::{Deserialize, Serialize};

/// Which phase of the conversation loop is active.
///
/// ```text
///   Idle ──listen──▶ Listening ──commit/submit──▶ Thinking ──complete──▶ Speaking
///    ▲                  │                            │                      │
///    │◀──stop/ended─────┘◀──────────fail/stop───────┘                      │
///    │◀─────────────────────────────ended/stop─────────────────────────────┘
///                       ▲◀──────────────listen (barge-in)───────────────────┘
/// ```
///
/// Exactly one state holds at any instant. There is no terminal state;
/// "clear" returns to [`ConversationState::Idle`] from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    /// Nothing in flight; ready for input.
    #[default]
    Idle,

    /// Speech input is capturing.
    Listening,

    /// Awaiting or streaming an answer.
    Thinking,

    /// Utterance playback is active.
    Speaking,
}

impl ConversationState {
    /// Short lowercase label for status displays and logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::Thinking => "thinking",
            Self::Speaking => "speaking",
        }
    }

    /// Whether a new answer request would be rejected.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self, Self::Thinking)
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
