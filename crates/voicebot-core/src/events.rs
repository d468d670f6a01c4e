//! Notifications emitted by the turn controller.
//!
//! Presentation layers subscribe to these instead of polling controller
//! state. Every event is a snapshot: consumers never need to read the
//! controller back to render it.

use serde::{Deserialize, Serialize};

use crate::domain::{ConversationState, Turn};

/// A change the presentation layer may want to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TurnEvent {
    /// The turn-taking state moved. Only emitted on an actual change.
    StateChanged { state: ConversationState },

    /// A new turn was added to the log.
    TurnAppended { turn: Turn },

    /// The open assistant turn gained text or was closed.
    TurnUpdated { turn: Turn },

    /// The live transcript buffers changed.
    #[serde(rename_all = "camelCase")]
    TranscriptChanged { interim: String, final_text: String },

    /// A condition the user should be told about.
    Notice { notice: Notice },

    /// The log and transcript were wiped.
    Cleared,
}

/// Category of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Speech input is unavailable; typed input still works.
    InputUnsupported,
    /// Speech recognition reported an error.
    Input,
    /// The answer source failed.
    Provider,
    /// Playback failed or is unavailable.
    Output,
}

/// A user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
