//! A single turn (user or assistant message) in the conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a turn, used by presentation layers to key updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Parse a role from its wire string.
    ///
    /// Anything other than `"assistant"` is treated as a user message,
    /// which is how the answer endpoint normalises incoming history.
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        if s == "assistant" {
            Self::Assistant
        } else {
            Self::User
        }
    }

    /// Convert role to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a turn.
///
/// User turns are always [`TurnStatus::Complete`]. Assistant turns start as
/// [`TurnStatus::Pending`], become [`TurnStatus::Streaming`] on the first
/// fragment and end as either `Complete` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnStatus {
    Pending,
    Streaming,
    Complete,
    Failed,
}

impl TurnStatus {
    /// Whether the turn's text can still change.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Streaming)
    }
}

/// One utterance in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub id: TurnId,
    pub role: Role,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub status: TurnStatus,
}

impl Turn {
    /// A finalized user turn.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            role: Role::User,
            text: text.into(),
            created_at: Utc::now(),
            status: TurnStatus::Complete,
        }
    }

    /// An empty assistant turn awaiting its first fragment.
    #[must_use]
    pub fn pending_assistant() -> Self {
        Self {
            id: TurnId::new(),
            role: Role::Assistant,
            text: String::new(),
            created_at: Utc::now(),
            status: TurnStatus::Pending,
        }
    }

    #[must_use]
    pub const fn is_assistant(&self) -> bool {
        matches!(self.role, Role::Assistant)
    }
}
