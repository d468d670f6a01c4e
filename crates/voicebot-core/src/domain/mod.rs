//! Domain types for the conversation.
//!
//! These types represent turns, the conversation log and the turn-taking
//! state, independent of any speech platform or transport.

mod conversation;
mod settings;
mod state;
mod turn;

pub use conversation::{ConversationLog, HistoryMessage, LogError};
pub use settings::SessionSettings;
pub use state::ConversationState;
pub use turn::{Role, Turn, TurnId, TurnStatus};
