//! The append-only conversation log.
//!
//! # Invariants
//!
//! - Insertion order is chronological order; turns are never removed except
//!   by [`ConversationLog::clear`].
//! - At most one assistant turn is open (`Pending` or `Streaming`) at a time,
//!   and only that turn's text/status is ever mutated in place.
//! - User turns are `Complete` on insertion.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::turn::{Role, Turn, TurnStatus};

/// A `{role, content}` pair sent to an answer source as conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

impl HistoryMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Violations of the log's single-open-turn discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LogError {
    /// An assistant turn is already pending or streaming.
    #[error("an assistant turn is already open")]
    AssistantTurnOpen,

    /// There is no open assistant turn to mutate.
    #[error("no assistant turn is open")]
    NoOpenTurn,
}

/// Ordered sequence of turns, written by a single owner.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    turns: Vec<Turn>,
    /// Index of the open assistant turn, if any.
    open: Option<usize>,
}

impl ConversationLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            turns: Vec::new(),
            open: None,
        }
    }

    /// Borrow all turns in chronological order.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// An owned copy of the log for readers outside the controller.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a finalized user turn and return it.
    pub fn push_user(&mut self, text: impl Into<String>) -> &Turn {
        self.turns.push(Turn::user(text));
        &self.turns[self.turns.len() - 1]
    }

    /// Open a new, empty assistant turn.
    pub fn begin_assistant(&mut self) -> Result<&Turn, LogError> {
        if self.open.is_some() {
            return Err(LogError::AssistantTurnOpen);
        }
        self.turns.push(Turn::pending_assistant());
        let index = self.turns.len() - 1;
        self.open = Some(index);
        Ok(&self.turns[index])
    }

    /// The currently open assistant turn, if any.
    #[must_use]
    pub fn open_turn(&self) -> Option<&Turn> {
        self.open.map(|i| &self.turns[i])
    }

    /// Append a fragment to the open turn, marking it `Streaming`.
    pub fn append_fragment(&mut self, fragment: &str) -> Result<&Turn, LogError> {
        let turn = self.open_mut()?;
        turn.text.push_str(fragment);
        turn.status = TurnStatus::Streaming;
        Ok(turn)
    }

    /// Close the open turn as `Complete`.
    ///
    /// If nothing but whitespace accumulated, the turn's text becomes
    /// `placeholder`.
    pub fn complete_open(&mut self, placeholder: &str) -> Result<&Turn, LogError> {
        let index = self.open.take().ok_or(LogError::NoOpenTurn)?;
        let turn = &mut self.turns[index];
        if turn.text.trim().is_empty() {
            turn.text = placeholder.to_owned();
        }
        turn.status = TurnStatus::Complete;
        Ok(turn)
    }

    /// Close the open turn as `Failed`, replacing its text with `message`.
    pub fn fail_open(&mut self, message: &str) -> Result<&Turn, LogError> {
        let index = self.open.take().ok_or(LogError::NoOpenTurn)?;
        let turn = &mut self.turns[index];
        message.clone_into(&mut turn.text);
        turn.status = TurnStatus::Failed;
        Ok(turn)
    }

    /// The most recent assistant turn that finished successfully.
    #[must_use]
    pub fn last_complete_answer(&self) -> Option<&Turn> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.is_assistant() && t.status == TurnStatus::Complete)
    }

    /// Remove every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.open = None;
    }

    /// Project the log into the history shape sent to answer sources.
    ///
    /// Failed turns and still-open assistant turns are skipped: they carry
    /// fallback or partial text that the provider never produced.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryMessage> {
        self.turns
            .iter()
            .filter(|t| t.status == TurnStatus::Complete)
            .map(|t| HistoryMessage::new(t.role, t.text.clone()))
            .collect()
    }

    fn open_mut(&mut self) -> Result<&mut Turn, LogError> {
        let index = self.open.ok_or(LogError::NoOpenTurn)?;
        Ok(&mut self.turns[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_log_is_empty() {
        let log = ConversationLog::new();
        assert!(log.is_empty());
        assert!(log.open_turn().is_none());
    }

    #[test]
    fn fragments_accumulate_in_order() {
        let mut log = ConversationLog::new();
        log.push_user("Explain barge-in");
        log.begin_assistant().unwrap();

        for fragment in ["Barge-in", " ", "lets", " ", "you", " ", "interrupt."] {
            let turn = log.append_fragment(fragment).unwrap();
            assert_eq!(turn.status, TurnStatus::Streaming);
        }

        let turn = log.complete_open("placeholder").unwrap();
        assert_eq!(turn.text, "Barge-in lets you interrupt.");
        assert_eq!(turn.status, TurnStatus::Complete);
        assert!(log.open_turn().is_none());
    }

    #[test]
    fn only_one_assistant_turn_may_be_open() {
        let mut log = ConversationLog::new();
        log.begin_assistant().unwrap();
        assert_eq!(log.begin_assistant().unwrap_err(), LogError::AssistantTurnOpen);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn empty_completion_uses_placeholder() {
        let mut log = ConversationLog::new();
        log.begin_assistant().unwrap();
        log.append_fragment("  ").unwrap();
        let turn = log.complete_open("No answer.").unwrap();
        assert_eq!(turn.text, "No answer.");
        assert_eq!(turn.status, TurnStatus::Complete);
    }

    #[test]
    fn failing_replaces_partial_text() {
        let mut log = ConversationLog::new();
        log.begin_assistant().unwrap();
        log.append_fragment("partial").unwrap();
        let turn = log.fail_open("fallback").unwrap();
        assert_eq!(turn.text, "fallback");
        assert_eq!(turn.status, TurnStatus::Failed);
    }

    #[test]
    fn mutation_without_open_turn_is_rejected() {
        let mut log = ConversationLog::new();
        log.push_user("hi");
        assert_eq!(log.append_fragment("x").unwrap_err(), LogError::NoOpenTurn);
        assert_eq!(log.complete_open("p").unwrap_err(), LogError::NoOpenTurn);
        assert_eq!(log.fail_open("f").unwrap_err(), LogError::NoOpenTurn);
        assert_eq!(log.turns()[0].text, "hi");
    }

    #[test]
    fn history_skips_failed_and_open_turns() {
        let mut log = ConversationLog::new();
        log.push_user("one");
        log.begin_assistant().unwrap();
        log.fail_open("fallback").unwrap();
        log.push_user("two");
        log.begin_assistant().unwrap();
        log.append_fragment("answer").unwrap();
        log.complete_open("p").unwrap();
        log.push_user("three");
        log.begin_assistant().unwrap();

        let history = log.history();
        assert_eq!(
            history,
            vec![
                HistoryMessage::new(Role::User, "one"),
                HistoryMessage::new(Role::User, "two"),
                HistoryMessage::new(Role::Assistant, "answer"),
                HistoryMessage::new(Role::User, "three"),
            ]
        );
    }

    #[test]
    fn clear_drops_turns_and_open_marker() {
        let mut log = ConversationLog::new();
        log.push_user("hi");
        log.begin_assistant().unwrap();
        log.clear();
        assert!(log.is_empty());
        assert!(log.open_turn().is_none());
        assert!(log.begin_assistant().is_ok());
    }

    #[test]
    fn last_complete_answer_ignores_failures() {
        let mut log = ConversationLog::new();
        log.begin_assistant().unwrap();
        log.append_fragment("good").unwrap();
        log.complete_open("p").unwrap();
        log.begin_assistant().unwrap();
        log.fail_open("bad").unwrap();

        assert_eq!(log.last_complete_answer().map(|t| t.text.as_str()), Some("good"));
    }

    #[test]
    fn history_message_wire_shape() {
        let msg = HistoryMessage::new(Role::Assistant, "hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hello"}"#);
    }
}
