//! Pieces of the chat REPL that do not touch the terminal.

use std::fmt::Write as _;

use voicebot_core::{Notice, Role, Turn, TurnEvent, TurnId, TurnStatus};

pub const HELP: &str = "\
Type a question and press Enter.
  /clear    forget the conversation
  /history  print the conversation so far
  /help     show this help
  /quit     exit";

/// One line of user input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    Clear,
    History,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Self::Ask(line.to_owned());
        };
        match command.to_ascii_lowercase().as_str() {
            "clear" => Self::Clear,
            "history" => Self::History,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => Self::Unknown(line.to_owned()),
        }
    }
}

/// Render the conversation log for `/history`.
pub fn format_history(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "(no messages yet)".to_owned();
    }
    let mut out = String::new();
    for turn in turns {
        let who = match turn.role {
            Role::User => "you",
            Role::Assistant => "bot",
        };
        let marker = match turn.status {
            TurnStatus::Failed => " [failed]",
            TurnStatus::Pending | TurnStatus::Streaming => " […]",
            TurnStatus::Complete => "",
        };
        let _ = writeln!(
            out,
            "[{}] {who}{marker}: {}",
            turn.created_at.format("%H:%M:%S"),
            turn.text
        );
    }
    out.truncate(out.trim_end().len());
    out
}

/// Turns controller events into incremental terminal output.
///
/// Assistant text arrives as whole-turn snapshots; only the part not yet
/// shown is printed.
#[derive(Debug, Default)]
pub struct TranscriptPrinter {
    current: Option<TurnId>,
    shown: String,
}

impl TranscriptPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to write to stdout for `event`, if any.
    pub fn render(&mut self, event: &TurnEvent) -> Option<String> {
        match event {
            TurnEvent::TurnAppended { turn } if turn.is_assistant() => {
                self.current = Some(turn.id);
                self.shown.clear();
                Some("bot> ".to_owned())
            }
            TurnEvent::TurnUpdated { turn } if self.current == Some(turn.id) => {
                Some(self.render_update(turn))
            }
            TurnEvent::Cleared => {
                self.current = None;
                Some("(conversation cleared)\n".to_owned())
            }
            _ => None,
        }
    }

    fn render_update(&mut self, turn: &Turn) -> String {
        let mut out = match turn.text.strip_prefix(self.shown.as_str()) {
            Some(rest) => rest.to_owned(),
            // The text was replaced (fallback message) rather than extended.
            None => format!("\n{}", turn.text),
        };
        self.shown.clone_from(&turn.text);
        if !turn.status.is_open() {
            self.current = None;
            out.push('\n');
        }
        out
    }
}

/// Text to write to stderr for a notice.
pub fn render_notice(notice: &Notice) -> String {
    format!("[{:?}] {}", notice.kind, notice.message)
}
