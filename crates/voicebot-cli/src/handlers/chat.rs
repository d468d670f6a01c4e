//! `voicebot chat`: a text-only session against the turn controller.
//!
//! Line editing runs on its own thread (rustyline blocks); each line is
//! handed to the async side, which waits for the answer to finish before
//! letting the reader prompt again. Ctrl-C while an answer streams stops
//! it and keeps what arrived so far.

use std::io::Write as _;
use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use voicebot_core::{AnswerSource, ConversationState, SessionSettings, TurnError, TurnEvent};
use voicebot_voice::{
    CancelReason, MockAnswerSource, SessionHandle, TurnController, TurnSession, port_channel,
};

use crate::console::{ConsoleInput, ConsoleOutput};
use crate::error::CliError;
use crate::remote::RemoteAnswerSource;
use crate::repl::{HELP, ReplCommand, TranscriptPrinter, format_history, render_notice};

const PROMPT: &str = "you> ";

/// Arguments for the chat command.
#[derive(Debug, Clone)]
pub struct ChatArgs {
    pub locale: String,
    pub server: Option<String>,
    pub delay: Duration,
}

/// Pick the answer source: a remote endpoint if one is given, the mock otherwise.
pub fn answer_source(args: &ChatArgs) -> Result<Arc<dyn AnswerSource>, CliError> {
    match args.server.as_deref() {
        Some(url) => {
            let remote =
                RemoteAnswerSource::new(url).map_err(|e| CliError::Config(e.to_string()))?;
            tracing::info!(endpoint = %remote.endpoint(), "Using remote answer endpoint");
            Ok(Arc::new(remote))
        }
        None => Ok(Arc::new(MockAnswerSource::with_delay(args.delay))),
    }
}

/// Execute the chat command.
pub async fn execute(args: ChatArgs) -> Result<(), CliError> {
    let answers = answer_source(&args)?;
    let settings = SessionSettings::for_locale(args.locale.clone()).with_auto_speak(false);

    let (controller, events) =
        TurnController::new(Box::new(ConsoleInput), Box::new(ConsoleOutput), answers);
    // Console ports never report; the sender only keeps the channel open.
    let (_port_tx, port_rx) = port_channel();
    let (handle, session) = TurnSession::spawn(controller, port_rx);

    let (idle_tx, mut idle_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_events(events, idle_tx));

    println!("voicebot chat ({}). Type /help for commands.", args.locale);
    let (mut lines, acks) = spawn_line_reader();

    while let Some(input) = lines.recv().await {
        let keep_going = match input {
            LineInput::Eof => false,
            LineInput::Interrupted => true,
            LineInput::Line(line) => {
                handle_line(&handle, &settings, &mut idle_rx, ReplCommand::parse(&line)).await
            }
        };
        if !keep_going || acks.send(()).is_err() {
            break;
        }
    }

    handle.shutdown().await;
    if let Ok(controller) = session.await {
        tracing::debug!(turns = controller.log().len(), "Chat session ended");
    }
    let _ = printer.await;
    Ok(())
}

/// Run one REPL command; returns `false` when the session should end.
async fn handle_line(
    handle: &SessionHandle,
    settings: &SessionSettings,
    idle_rx: &mut mpsc::UnboundedReceiver<()>,
    command: ReplCommand,
) -> bool {
    let result = match command {
        ReplCommand::Empty => Ok(()),
        ReplCommand::Quit => return false,
        ReplCommand::Help => {
            println!("{HELP}");
            Ok(())
        }
        ReplCommand::Unknown(command) => {
            eprintln!("Unknown command {command}. Type /help.");
            Ok(())
        }
        ReplCommand::History => handle
            .snapshot()
            .await
            .map(|turns| println!("{}", format_history(&turns))),
        ReplCommand::Clear => handle.clear().await,
        ReplCommand::Ask(text) => match handle.submit_text(text, settings.clone()).await {
            Ok(()) => {
                wait_for_answer(handle, idle_rx).await;
                Ok(())
            }
            Err(err) => Err(err),
        },
    };

    match result {
        Ok(()) => true,
        Err(TurnError::SessionClosed) => false,
        Err(err) => {
            eprintln!("{err}");
            true
        }
    }
}

/// Wait until the controller is idle again; Ctrl-C stops the answer early.
async fn wait_for_answer(handle: &SessionHandle, idle_rx: &mut mpsc::UnboundedReceiver<()>) {
    tokio::select! {
        _ = idle_rx.recv() => {}
        _ = tokio::signal::ctrl_c() => {
            let _ = handle.stop_answer(CancelReason::KeepPartial).await;
            idle_rx.recv().await;
        }
    }
}

/// Render controller events; signals `idle_tx` every time the state returns to idle.
async fn print_events(
    mut events: mpsc::UnboundedReceiver<TurnEvent>,
    idle_tx: mpsc::UnboundedSender<()>,
) {
    let mut printer = TranscriptPrinter::new();
    while let Some(event) = events.recv().await {
        if let Some(text) = printer.render(&event) {
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
        match event {
            TurnEvent::Notice { notice } => eprintln!("{}", render_notice(&notice)),
            TurnEvent::StateChanged {
                state: ConversationState::Idle,
            } => {
                let _ = idle_tx.send(());
            }
            _ => {}
        }
    }
}

// ── Line reader ────────────────────────────────────────────────────

enum LineInput {
    Line(String),
    Interrupted,
    Eof,
}

/// Read lines on a dedicated thread. After each line the thread waits for
/// an acknowledgement before prompting again.
fn spawn_line_reader() -> (mpsc::Receiver<LineInput>, std_mpsc::Sender<()>) {
    let (line_tx, line_rx) = mpsc::channel(1);
    let (ack_tx, ack_rx) = std_mpsc::channel::<()>();

    std::thread::spawn(move || {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(err) => {
                tracing::error!(%err, "Failed to open line editor");
                let _ = line_tx.blocking_send(LineInput::Eof);
                return;
            }
        };

        loop {
            let input = match editor.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    LineInput::Line(line)
                }
                Err(ReadlineError::Interrupted) => LineInput::Interrupted,
                Err(ReadlineError::Eof) => LineInput::Eof,
                Err(err) => {
                    tracing::warn!(%err, "Failed to read input");
                    LineInput::Eof
                }
            };
            let eof = matches!(input, LineInput::Eof);
            if line_tx.blocking_send(input).is_err() || eof || ack_rx.recv().is_err() {
                break;
            }
        }
    });

    (line_rx, ack_tx)
}
