//! Turn session - async actor that drives a [`TurnController`].
//!
//! The controller is synchronous; something has to poll answer streams and
//! deliver port callbacks to it. [`TurnSession`] owns the controller on a
//! tokio task and `select!`s between:
//!
//! - commands from [`SessionHandle`]s (user actions),
//! - port events from speech adapters,
//! - the next fragment of the active answer stream.
//!
//! Commands are processed between fragments, so "clear" or a barge-in never
//! races a fragment being applied, and a cancelled stream is dropped before
//! it is polled again.

use futures_util::StreamExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use voicebot_core::{
    ConversationState, OperationId, ProviderError, SessionSettings, Turn, TurnError,
};

use crate::controller::{AnswerEvent, CancelReason, PendingAnswer, PortEvent, TurnController};

/// Capacity of the command channel.
const COMMAND_BUFFER: usize = 32;

/// Sender half used by speech adapters to report events to a session.
pub type PortEventSender = mpsc::UnboundedSender<PortEvent>;

/// Create the channel speech adapters report through.
///
/// Hand the sender to the adapters before building the controller, and the
/// receiver to [`TurnSession::spawn`].
#[must_use]
pub fn port_channel() -> (PortEventSender, mpsc::UnboundedReceiver<PortEvent>) {
    mpsc::unbounded_channel()
}

// ── Commands ───────────────────────────────────────────────────────

type Reply<T> = oneshot::Sender<T>;

enum SessionCommand {
    StartListening {
        settings: SessionSettings,
        reply: Reply<Result<(), TurnError>>,
    },
    StopListening,
    CommitSpeech {
        settings: SessionSettings,
        reply: Reply<Result<(), TurnError>>,
    },
    SubmitText {
        text: String,
        settings: SessionSettings,
        reply: Reply<Result<(), TurnError>>,
    },
    StopAnswer {
        reason: CancelReason,
    },
    StopSpeaking,
    SpeakLastAnswer {
        settings: SessionSettings,
        reply: Reply<Result<(), TurnError>>,
    },
    Clear {
        reply: Reply<()>,
    },
    State {
        reply: Reply<ConversationState>,
    },
    Snapshot {
        reply: Reply<Vec<Turn>>,
    },
    Shutdown,
}

// ── Handle ─────────────────────────────────────────────────────────

/// Cloneable handle to a running [`TurnSession`].
///
/// Every method fails with [`TurnError::SessionClosed`] (or returns a
/// default) once the session task has stopped.
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub async fn start_listening(&self, settings: SessionSettings) -> Result<(), TurnError> {
        self.request(|reply| SessionCommand::StartListening { settings, reply })
            .await?
    }

    pub async fn stop_listening(&self) -> Result<(), TurnError> {
        self.send(SessionCommand::StopListening).await
    }

    pub async fn commit_speech(&self, settings: SessionSettings) -> Result<(), TurnError> {
        self.request(|reply| SessionCommand::CommitSpeech { settings, reply })
            .await?
    }

    pub async fn submit_text(
        &self,
        text: impl Into<String>,
        settings: SessionSettings,
    ) -> Result<(), TurnError> {
        let text = text.into();
        self.request(|reply| SessionCommand::SubmitText {
            text,
            settings,
            reply,
        })
        .await?
    }

    pub async fn stop_answer(&self, reason: CancelReason) -> Result<(), TurnError> {
        self.send(SessionCommand::StopAnswer { reason }).await
    }

    pub async fn stop_speaking(&self) -> Result<(), TurnError> {
        self.send(SessionCommand::StopSpeaking).await
    }

    pub async fn speak_last_answer(&self, settings: SessionSettings) -> Result<(), TurnError> {
        self.request(|reply| SessionCommand::SpeakLastAnswer { settings, reply })
            .await?
    }

    /// Clear the conversation; resolves once the log is empty.
    pub async fn clear(&self) -> Result<(), TurnError> {
        self.request(|reply| SessionCommand::Clear { reply }).await
    }

    pub async fn state(&self) -> Result<ConversationState, TurnError> {
        self.request(|reply| SessionCommand::State { reply }).await
    }

    /// Owned copy of the conversation log.
    pub async fn snapshot(&self) -> Result<Vec<Turn>, TurnError> {
        self.request(|reply| SessionCommand::Snapshot { reply })
            .await
    }

    /// Ask the session to stop. In-flight work is cancelled; the log is kept
    /// until the task exits.
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Shutdown).await;
    }

    async fn send(&self, command: SessionCommand) -> Result<(), TurnError> {
        self.cmd_tx
            .send(command)
            .await
            .map_err(|_| TurnError::SessionClosed)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, TurnError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(build(reply_tx)).await?;
        reply_rx.await.map_err(|_| TurnError::SessionClosed)
    }
}

// ── Session actor ──────────────────────────────────────────────────

/// The actor that owns a [`TurnController`] and its active answer stream.
pub struct TurnSession {
    controller: TurnController,
    commands: mpsc::Receiver<SessionCommand>,
    port_events: mpsc::UnboundedReceiver<PortEvent>,
    stream: Option<PendingAnswer>,
}

impl TurnSession {
    /// Spawn the session on the current tokio runtime.
    pub fn spawn(
        controller: TurnController,
        port_events: mpsc::UnboundedReceiver<PortEvent>,
    ) -> (SessionHandle, JoinHandle<TurnController>) {
        let (cmd_tx, commands) = mpsc::channel(COMMAND_BUFFER);
        let session = Self {
            controller,
            commands,
            port_events,
            stream: None,
        };
        let task = tokio::spawn(session.run());
        (SessionHandle { cmd_tx }, task)
    }

    /// Run until shut down or every handle is dropped; returns the controller.
    async fn run(mut self) -> TurnController {
        tracing::info!("Turn session started");

        loop {
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(SessionCommand::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },

                Some(event) = self.port_events.recv() => self.controller.dispatch(event),

                (operation, item) = next_fragment(&mut self.stream) => {
                    self.on_stream_item(operation, item);
                }
            }

            self.sync_stream();
        }

        self.stream = None;
        self.controller.cancel_in_flight();
        tracing::info!("Turn session stopped");
        self.controller
    }

    fn handle(&mut self, command: SessionCommand) {
        let c = &mut self.controller;
        match command {
            SessionCommand::StartListening { settings, reply } => {
                let _ = reply.send(c.start_listening(&settings));
            }
            SessionCommand::StopListening => c.stop_listening(),
            SessionCommand::CommitSpeech { settings, reply } => {
                let _ = reply.send(c.commit_speech(&settings));
            }
            SessionCommand::SubmitText {
                text,
                settings,
                reply,
            } => {
                let _ = reply.send(c.submit_text(&text, &settings));
            }
            SessionCommand::StopAnswer { reason } => c.stop_answer(reason),
            SessionCommand::StopSpeaking => c.stop_speaking(),
            SessionCommand::SpeakLastAnswer { settings, reply } => {
                let _ = reply.send(c.speak_last_answer(&settings));
            }
            SessionCommand::Clear { reply } => {
                c.clear();
                let _ = reply.send(());
            }
            SessionCommand::State { reply } => {
                let _ = reply.send(c.state());
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(c.snapshot());
            }
            // Handled by the run loop.
            SessionCommand::Shutdown => {}
        }
    }

    fn on_stream_item(
        &mut self,
        operation: OperationId,
        item: Option<Result<String, ProviderError>>,
    ) {
        let event = match item {
            Some(Ok(text)) => AnswerEvent::Fragment { operation, text },
            Some(Err(error)) => {
                self.stream = None;
                AnswerEvent::Failed { operation, error }
            }
            None => {
                self.stream = None;
                AnswerEvent::Completed { operation }
            }
        };
        self.controller.dispatch(event);
    }

    /// Pick up a newly requested stream, or drop one that was cancelled.
    fn sync_stream(&mut self) {
        if let Some(pending) = self.controller.take_answer_stream() {
            tracing::debug!(operation = %pending.operation, "Driving answer stream");
            self.stream = Some(pending);
            return;
        }
        let active = self.controller.active_answer();
        if let Some(ref pending) = self.stream {
            if Some(pending.operation) != active {
                tracing::debug!(operation = %pending.operation, "Dropping cancelled answer stream");
                self.stream = None;
            }
        }
    }
}

/// Await the next item of the active stream; pending forever when idle.
async fn next_fragment(
    stream: &mut Option<PendingAnswer>,
) -> (OperationId, Option<Result<String, ProviderError>>) {
    match stream {
        Some(pending) => (pending.operation, pending.stream.next().await),
        None => std::future::pending().await,
    }
}
