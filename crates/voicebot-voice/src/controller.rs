//! Turn controller - the conversation state machine.
//!
//! The controller owns the conversation log and mediates between the three
//! external capabilities: speech input, speech output and the answer source.
//!
//! ```text
//!            start_listening             commit / submit
//!   Idle ───────────────────▶ Listening ─────────────────▶ Thinking
//!    ▲  ▲                        │  ▲                        │
//!    │  └── stop / ended ────────┘  │ barge-in               │ completed
//!    │                              │                        ▼
//!    └──────── ended / stop ─────── Speaking ◀───── (auto-speak)
//! ```
//!
//! Everything here is synchronous. Port callbacks and answer-stream items
//! come back in through [`TurnController::dispatch`], tagged with the
//! [`OperationId`] they belong to; events for an operation that is no
//! longer current are dropped. The async driving loop lives in
//! [`crate::session`].

use std::sync::Arc;

use tokio::sync::mpsc;
use voicebot_core::{
    AnswerRequest, AnswerSource, ConversationLog, ConversationState, FragmentStream, InputEvent,
    Notice, NoticeKind, OperationId, OutputEvent, ProviderError, SessionSettings,
    SpeechInputPort, SpeechOutputPort, Turn, TurnError, TurnEvent, Utterance,
};

use crate::text_utils;

/// Assistant text used when the answer source fails.
pub const FALLBACK_ANSWER: &str =
    "Sorry, I couldn't get an answer just now. Please try again.";

/// Assistant text used when an answer completes with no content.
pub const EMPTY_ANSWER_PLACEHOLDER: &str = "(no answer)";

/// Assistant text used when an in-flight answer is cancelled as failed.
pub const CANCELLED_ANSWER: &str = "(answer cancelled)";

// ── Answer stream events ───────────────────────────────────────────

/// Items of an answer stream, tagged with the request they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerEvent {
    /// Next fragment of the answer.
    Fragment { operation: OperationId, text: String },

    /// The stream ended after its last fragment.
    Completed { operation: OperationId },

    /// The stream failed; no further fragments follow.
    Failed {
        operation: OperationId,
        error: ProviderError,
    },
}

impl AnswerEvent {
    #[must_use]
    pub const fn operation(&self) -> OperationId {
        match self {
            Self::Fragment { operation, .. }
            | Self::Completed { operation }
            | Self::Failed { operation, .. } => *operation,
        }
    }
}

/// Anything that can be fed to [`TurnController::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortEvent {
    Input(InputEvent),
    Output(OutputEvent),
    Answer(AnswerEvent),
}

impl From<InputEvent> for PortEvent {
    fn from(event: InputEvent) -> Self {
        Self::Input(event)
    }
}

impl From<OutputEvent> for PortEvent {
    fn from(event: OutputEvent) -> Self {
        Self::Output(event)
    }
}

impl From<AnswerEvent> for PortEvent {
    fn from(event: AnswerEvent) -> Self {
        Self::Answer(event)
    }
}

/// What to do with the partial assistant turn when an answer is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancelReason {
    /// Keep whatever accumulated and mark the turn complete.
    #[default]
    KeepPartial,
    /// Mark the turn failed.
    Fail,
}

/// A freshly requested answer stream waiting to be driven.
pub struct PendingAnswer {
    pub operation: OperationId,
    pub stream: FragmentStream,
}

impl std::fmt::Debug for PendingAnswer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingAnswer")
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

// ── Live transcript ────────────────────────────────────────────────

/// Recognition buffers for the current or most recent listen session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    interim: String,
    final_text: String,
}

impl Transcript {
    /// Latest non-final hypothesis.
    #[must_use]
    pub fn interim(&self) -> &str {
        &self.interim
    }

    /// Accumulated final segments.
    #[must_use]
    pub fn final_text(&self) -> &str {
        &self.final_text
    }

    /// Text a "send speech" would submit: the final buffer, else the interim.
    #[must_use]
    pub fn committable(&self) -> &str {
        match self.final_text.trim() {
            "" => self.interim.trim(),
            text => text,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.committable().is_empty()
    }
}

struct ActiveAnswer {
    operation: OperationId,
    settings: SessionSettings,
}

// ── Turn controller ────────────────────────────────────────────────

/// The turn-taking state machine.
///
/// Construct with [`TurnController::new`], which also returns the receiver
/// for [`TurnEvent`] notifications.
pub struct TurnController {
    state: ConversationState,
    log: ConversationLog,
    transcript: Transcript,

    input: Box<dyn SpeechInputPort>,
    output: Box<dyn SpeechOutputPort>,
    answers: Arc<dyn AnswerSource>,

    /// Last issued operation id.
    last_op: OperationId,
    listen_op: Option<OperationId>,
    answer: Option<ActiveAnswer>,
    utterance_op: Option<OperationId>,
    pending: Option<PendingAnswer>,

    event_tx: mpsc::UnboundedSender<TurnEvent>,
}

impl TurnController {
    /// Create a controller over the given ports.
    ///
    /// If speech input is unavailable an `InputUnsupported` notice is queued
    /// immediately so the presentation layer can switch to typed input.
    pub fn new(
        input: Box<dyn SpeechInputPort>,
        output: Box<dyn SpeechOutputPort>,
        answers: Arc<dyn AnswerSource>,
    ) -> (Self, mpsc::UnboundedReceiver<TurnEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let controller = Self {
            state: ConversationState::Idle,
            log: ConversationLog::new(),
            transcript: Transcript::default(),
            input,
            output,
            answers,
            last_op: OperationId::new(0),
            listen_op: None,
            answer: None,
            utterance_op: None,
            pending: None,
            event_tx,
        };

        tracing::info!(
            input = controller.input.is_supported(),
            output = controller.output.is_supported(),
            answers = controller.answers.name(),
            "Turn controller created"
        );

        if !controller.input.is_supported() {
            controller.notice(
                NoticeKind::InputUnsupported,
                "Speech recognition is not available; type your message instead.",
            );
        }

        (controller, event_rx)
    }

    #[must_use]
    pub const fn state(&self) -> ConversationState {
        self.state
    }

    /// Read-only view of the conversation log.
    #[must_use]
    pub const fn log(&self) -> &ConversationLog {
        &self.log
    }

    /// Owned copy of every turn.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Turn> {
        self.log.snapshot()
    }

    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[must_use]
    pub fn input_supported(&self) -> bool {
        self.input.is_supported()
    }

    #[must_use]
    pub fn output_supported(&self) -> bool {
        self.output.is_supported()
    }

    /// Id of the answer request currently in flight.
    #[must_use]
    pub fn active_answer(&self) -> Option<OperationId> {
        self.answer.as_ref().map(|a| a.operation)
    }

    /// Hand over the stream of the most recent answer request.
    ///
    /// Returns `None` if no request was issued since the last call, or if
    /// the request was cancelled before anyone picked it up.
    pub fn take_answer_stream(&mut self) -> Option<PendingAnswer> {
        let pending = self.pending.take()?;
        (self.active_answer() == Some(pending.operation)).then_some(pending)
    }

    // ── Listening ──────────────────────────────────────────────────

    /// Start recognition in `settings.input_language`.
    ///
    /// From `Speaking` this is a barge-in: playback is cancelled before
    /// recognition starts. Already `Listening` is a no-op.
    pub fn start_listening(&mut self, settings: &SessionSettings) -> Result<(), TurnError> {
        if !self.input.is_supported() {
            self.notice(
                NoticeKind::InputUnsupported,
                "Speech recognition is not available; type your message instead.",
            );
            return Err(TurnError::InputUnsupported);
        }

        match self.state {
            ConversationState::Listening => return Ok(()),
            ConversationState::Thinking => return Err(TurnError::Busy(self.state)),
            ConversationState::Speaking => {
                tracing::info!("Barge-in: cancelling playback to listen");
                self.cancel_output();
            }
            ConversationState::Idle => {}
        }

        // A previous session may still be winding down after a graceful stop.
        if self.listen_op.take().is_some() {
            self.input.abort();
        }

        self.transcript.interim.clear();
        self.emit_transcript();

        let operation = self.next_operation();
        let language = settings.input_locale().to_owned();
        match self.input.start(operation, &language) {
            Ok(()) => {
                tracing::debug!(%operation, %language, "Speech input started");
                self.listen_op = Some(operation);
                self.set_state(ConversationState::Listening);
                Ok(())
            }
            Err(error) => {
                tracing::warn!(%error, "Speech input failed to start");
                self.notice(NoticeKind::Input, error.to_string());
                self.set_state(ConversationState::Idle);
                Err(TurnError::Input(error))
            }
        }
    }

    /// Stop recognition without committing.
    ///
    /// Interim text is discarded; a final result still in flight may be
    /// appended to the transcript until the recognizer reports `Ended`.
    pub fn stop_listening(&mut self) {
        if self.state != ConversationState::Listening {
            return;
        }
        self.input.stop();
        self.transcript.interim.clear();
        self.emit_transcript();
        self.set_state(ConversationState::Idle);
    }

    /// Submit the recognized transcript as the user's turn.
    ///
    /// Uses the final transcript, falling back to the interim hypothesis.
    /// Allowed while `Listening`, or while `Idle` with a buffered transcript.
    pub fn commit_speech(&mut self, settings: &SessionSettings) -> Result<(), TurnError> {
        if self.state.is_busy() {
            return Err(TurnError::Busy(self.state));
        }
        let text = self.transcript.committable().to_owned();
        if text.is_empty() {
            return Err(TurnError::EmptyInput);
        }

        if self.listen_op.take().is_some() {
            self.input.stop();
        }
        if self.state == ConversationState::Speaking {
            self.cancel_output();
        }
        self.transcript = Transcript::default();
        self.emit_transcript();

        self.begin_answer(text, settings);
        Ok(())
    }

    // ── Typed input ────────────────────────────────────────────────

    /// Submit typed text as the user's turn.
    ///
    /// Aborts recognition when `Listening` and cancels playback when
    /// `Speaking`. Rejected while an answer is in flight.
    pub fn submit_text(&mut self, text: &str, settings: &SessionSettings) -> Result<(), TurnError> {
        if self.state.is_busy() {
            return Err(TurnError::Busy(self.state));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(TurnError::EmptyInput);
        }

        if self.listen_op.take().is_some() {
            self.input.abort();
            self.transcript.interim.clear();
            self.emit_transcript();
        }
        if self.state == ConversationState::Speaking {
            self.cancel_output();
        }

        self.begin_answer(text.to_owned(), settings);
        Ok(())
    }

    // ── Answer lifecycle ───────────────────────────────────────────

    /// Cancel the in-flight answer, if any, and return to `Idle`.
    pub fn stop_answer(&mut self, reason: CancelReason) {
        let Some(active) = self.answer.take() else {
            return;
        };
        self.pending = None;
        tracing::info!(operation = %active.operation, ?reason, "Answer cancelled");

        let closed = match reason {
            CancelReason::KeepPartial => self.log.complete_open(EMPTY_ANSWER_PLACEHOLDER),
            CancelReason::Fail => self.log.fail_open(CANCELLED_ANSWER),
        };
        if let Ok(turn) = closed {
            let turn = turn.clone();
            self.emit(TurnEvent::TurnUpdated { turn });
        }
        self.set_state(ConversationState::Idle);
    }

    // ── Speaking ───────────────────────────────────────────────────

    /// Cancel playback. No-op unless `Speaking`.
    pub fn stop_speaking(&mut self) {
        if self.state != ConversationState::Speaking {
            return;
        }
        self.cancel_output();
        self.set_state(ConversationState::Idle);
    }

    /// Play the latest complete assistant answer again.
    pub fn speak_last_answer(&mut self, settings: &SessionSettings) -> Result<(), TurnError> {
        match self.state {
            ConversationState::Idle => {}
            ConversationState::Speaking => self.cancel_output(),
            busy => return Err(TurnError::Busy(busy)),
        }
        if !self.output.is_supported() {
            return Err(TurnError::OutputUnsupported);
        }
        let text = self
            .log
            .last_complete_answer()
            .map(|turn| turn.text.clone())
            .ok_or(TurnError::NothingToSpeak)?;

        // A stopped recognizer may still deliver results; drop it before playback.
        if self.listen_op.take().is_some() {
            self.input.abort();
        }
        self.speak(&text, settings);
        Ok(())
    }

    // ── Clear ──────────────────────────────────────────────────────

    /// Cancel everything in flight, empty the log and return to `Idle`.
    pub fn clear(&mut self) {
        self.cancel_in_flight();
        self.log.clear();
        self.transcript = Transcript::default();
        self.emit(TurnEvent::Cleared);
        self.set_state(ConversationState::Idle);
        tracing::info!("Conversation cleared");
    }

    /// Cancel input, answer and output without touching the log.
    pub fn cancel_in_flight(&mut self) {
        if self.listen_op.take().is_some() {
            self.input.abort();
        }
        if let Some(active) = self.answer.take() {
            tracing::debug!(operation = %active.operation, "Dropping in-flight answer");
            // Leave no open turn behind.
            let _ = self.log.fail_open(CANCELLED_ANSWER);
        }
        self.pending = None;
        self.cancel_output();
    }

    // ── Event dispatch ─────────────────────────────────────────────

    /// Apply an event reported by a port or an answer stream.
    pub fn dispatch(&mut self, event: impl Into<PortEvent>) {
        match event.into() {
            PortEvent::Input(event) => self.on_input(event),
            PortEvent::Output(event) => self.on_output(event),
            PortEvent::Answer(event) => self.on_answer(event),
        }
    }

    fn on_input(&mut self, event: InputEvent) {
        if self.listen_op != Some(event.operation()) {
            tracing::trace!(operation = %event.operation(), "Ignoring stale input event");
            return;
        }

        match event {
            InputEvent::Interim { text, .. } => {
                if self.state == ConversationState::Listening {
                    self.transcript.interim = text.trim().to_owned();
                    self.emit_transcript();
                }
            }
            InputEvent::Final { text, .. } => {
                self.transcript.final_text =
                    text_utils::append_segment(&self.transcript.final_text, text.trim());
                self.emit_transcript();
            }
            InputEvent::Ended { .. } => {
                self.listen_op = None;
                self.transcript.interim.clear();
                self.emit_transcript();
                if self.state == ConversationState::Listening {
                    self.set_state(ConversationState::Idle);
                }
            }
            InputEvent::Error { error, .. } => {
                tracing::warn!(%error, "Speech input error");
                self.listen_op = None;
                self.notice(NoticeKind::Input, error.to_string());
                if self.state == ConversationState::Listening {
                    self.set_state(ConversationState::Idle);
                }
            }
        }
    }

    fn on_output(&mut self, event: OutputEvent) {
        if self.utterance_op != Some(event.operation()) {
            tracing::trace!(operation = %event.operation(), "Ignoring stale output event");
            return;
        }

        match event {
            OutputEvent::Started { operation } => {
                tracing::debug!(%operation, "Playback started");
            }
            OutputEvent::Ended { operation } => {
                tracing::debug!(%operation, "Playback finished");
                self.utterance_op = None;
                self.set_state(ConversationState::Idle);
            }
            OutputEvent::Error { error, .. } => {
                tracing::warn!(%error, "Playback failed");
                self.utterance_op = None;
                self.notice(NoticeKind::Output, error.to_string());
                self.set_state(ConversationState::Idle);
            }
        }
    }

    fn on_answer(&mut self, event: AnswerEvent) {
        if self.active_answer() != Some(event.operation()) {
            tracing::trace!(operation = %event.operation(), "Ignoring stale answer event");
            return;
        }

        match event {
            AnswerEvent::Fragment { text, .. } => match self.log.append_fragment(&text) {
                Ok(turn) => {
                    let turn = turn.clone();
                    self.emit(TurnEvent::TurnUpdated { turn });
                }
                Err(error) => tracing::warn!(%error, "Fragment without an open turn"),
            },
            AnswerEvent::Completed { operation } => {
                let Some(active) = self.answer.take() else {
                    return;
                };
                let turn = match self.log.complete_open(EMPTY_ANSWER_PLACEHOLDER) {
                    Ok(turn) => turn.clone(),
                    Err(error) => {
                        tracing::warn!(%error, "Completion without an open turn");
                        self.set_state(ConversationState::Idle);
                        return;
                    }
                };
                tracing::debug!(%operation, chars = turn.text.len(), "Answer complete");
                self.emit(TurnEvent::TurnUpdated { turn: turn.clone() });

                if !active.settings.auto_speak {
                    self.set_state(ConversationState::Idle);
                } else if self.output.is_supported() {
                    self.speak(&turn.text, &active.settings);
                } else {
                    self.notice(NoticeKind::Output, "Speech output is not available.");
                    self.set_state(ConversationState::Idle);
                }
            }
            AnswerEvent::Failed { operation, error } => {
                self.answer = None;
                tracing::warn!(%operation, %error, "Answer source failed");
                match self.log.fail_open(FALLBACK_ANSWER) {
                    Ok(turn) => {
                        let turn = turn.clone();
                        self.emit(TurnEvent::TurnUpdated { turn });
                    }
                    Err(error) => tracing::warn!(%error, "Failure without an open turn"),
                }
                self.notice(NoticeKind::Provider, error.to_string());
                self.set_state(ConversationState::Idle);
            }
        }
    }

    // ── Internal helpers ───────────────────────────────────────────

    /// Append the user turn, open the assistant turn and request the answer.
    fn begin_answer(&mut self, text: String, settings: &SessionSettings) {
        let history = self.log.history();

        let user = self.log.push_user(text.clone()).clone();
        self.emit(TurnEvent::TurnAppended { turn: user });

        match self.log.begin_assistant() {
            Ok(turn) => {
                let turn = turn.clone();
                self.emit(TurnEvent::TurnAppended { turn });
            }
            Err(error) => {
                // Unreachable while busy-gating holds.
                tracing::warn!(%error, "Assistant turn already open");
            }
        }

        let operation = self.next_operation();
        let request = AnswerRequest::new(text, history, settings.input_locale());
        tracing::info!(
            %operation,
            locale = %request.locale,
            history = request.history.len(),
            source = self.answers.name(),
            "Requesting answer"
        );
        let stream = self.answers.answer(request);

        self.answer = Some(ActiveAnswer {
            operation,
            settings: settings.clone(),
        });
        self.pending = Some(PendingAnswer { operation, stream });
        self.set_state(ConversationState::Thinking);
    }

    /// Request playback of `text`; ends in `Speaking` or, on refusal, `Idle`.
    fn speak(&mut self, text: &str, settings: &SessionSettings) {
        let operation = self.next_operation();
        let utterance = Utterance::from_settings(text, settings);
        match self.output.speak(operation, &utterance) {
            Ok(()) => {
                tracing::debug!(%operation, voice = ?utterance.voice_id, "Playback requested");
                self.utterance_op = Some(operation);
                self.set_state(ConversationState::Speaking);
            }
            Err(error) => {
                tracing::warn!(%error, "Playback refused");
                self.notice(NoticeKind::Output, error.to_string());
                self.set_state(ConversationState::Idle);
            }
        }
    }

    /// Stop playback synchronously and forget the utterance.
    fn cancel_output(&mut self) {
        if let Some(operation) = self.utterance_op.take() {
            tracing::debug!(%operation, "Cancelling playback");
        }
        self.output.cancel();
    }

    fn next_operation(&mut self) -> OperationId {
        self.last_op = self.last_op.next();
        self.last_op
    }

    /// Transition to a new state and emit a state-change event.
    fn set_state(&mut self, new_state: ConversationState) {
        if self.state != new_state {
            tracing::debug!(old = ?self.state, new = ?new_state, "Turn state transition");
            self.state = new_state;
            self.emit(TurnEvent::StateChanged { state: new_state });
        }
    }

    fn emit_transcript(&self) {
        self.emit(TurnEvent::TranscriptChanged {
            interim: self.transcript.interim.clone(),
            final_text: self.transcript.final_text.clone(),
        });
    }

    fn notice(&self, kind: NoticeKind, message: impl Into<String>) {
        self.emit(TurnEvent::Notice {
            notice: Notice::new(kind, message),
        });
    }

    /// Emit a turn event (best-effort; if the receiver is dropped, we log and move on).
    fn emit(&self, event: TurnEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::warn!("Turn event receiver dropped");
        }
    }
}
