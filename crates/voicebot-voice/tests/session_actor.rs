//! Integration tests for the `TurnSession` actor.
//!
//! The session owns a `TurnController` on a tokio task and pumps answer
//! streams into it. These tests talk to it only through `SessionHandle`
//! and the `TurnEvent` receiver, the way a presentation layer would.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;
use voicebot_core::{
    ConversationState, InputError, OperationId, OutputError, OutputEvent, Role, SessionSettings,
    SpeechInputPort, SpeechOutputPort, TurnError, TurnEvent, TurnStatus, Utterance,
};
use voicebot_voice::{
    CancelReason, MockAnswerSource, PortEventSender, SessionHandle, TurnController, TurnSession,
    port_channel,
};

// ── Fake ports ─────────────────────────────────────────────────────

type Journal = Arc<Mutex<Vec<&'static str>>>;

struct RecordingInput {
    journal: Journal,
}

impl SpeechInputPort for RecordingInput {
    fn is_supported(&self) -> bool {
        true
    }

    fn start(&self, _operation: OperationId, _language: &str) -> Result<(), InputError> {
        self.journal.lock().unwrap().push("input.start");
        Ok(())
    }

    fn stop(&self) {
        self.journal.lock().unwrap().push("input.stop");
    }

    fn abort(&self) {
        self.journal.lock().unwrap().push("input.abort");
    }
}

/// Output that reports `Started` (and optionally `Ended`) back through the
/// session's port channel as soon as it is asked to speak.
struct ReportingOutput {
    port_tx: PortEventSender,
    finish_immediately: bool,
    journal: Journal,
}

impl SpeechOutputPort for ReportingOutput {
    fn is_supported(&self) -> bool {
        true
    }

    fn speak(&self, operation: OperationId, _utterance: &Utterance) -> Result<(), OutputError> {
        self.journal.lock().unwrap().push("output.speak");
        let _ = self.port_tx.send(OutputEvent::Started { operation }.into());
        if self.finish_immediately {
            let _ = self.port_tx.send(OutputEvent::Ended { operation }.into());
        }
        Ok(())
    }

    fn cancel(&self) {
        self.journal.lock().unwrap().push("output.cancel");
    }
}

// ── Helpers ────────────────────────────────────────────────────────

struct Running {
    handle: SessionHandle,
    events: UnboundedReceiver<TurnEvent>,
    journal: Journal,
    task: tokio::task::JoinHandle<TurnController>,
}

fn spawn_session(fragment_delay: Duration, finish_immediately: bool) -> Running {
    let journal = Journal::default();
    let (port_tx, port_rx) = port_channel();
    let input = RecordingInput {
        journal: Arc::clone(&journal),
    };
    let output = ReportingOutput {
        port_tx,
        finish_immediately,
        journal: Arc::clone(&journal),
    };
    let answers = Arc::new(MockAnswerSource::with_delay(fragment_delay));
    let (controller, events) = TurnController::new(Box::new(input), Box::new(output), answers);
    let (handle, task) = TurnSession::spawn(controller, port_rx);
    Running {
        handle,
        events,
        journal,
        task,
    }
}

/// Receive events until a `StateChanged` to `target`; returns every event seen.
async fn wait_for_state(
    events: &mut UnboundedReceiver<TurnEvent>,
    target: ConversationState,
) -> Vec<TurnEvent> {
    let mut seen = Vec::new();
    tokio::time::timeout(Duration::from_secs(30), async {
        while let Some(event) = events.recv().await {
            let done = event == TurnEvent::StateChanged { state: target };
            seen.push(event);
            if done {
                return;
            }
        }
        panic!("event channel closed before reaching {target}");
    })
    .await
    .expect("timed out waiting for state");
    seen
}

fn states_from(events: &[TurnEvent]) -> Vec<ConversationState> {
    events
        .iter()
        .filter_map(|e| match e {
            TurnEvent::StateChanged { state } => Some(*state),
            _ => None,
        })
        .collect()
}

fn quiet() -> SessionSettings {
    SessionSettings::default().with_auto_speak(false)
}

// ── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn typed_question_streams_to_a_complete_answer() {
    let mut s = spawn_session(Duration::ZERO, true);

    s.handle.submit_text("Explain barge-in", quiet()).await.unwrap();
    let events = wait_for_state(&mut s.events, ConversationState::Idle).await;

    assert_eq!(
        states_from(&events),
        vec![ConversationState::Thinking, ConversationState::Idle]
    );
    let turns = s.handle.snapshot().await.unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[1].status, TurnStatus::Complete);
    assert!(turns[1].text.contains("You said: “Explain barge-in”"));
}

#[tokio::test]
async fn auto_speak_plays_and_returns_to_idle() {
    let mut s = spawn_session(Duration::ZERO, true);

    s.handle
        .submit_text("hello", SessionSettings::default())
        .await
        .unwrap();
    let events = wait_for_state(&mut s.events, ConversationState::Idle).await;

    assert_eq!(
        states_from(&events),
        vec![
            ConversationState::Thinking,
            ConversationState::Speaking,
            ConversationState::Idle,
        ]
    );
    assert_eq!(s.journal.lock().unwrap().as_slice(), ["output.speak"]);
}

#[tokio::test(start_paused = true)]
async fn second_submit_while_thinking_is_busy() {
    let s = spawn_session(Duration::from_millis(20), true);

    s.handle.submit_text("first", quiet()).await.unwrap();
    let err = s.handle.submit_text("second", quiet()).await.unwrap_err();

    assert_eq!(err, TurnError::Busy(ConversationState::Thinking));
    assert_eq!(s.handle.snapshot().await.unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn clear_mid_stream_drops_the_answer() {
    let mut s = spawn_session(Duration::from_millis(20), true);

    s.handle.submit_text("question", quiet()).await.unwrap();
    // Wait for the first fragment to land.
    loop {
        match s.events.recv().await {
            Some(TurnEvent::TurnUpdated { turn }) if turn.status == TurnStatus::Streaming => break,
            Some(_) => {}
            None => panic!("session stopped"),
        }
    }

    s.handle.clear().await.unwrap();
    assert!(s.handle.snapshot().await.unwrap().is_empty());
    assert_eq!(s.handle.state().await.unwrap(), ConversationState::Idle);

    // Everything emitted up to and including the clear.
    while let Ok(event) = s.events.try_recv() {
        if event == TurnEvent::Cleared {
            break;
        }
    }

    tokio::time::sleep(Duration::from_secs(5)).await;
    let late: Vec<_> = std::iter::from_fn(|| s.events.try_recv().ok()).collect();
    assert!(
        !late
            .iter()
            .any(|e| matches!(e, TurnEvent::TurnUpdated { .. } | TurnEvent::TurnAppended { .. })),
        "late events after clear: {late:?}"
    );
}

#[tokio::test]
async fn barge_in_through_handle_cancels_before_listening() {
    let mut s = spawn_session(Duration::ZERO, false);

    s.handle
        .submit_text("talk", SessionSettings::default())
        .await
        .unwrap();
    wait_for_state(&mut s.events, ConversationState::Speaking).await;

    s.handle
        .start_listening(SessionSettings::default())
        .await
        .unwrap();

    assert_eq!(s.handle.state().await.unwrap(), ConversationState::Listening);
    assert_eq!(
        s.journal.lock().unwrap().as_slice(),
        ["output.speak", "output.cancel", "input.start"]
    );
}

#[tokio::test(start_paused = true)]
async fn stop_answer_keeps_partial_text() {
    let mut s = spawn_session(Duration::from_millis(20), true);

    s.handle.submit_text("question", quiet()).await.unwrap();
    loop {
        if let Some(TurnEvent::TurnUpdated { turn }) = s.events.recv().await {
            if turn.status == TurnStatus::Streaming {
                break;
            }
        }
    }

    s.handle.stop_answer(CancelReason::KeepPartial).await.unwrap();
    let turns = s.handle.snapshot().await.unwrap();
    assert_eq!(s.handle.state().await.unwrap(), ConversationState::Idle);
    assert_eq!(turns[1].status, TurnStatus::Complete);
    assert!(!turns[1].text.is_empty());
}

#[tokio::test]
async fn handle_reports_closed_after_shutdown() {
    let s = spawn_session(Duration::ZERO, true);

    s.handle.shutdown().await;
    let controller = s.task.await.unwrap();
    assert_eq!(controller.state(), ConversationState::Idle);

    let err = s.handle.submit_text("anyone?", quiet()).await.unwrap_err();
    assert_eq!(err, TurnError::SessionClosed);
}
