//! Speech output port - the platform speech synthesizer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::OperationId;
use crate::domain::SessionSettings;

/// Reasons playback can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputError {
    /// The host exposes no speech synthesizer.
    #[error("speech output is not supported on this host")]
    Unsupported,

    /// The synthesizer rejected or failed the utterance.
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

/// A voice offered by the synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceDescriptor {
    /// Platform voice identity (e.g. a `voiceURI`).
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Locale tag the voice speaks.
    pub language: String,
    /// Whether this is the platform's default voice.
    #[serde(default)]
    pub is_default: bool,
}

/// One playback request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utterance {
    pub text: String,
    pub voice_id: Option<String>,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub language: String,
}

impl Utterance {
    /// Build an utterance for `text` from the caller's (clamped) settings.
    #[must_use]
    pub fn from_settings(text: impl Into<String>, settings: &SessionSettings) -> Self {
        let settings = settings.clamped();
        Self {
            text: text.into(),
            voice_id: settings.voice_id,
            rate: settings.rate,
            pitch: settings.pitch,
            volume: settings.volume,
            language: settings.output_language,
        }
    }
}

/// Events reported by a speech output adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputEvent {
    /// Audio began playing.
    Started { operation: OperationId },

    /// Playback drained naturally.
    Ended { operation: OperationId },

    /// Playback failed.
    Error {
        operation: OperationId,
        error: OutputError,
    },
}

impl OutputEvent {
    /// The utterance this event belongs to.
    #[must_use]
    pub const fn operation(&self) -> OperationId {
        match self {
            Self::Started { operation } | Self::Ended { operation } | Self::Error { operation, .. } => {
                *operation
            }
        }
    }
}

/// A speech synthesizer.
pub trait SpeechOutputPort: Send + Sync {
    /// Whether the host can synthesize speech at all.
    fn is_supported(&self) -> bool;

    /// Voices currently offered by the platform.
    fn voices(&self) -> Vec<VoiceDescriptor> {
        Vec::new()
    }

    /// Queue `utterance` for playback.
    fn speak(&self, operation: OperationId, utterance: &Utterance) -> Result<(), OutputError>;

    /// Stop any playback immediately.
    ///
    /// Must be safe to call when idle, and must have taken effect by the
    /// time it returns: the controller starts speech input right after a
    /// barge-in cancel.
    fn cancel(&self);
}
