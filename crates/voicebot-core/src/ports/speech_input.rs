//! Speech input port - the platform speech recognizer.

use thiserror::Error;

use super::OperationId;

/// Reasons a recognition session can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// The host exposes no speech recognizer.
    #[error("speech input is not supported on this host")]
    Unsupported,

    /// Microphone or recognition permission was refused.
    #[error("microphone permission denied")]
    PermissionDenied,

    /// The recognizer heard nothing it could transcribe.
    #[error("no speech detected")]
    NoSpeech,

    /// No audio capture device is available.
    #[error("no audio capture device")]
    NoCaptureDevice,

    /// The recognition service could not be reached.
    #[error("recognition network error")]
    Network,

    /// The session was aborted.
    #[error("recognition aborted")]
    Aborted,

    /// Any other platform-reported reason.
    #[error("recognition failed: {0}")]
    Other(String),
}

impl InputError {
    /// Map a platform error code (Web Speech API style) to an `InputError`.
    #[must_use]
    pub fn from_reason(reason: &str) -> Self {
        match reason {
            "not-allowed" | "service-not-allowed" => Self::PermissionDenied,
            "no-speech" => Self::NoSpeech,
            "audio-capture" => Self::NoCaptureDevice,
            "network" => Self::Network,
            "aborted" => Self::Aborted,
            "" => Self::Other("unknown_error".to_owned()),
            other => Self::Other(other.to_owned()),
        }
    }
}

/// Events reported by a speech input adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Non-final hypothesis; replaces any previous interim text.
    Interim { operation: OperationId, text: String },

    /// Finalized segment; appended to the transcript buffer.
    Final { operation: OperationId, text: String },

    /// The recognizer stopped (on request or on its own).
    Ended { operation: OperationId },

    /// Recognition failed.
    Error {
        operation: OperationId,
        error: InputError,
    },
}

impl InputEvent {
    /// The listen session this event belongs to.
    #[must_use]
    pub const fn operation(&self) -> OperationId {
        match self {
            Self::Interim { operation, .. }
            | Self::Final { operation, .. }
            | Self::Ended { operation }
            | Self::Error { operation, .. } => *operation,
        }
    }
}

/// A speech recognizer.
///
/// Adapters translate platform callbacks into [`InputEvent`]s tagged with
/// the `operation` passed to [`start`](SpeechInputPort::start) and deliver
/// them to the controller's dispatch function.
pub trait SpeechInputPort: Send + Sync {
    /// Whether the host can recognize speech at all.
    fn is_supported(&self) -> bool;

    /// Begin a recognition session in `language`.
    ///
    /// Starting while a session is active must not fail hard: adapters
    /// either restart or ignore the call.
    fn start(&self, operation: OperationId, language: &str) -> Result<(), InputError>;

    /// Stop gracefully, letting any pending final result arrive.
    fn stop(&self);

    /// Stop immediately and discard pending results.
    fn abort(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_reasons_map_to_variants() {
        assert_eq!(InputError::from_reason("not-allowed"), InputError::PermissionDenied);
        assert_eq!(InputError::from_reason("no-speech"), InputError::NoSpeech);
        assert_eq!(InputError::from_reason("audio-capture"), InputError::NoCaptureDevice);
        assert_eq!(
            InputError::from_reason("language-not-supported"),
            InputError::Other("language-not-supported".to_owned())
        );
        assert_eq!(
            InputError::from_reason(""),
            InputError::Other("unknown_error".to_owned())
        );
    }

    #[test]
    fn event_reports_its_operation() {
        let op = OperationId::new(7);
        assert_eq!(InputEvent::Ended { operation: op }.operation(), op);
        assert_eq!(
            InputEvent::Final {
                operation: op,
                text: "hi".into()
            }
            .operation(),
            op
        );
    }
}
