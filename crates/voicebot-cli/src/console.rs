//! Speech ports for a plain terminal.
//!
//! A terminal has no microphone or synthesizer, so both ports report
//! themselves unsupported and the controller runs text-only.

use voicebot_core::{
    InputError, OperationId, OutputError, SpeechInputPort, SpeechOutputPort, Utterance,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleInput;

impl SpeechInputPort for ConsoleInput {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&self, _operation: OperationId, _language: &str) -> Result<(), InputError> {
        Err(InputError::Unsupported)
    }

    fn stop(&self) {}

    fn abort(&self) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleOutput;

impl SpeechOutputPort for ConsoleOutput {
    fn is_supported(&self) -> bool {
        false
    }

    fn speak(&self, _operation: OperationId, _utterance: &Utterance) -> Result<(), OutputError> {
        Err(OutputError::Unsupported)
    }

    fn cancel(&self) {}
}
