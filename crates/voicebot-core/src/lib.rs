#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod error;
pub mod events;
pub mod locale;
pub mod ports;
pub mod prompt;

// Re-export commonly used types for convenience
pub use domain::{
    ConversationLog, ConversationState, HistoryMessage, LogError, Role, SessionSettings, Turn,
    TurnId, TurnStatus,
};
pub use error::TurnError;
pub use events::{Notice, NoticeKind, TurnEvent};
pub use locale::{DEFAULT_LOCALE, base_language, same_language};
pub use ports::{
    AnswerRequest, AnswerSource, FragmentStream, InputError, InputEvent, OperationId,
    OutputError, OutputEvent, ProviderError, SpeechInputPort, SpeechOutputPort, Utterance,
    VoiceDescriptor, collect_answer,
};
pub use prompt::system_prompt_for_locale;
