//! HTTP handlers.

pub mod voicebot;
