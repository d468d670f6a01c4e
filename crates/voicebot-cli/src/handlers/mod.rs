//! Command handlers.

pub mod chat;
pub mod serve;
