#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use axum as _;

// Used by main.rs binary
use dotenvy as _;
use tracing_subscriber as _;

pub mod console;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod remote;
pub mod repl;

pub use error::CliError;
pub use parser::{Cli, Commands};
pub use remote::RemoteAnswerSource;
