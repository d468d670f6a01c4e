//! CLI-specific error types and exit codes.

use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Terminal I/O failed.
    #[error("IO error: {0}")]
    Io(String),

    /// The HTTP server could not start or stopped with an error.
    #[error("Server error: {0}")]
    Server(String),
}

impl CliError {
    /// Map error to an exit code (sysexits.h where one fits).
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 78, // EX_CONFIG
            Self::Io(_) => 74,     // EX_IOERR
            Self::Server(_) => 1,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
