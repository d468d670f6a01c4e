//! Command-line definition.

use clap::{Parser, Subcommand};
use voicebot_core::DEFAULT_LOCALE;

/// Default delay between mock answer fragments, in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 18;

/// Voice assistant demo: answer endpoint and text chat.
#[derive(Debug, Parser)]
#[command(name = "voicebot")]
#[command(about = "Voice assistant demo: answer endpoint and text chat")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP answer endpoint
    Serve {
        /// Port to listen on (default: $PORT or 8787)
        #[arg(short, long)]
        port: Option<u16>,

        /// Provider model id (default: $VOICEBOT_MODEL or gpt-4.1-mini)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Chat with the assistant by typing
    Chat {
        /// Locale for answers, e.g. es-ES
        #[arg(short, long, env = "VOICEBOT_LOCALE", default_value = DEFAULT_LOCALE)]
        locale: String,

        /// Base URL of a running `voicebot serve`; the local mock answers otherwise
        #[arg(short, long, env = "VOICEBOT_SERVER_URL")]
        server: Option<String>,

        /// Delay between mock answer fragments
        #[arg(long, default_value_t = DEFAULT_DELAY_MS)]
        delay_ms: u64,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_flags() {
        let cli = Cli::parse_from(["voicebot", "serve", "--port", "9000", "-m", "gpt-x"]);
        match cli.command {
            Commands::Serve { port, model } => {
                assert_eq!(port, Some(9000));
                assert_eq!(model.as_deref(), Some("gpt-x"));
            }
            Commands::Chat { .. } => panic!("expected serve"),
        }
    }

    #[test]
    fn chat_defaults() {
        let cli = Cli::parse_from(["voicebot", "-v", "chat", "--server", "http://localhost:8787"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Chat {
                server, delay_ms, ..
            } => {
                assert_eq!(server.as_deref(), Some("http://localhost:8787"));
                assert_eq!(delay_ms, DEFAULT_DELAY_MS);
            }
            Commands::Serve { .. } => panic!("expected chat"),
        }
    }
}
