//! CLI entry point - the composition root.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use voicebot_cli::handlers::{chat, serve};
use voicebot_cli::{Cli, CliError, Commands};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Serve { port, model } => serve::execute(serve::ServeArgs { port, model }).await,
        Commands::Chat {
            locale,
            server,
            delay_ms,
        } => {
            chat::execute(chat::ChatArgs {
                locale,
                server,
                delay: Duration::from_millis(delay_ms),
            })
            .await
        }
    }
}

/// Logs go to stderr so they never interleave with chat output on stdout.
fn init_tracing(cli: &Cli) {
    let default = match (&cli.command, cli.verbose) {
        (_, true) => "debug",
        (Commands::Serve { .. }, false) => "info",
        (Commands::Chat { .. }, false) => "warn",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
