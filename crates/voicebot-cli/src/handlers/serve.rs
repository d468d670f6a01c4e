//! `voicebot serve`: run the answer endpoint.

use voicebot_axum::{ServerConfig, start_server};

use crate::error::CliError;

/// Arguments for the serve command.
#[derive(Debug, Clone, Default)]
pub struct ServeArgs {
    pub port: Option<u16>,
    pub model: Option<String>,
}

/// Apply command-line overrides on top of the environment configuration.
pub fn resolve_config(base: ServerConfig, args: &ServeArgs) -> ServerConfig {
    let mut config = base;
    if let Some(port) = args.port {
        config = config.with_port(port);
    }
    if let Some(model) = &args.model {
        config = config.with_model(model.clone());
    }
    config
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs) -> Result<(), CliError> {
    let base = ServerConfig::from_env().map_err(|e| CliError::Config(format!("{e:#}")))?;
    let config = resolve_config(base, &args);

    tracing::info!(
        port = config.port,
        model = %config.provider.model,
        "Starting voicebot answer endpoint"
    );

    start_server(config)
        .await
        .map_err(|e| CliError::Server(format!("{e:#}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_environment() {
        let base = ServerConfig::with_defaults("sk").with_port(1234);
        let config = resolve_config(
            base,
            &ServeArgs {
                port: Some(9000),
                model: Some("gpt-x".into()),
            },
        );
        assert_eq!(config.port, 9000);
        assert_eq!(config.provider.model, "gpt-x");
    }

    #[test]
    fn absent_flags_keep_environment() {
        let base = ServerConfig::with_defaults("sk").with_port(1234);
        let config = resolve_config(base, &ServeArgs::default());
        assert_eq!(config.port, 1234);
    }
}
