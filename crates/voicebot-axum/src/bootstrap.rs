//! Axum server bootstrap - the composition root.
//!
//! Builds the answer source from configuration and wires it into the
//! router. Everything concrete is instantiated here.

use std::sync::Arc;

use anyhow::{Context, Result};
use voicebot_core::AnswerSource;

use crate::provider::{DEFAULT_MODEL, DEFAULT_PROVIDER_URL, OpenAiAnswerSource, ProviderConfig};

/// Port the server listens on when none is configured.
pub const DEFAULT_PORT: u16 = 8787;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsConfig {
    /// Allow all origins.
    #[default]
    AllowAll,
    /// Allow only the listed origins.
    AllowOrigins(Vec<String>),
}

/// Configuration for the answer endpoint.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP server.
    pub port: u16,
    /// Upstream provider settings.
    pub provider: ProviderConfig,
    /// CORS configuration.
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Default port, model and CORS policy with the given credential.
    pub fn with_defaults(api_key: impl Into<String>) -> Self {
        Self {
            port: DEFAULT_PORT,
            provider: ProviderConfig::with_defaults(api_key),
            cors: CorsConfig::AllowAll,
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
        let mut config = Self::with_defaults(api_key);

        if let Some(port) = get("PORT") {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid PORT: {port}"))?;
        }
        config.provider = config
            .provider
            .with_model(get("VOICEBOT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_owned()))
            .with_base_url(
                get("VOICEBOT_PROVIDER_URL").unwrap_or_else(|| DEFAULT_PROVIDER_URL.to_owned()),
            );
        if let Some(origins) = get("VOICEBOT_ALLOWED_ORIGINS") {
            config = config.with_allowed_origins(parse_origins(&origins));
        }
        Ok(config)
    }

    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.provider = self.provider.with_model(model);
        self
    }

    /// Restrict CORS to `origins`; an empty list keeps allow-all.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = if origins.is_empty() {
            CorsConfig::AllowAll
        } else {
            CorsConfig::AllowOrigins(origins)
        };
        self
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Services shared by every request.
pub struct AxumContext {
    /// Backend that answers questions.
    pub answers: Arc<dyn AnswerSource>,
}

/// Build the context for `config`, failing if the provider is unusable.
pub fn bootstrap(config: &ServerConfig) -> Result<AxumContext> {
    let source = OpenAiAnswerSource::new(config.provider.clone())
        .context("failed to initialise answer provider")?;
    tracing::info!(
        model = %source.model(),
        base_url = %config.provider.base_url,
        "Answer provider ready"
    );
    Ok(bootstrap_with(Arc::new(source)))
}

/// Build a context around an existing answer source.
pub fn bootstrap_with(answers: Arc<dyn AnswerSource>) -> AxumContext {
    AxumContext { answers }
}

/// Bootstrap and serve until the process is stopped.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    use tokio::net::TcpListener;

    let ctx = bootstrap(&config)?;
    let app = crate::routes::create_router(ctx, &config.cors);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, cors = ?config.cors, "voicebot answer endpoint listening");

    axum::serve(listener, app).await?;
    Ok(())
}
