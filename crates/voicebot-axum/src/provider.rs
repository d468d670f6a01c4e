//! OpenAI Responses API answer source.
//!
//! One best-effort, non-streaming call per question. The whole answer is
//! delivered as a single fragment; the request is only sent once the
//! returned stream is first polled.

use std::fmt;
use std::time::Duration;

use futures_util::{StreamExt, stream};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use voicebot_core::{
    AnswerRequest, AnswerSource, FragmentStream, ProviderError, system_prompt_for_locale,
};

/// Default provider base URL.
pub const DEFAULT_PROVIDER_URL: &str = "https://api.openai.com/v1";

/// Default model id.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Answer used when the provider returns no text at all.
pub const NO_TEXT_PLACEHOLDER: &str = "No text returned (unexpected).";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for the provider.
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl ProviderConfig {
    /// Default endpoint and model with the given credential.
    pub fn with_defaults(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_PROVIDER_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn responses_url(&self) -> String {
        format!("{}/responses", self.base_url.trim_end_matches('/'))
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: Vec<InputMessage>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
struct InputMessage {
    role: &'static str,
    content: String,
}

/// `[system prompt, ...history, user question]`.
fn build_input(request: &AnswerRequest) -> Vec<InputMessage> {
    let mut input = Vec::with_capacity(request.history.len() + 2);
    input.push(InputMessage {
        role: "system",
        content: system_prompt_for_locale(&request.locale),
    });
    input.extend(request.history.iter().map(|m| InputMessage {
        role: m.role.as_str(),
        content: m.content.clone(),
    }));
    input.push(InputMessage {
        role: "user",
        content: request.user_text.clone(),
    });
    input
}

/// Pull the answer text out of a Responses API body.
///
/// Prefers the `output_text` convenience field, then concatenates every
/// `output_text` content part. Returns `None` when neither has text.
fn extract_output_text(body: &Value) -> Option<String> {
    if let Some(text) = body.get("output_text").and_then(Value::as_str) {
        if !text.trim().is_empty() {
            return Some(text.to_owned());
        }
    }

    let text: String = body
        .get("output")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|part| part.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    (!text.trim().is_empty()).then_some(text)
}

// ── Answer source ──────────────────────────────────────────────────

/// [`AnswerSource`] backed by the OpenAI Responses API.
#[derive(Debug, Clone)]
pub struct OpenAiAnswerSource {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiAnswerSource {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::MissingCredential);
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

impl AnswerSource for OpenAiAnswerSource {
    fn answer(&self, request: AnswerRequest) -> FragmentStream {
        let client = self.client.clone();
        let config = self.config.clone();
        stream::once(async move { request_answer(&client, &config, &request).await }).boxed()
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

async fn request_answer(
    client: &Client,
    config: &ProviderConfig,
    request: &AnswerRequest,
) -> Result<String, ProviderError> {
    let body = ResponsesRequest {
        model: &config.model,
        input: build_input(request),
    };

    tracing::debug!(
        model = %config.model,
        locale = %request.locale,
        history = request.history.len(),
        "Requesting answer from provider"
    );

    let response = client
        .post(config.responses_url())
        .bearer_auth(&config.api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| ProviderError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let json: Value = response
        .json()
        .await
        .map_err(|e| ProviderError::Malformed(e.to_string()))?;

    Ok(extract_output_text(&json).unwrap_or_else(|| {
        tracing::warn!(model = %config.model, "Provider returned no output text");
        NO_TEXT_PLACEHOLDER.to_owned()
    }))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use voicebot_core::{HistoryMessage, Role};

    use super::*;

    #[test]
    fn input_wraps_history_between_prompt_and_question() {
        let request = AnswerRequest::new(
            "and then?",
            vec![
                HistoryMessage::new(Role::User, "hi"),
                HistoryMessage::new(Role::Assistant, "hello"),
            ],
            "es-ES",
        );
        let input = build_input(&request);

        assert_eq!(input.len(), 4);
        assert_eq!(input[0].role, "system");
        assert!(input[0].content.contains("locale hint: es-ES"));
        assert_eq!(input[1].role, "user");
        assert_eq!(input[2].role, "assistant");
        assert_eq!(
            input[3],
            InputMessage {
                role: "user",
                content: "and then?".into()
            }
        );
    }

    #[test]
    fn output_text_field_wins() {
        let body = json!({ "output_text": "short", "output": [] });
        assert_eq!(extract_output_text(&body).as_deref(), Some("short"));
    }

    #[test]
    fn output_parts_are_concatenated() {
        let body = json!({
            "output": [
                { "type": "reasoning", "content": [] },
                { "type": "message", "content": [
                    { "type": "output_text", "text": "Hello " },
                    { "type": "refusal", "refusal": "no" },
                    { "type": "output_text", "text": "there" }
                ]}
            ]
        });
        assert_eq!(extract_output_text(&body).as_deref(), Some("Hello there"));
    }

    #[test]
    fn empty_body_has_no_text() {
        assert_eq!(extract_output_text(&json!({})), None);
        assert_eq!(extract_output_text(&json!({ "output_text": "  " })), None);
    }

    #[test]
    fn blank_key_is_rejected() {
        let err = OpenAiAnswerSource::new(ProviderConfig::with_defaults(" ")).unwrap_err();
        assert_eq!(err, ProviderError::MissingCredential);
    }

    #[test]
    fn debug_redacts_key() {
        let config = ProviderConfig::with_defaults("sk-secret");
        assert!(!format!("{config:?}").contains("sk-secret"));
    }

    #[test]
    fn url_tolerates_trailing_slash() {
        let config = ProviderConfig::with_defaults("k").with_base_url("http://localhost:9/v1/");
        assert_eq!(config.responses_url(), "http://localhost:9/v1/responses");
    }
}
