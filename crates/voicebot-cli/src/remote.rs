//! Client for a running voicebot answer endpoint.

use std::time::Duration;

use futures_util::{StreamExt, stream};
use reqwest::Client;
use serde::Deserialize;
use voicebot_core::{AnswerRequest, AnswerSource, FragmentStream, ProviderError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Deserialize)]
struct AnswerBody {
    answer: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// [`AnswerSource`] that forwards each question to `POST {base}/api/voicebot`
/// and yields the returned answer as one fragment.
#[derive(Debug, Clone)]
pub struct RemoteAnswerSource {
    client: Client,
    endpoint: String,
}

impl RemoteAnswerSource {
    /// Client for the server at `base_url` (e.g. `http://localhost:8787`).
    pub fn new(base_url: &str) -> Result<Self, ProviderError> {
        let base = base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(ProviderError::InvalidRequest("empty server URL".into()));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{base}/api/voicebot"),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl AnswerSource for RemoteAnswerSource {
    fn answer(&self, request: AnswerRequest) -> FragmentStream {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        stream::once(async move { fetch_answer(&client, &endpoint, &request).await }).boxed()
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}

async fn fetch_answer(
    client: &Client,
    endpoint: &str,
    request: &AnswerRequest,
) -> Result<String, ProviderError> {
    tracing::debug!(%endpoint, history = request.history.len(), "Forwarding question");

    let response = client
        .post(endpoint)
        .json(request)
        .send()
        .await
        .map_err(|e| ProviderError::Transport(e.to_string()))?;

    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ProviderError::Transport(e.to_string()))?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .map_or_else(|_| String::from_utf8_lossy(&bytes).into_owned(), |b| b.error);
        return Err(ProviderError::Status {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_slice::<AnswerBody>(&bytes)
        .map(|b| b.answer)
        .map_err(|e| ProviderError::Malformed(e.to_string()))
}
