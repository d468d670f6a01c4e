//! The answer endpoint.
//!
//! The body is parsed leniently: `history` entries may carry any role
//! (anything but `"assistant"` is a user message) and missing or
//! non-string content, so that a sloppy client still gets an answer.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use voicebot_core::{AnswerRequest, DEFAULT_LOCALE, HistoryMessage, Role, collect_answer};

use crate::error::HttpError;
use crate::state::AppState;

const MISSING_USER_TEXT: &str = "Missing userText";

/// Request body for `POST /api/voicebot`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicebotRequest {
    #[serde(default)]
    pub user_text: Option<Value>,
    #[serde(default)]
    pub history: Option<Vec<WireMessage>>,
    #[serde(default)]
    pub locale: Option<String>,
}

/// A history entry as clients send it.
#[derive(Debug, Default, Deserialize)]
pub struct WireMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
}

impl WireMessage {
    fn into_history(self) -> HistoryMessage {
        let role = Role::from_wire(self.role.as_deref().unwrap_or_default());
        let content = match self.content {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
        };
        HistoryMessage::new(role, content)
    }
}

impl VoicebotRequest {
    /// Validate and normalise into an [`AnswerRequest`].
    pub fn into_answer_request(self) -> Result<AnswerRequest, HttpError> {
        let user_text = match self.user_text {
            Some(Value::String(text)) if !text.trim().is_empty() => text,
            _ => return Err(HttpError::BadRequest(MISSING_USER_TEXT.to_owned())),
        };
        let history = self
            .history
            .unwrap_or_default()
            .into_iter()
            .map(WireMessage::into_history)
            .collect();
        let locale = self
            .locale
            .map(|l| l.trim().to_owned())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCALE.to_owned());

        Ok(AnswerRequest::new(user_text, history, locale))
    }
}

/// Response body for `POST /api/voicebot`.
#[derive(Debug, Serialize, Deserialize)]
pub struct VoicebotResponse {
    pub answer: String,
}

/// Answer one question.
pub async fn answer(
    State(state): State<AppState>,
    body: Result<Json<VoicebotRequest>, JsonRejection>,
) -> Result<Json<VoicebotResponse>, HttpError> {
    let request = match body {
        Ok(Json(body)) => body,
        // A body sent without a JSON content type is treated as empty.
        Err(JsonRejection::MissingJsonContentType(_)) => VoicebotRequest::default(),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(HttpError::PayloadTooLarge(rejection.body_text()));
        }
        Err(rejection) => return Err(HttpError::BadRequest(rejection.body_text())),
    };
    let request = request.into_answer_request()?;

    tracing::info!(
        source = state.answers.name(),
        locale = %request.locale,
        history = request.history.len(),
        chars = request.user_text.len(),
        "Answer requested"
    );

    let answer = collect_answer(state.answers.answer(request)).await?;
    Ok(Json(VoicebotResponse { answer }))
}
