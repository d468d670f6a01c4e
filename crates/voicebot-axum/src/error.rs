//! Axum-specific error types and mappings.
//!
//! Every failure leaves the server as `{"error": "...", "status": N}`.
//! Provider failures are logged in full but reach the client only as a
//! generic 502 message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use voicebot_core::ProviderError;

/// Message returned for any upstream provider failure.
pub const PROVIDER_FAILURE_MESSAGE: &str = "Server error calling the answer provider.";

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body over the size limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// The upstream answer provider failed.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            Self::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };
        (status, axum::Json(body)).into_response()
    }
}

impl From<ProviderError> for HttpError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidRequest(msg) => Self::BadRequest(msg),
            ProviderError::MissingCredential => {
                tracing::error!("Answer provider has no credential configured");
                Self::Internal(PROVIDER_FAILURE_MESSAGE.to_owned())
            }
            other => {
                tracing::error!(error = %other, "Answer provider call failed");
                Self::BadGateway(PROVIDER_FAILURE_MESSAGE.to_owned())
            }
        }
    }
}
