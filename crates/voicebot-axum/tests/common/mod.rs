//! Shared fixtures for voicebot-axum route tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use futures_util::{StreamExt, stream};
use http_body_util::BodyExt;
use voicebot_axum::bootstrap::{CorsConfig, bootstrap_with};
use voicebot_axum::routes::create_router;
use voicebot_core::{AnswerRequest, AnswerSource, FragmentStream, ProviderError};

/// CORS origin used by the allow-list tests.
pub const TEST_CORS_ORIGIN: &str = "http://localhost:5173";

/// Answer source that replays a fixed script and records what it was asked.
pub struct StubAnswers {
    fragments: Vec<&'static str>,
    failure: Option<ProviderError>,
    pub seen: Mutex<Vec<AnswerRequest>>,
}

impl StubAnswers {
    pub fn answering(fragments: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            fragments: fragments.to_vec(),
            failure: None,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            fragments: vec!["partial "],
            failure: Some(error),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<AnswerRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl AnswerSource for StubAnswers {
    fn answer(&self, request: AnswerRequest) -> FragmentStream {
        self.seen.lock().unwrap().push(request);
        let mut items: Vec<Result<String, ProviderError>> =
            self.fragments.iter().map(|f| Ok((*f).to_owned())).collect();
        if let Some(err) = self.failure.clone() {
            items.push(Err(err));
        }
        stream::iter(items).boxed()
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

pub fn router(answers: Arc<StubAnswers>, cors: &CorsConfig) -> Router {
    create_router(bootstrap_with(answers), cors)
}

pub fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Assert the response body is valid JSON and return the parsed value.
pub async fn parse_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap_or_else(|e| panic!("Expected valid JSON body: {e}"))
}

/// Assert a response has `application/json` content-type.
pub fn assert_json_content_type(response: &axum::response::Response) {
    let ct = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map_or("", |v| v.to_str().unwrap_or(""));
    assert!(
        ct.starts_with("application/json"),
        "Expected application/json content-type, got: {ct}"
    );
}
