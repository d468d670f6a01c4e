//! `OpenAiAnswerSource` against a local fake of the Responses API.
//!
//! The fake is a tiny axum app bound to an ephemeral port; it records the
//! request it receives and answers with a canned body.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use axum::{Json, Router};
use futures_util::StreamExt;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use voicebot_axum::provider::{NO_TEXT_PLACEHOLDER, OpenAiAnswerSource, ProviderConfig};
use voicebot_core::{
    AnswerRequest, AnswerSource, HistoryMessage, ProviderError, Role, collect_answer,
};

#[derive(Clone)]
struct Fake {
    status: StatusCode,
    reply: Value,
    seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn responses(
    State(fake): State<Fake>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    fake.seen.lock().unwrap().push((auth, body));
    (fake.status, Json(fake.reply.clone()))
}

/// Serve the fake and return a provider config pointing at it.
async fn serve(fake: Fake) -> ProviderConfig {
    let app = Router::new()
        .route("/v1/responses", post(responses))
        .with_state(fake);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    ProviderConfig::with_defaults("sk-test")
        .with_base_url(format!("http://{addr}/v1"))
        .with_model("gpt-test")
}

fn fake(status: StatusCode, reply: Value) -> Fake {
    Fake {
        status,
        reply,
        seen: Arc::default(),
    }
}

#[tokio::test]
async fn sends_prompt_history_and_question() {
    let fake = fake(StatusCode::OK, json!({ "output_text": "Paso 1..." }));
    let seen = Arc::clone(&fake.seen);
    let source = OpenAiAnswerSource::new(serve(fake).await).unwrap();

    let request = AnswerRequest::new(
        "¿Cómo?",
        vec![HistoryMessage::new(Role::Assistant, "Hola")],
        "es-MX",
    );
    let answer = collect_answer(source.answer(request)).await.unwrap();
    assert_eq!(answer, "Paso 1...");

    let seen = seen.lock().unwrap();
    let (auth, body) = &seen[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "gpt-test");
    let input = body["input"].as_array().unwrap();
    assert_eq!(input.len(), 3);
    assert_eq!(input[0]["role"], "system");
    assert!(input[0]["content"].as_str().unwrap().contains("Language hint: es"));
    assert_eq!(input[1], json!({ "role": "assistant", "content": "Hola" }));
    assert_eq!(input[2], json!({ "role": "user", "content": "¿Cómo?" }));
}

#[tokio::test]
async fn whole_answer_is_one_fragment() {
    let fake = fake(
        StatusCode::OK,
        json!({ "output": [{ "type": "message", "content": [
            { "type": "output_text", "text": "one " },
            { "type": "output_text", "text": "two" }
        ]}]}),
    );
    let source = OpenAiAnswerSource::new(serve(fake).await).unwrap();

    let fragments: Vec<_> = source
        .answer(AnswerRequest::new("q", Vec::new(), "en-US"))
        .collect()
        .await;
    assert_eq!(fragments, vec![Ok("one two".to_owned())]);
}

#[tokio::test]
async fn missing_text_becomes_placeholder() {
    let fake = fake(StatusCode::OK, json!({ "output": [] }));
    let source = OpenAiAnswerSource::new(serve(fake).await).unwrap();

    let answer = collect_answer(source.answer(AnswerRequest::new("q", Vec::new(), "en-US")))
        .await
        .unwrap();
    assert_eq!(answer, NO_TEXT_PLACEHOLDER);
}

#[tokio::test]
async fn error_status_is_reported() {
    let fake = fake(
        StatusCode::UNAUTHORIZED,
        json!({ "error": { "message": "bad key" } }),
    );
    let source = OpenAiAnswerSource::new(serve(fake).await).unwrap();

    let err = collect_answer(source.answer(AnswerRequest::new("q", Vec::new(), "en-US")))
        .await
        .unwrap_err();
    match err {
        ProviderError::Status { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("bad key"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn nothing_is_sent_until_polled() {
    let fake = fake(StatusCode::OK, json!({ "output_text": "x" }));
    let seen = Arc::clone(&fake.seen);
    let source = OpenAiAnswerSource::new(serve(fake).await).unwrap();

    let stream = source.answer(AnswerRequest::new("q", Vec::new(), "en-US"));
    drop(stream);
    tokio::task::yield_now().await;

    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_provider_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ProviderConfig::with_defaults("sk").with_base_url(format!("http://{addr}/v1"));
    let source = OpenAiAnswerSource::new(config).unwrap();

    let err = collect_answer(source.answer(AnswerRequest::new("q", Vec::new(), "en-US")))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Transport(_)), "got {err:?}");
}
