//! `RemoteAnswerSource` against a real answer endpoint backed by the mock.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use voicebot_axum::bootstrap::{CorsConfig, bootstrap_with};
use voicebot_axum::routes::create_router;
use voicebot_cli::RemoteAnswerSource;
use voicebot_core::{
    AnswerRequest, AnswerSource, HistoryMessage, ProviderError, Role, collect_answer,
};
use voicebot_voice::{MockAnswerSource, MockLanguage, compose_answer};

/// Start an answer endpoint on an ephemeral port; returns its base URL.
async fn spawn_endpoint() -> String {
    let ctx = bootstrap_with(Arc::new(MockAnswerSource::with_delay(Duration::ZERO)));
    let app = create_router(ctx, &CorsConfig::AllowAll);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn answer_round_trips_through_the_endpoint() {
    let base = spawn_endpoint().await;
    let source = RemoteAnswerSource::new(&base).unwrap();

    let request = AnswerRequest::new(
        "hola",
        vec![HistoryMessage::new(Role::User, "antes")],
        "es-ES",
    );
    let answer = collect_answer(source.answer(request)).await.unwrap();

    assert_eq!(answer, compose_answer("hola", MockLanguage::Spanish, 0));
}

#[tokio::test]
async fn endpoint_rejection_surfaces_as_status() {
    let base = spawn_endpoint().await;
    let source = RemoteAnswerSource::new(&base).unwrap();

    let err = collect_answer(source.answer(AnswerRequest::new("   ", Vec::new(), "en-US")))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ProviderError::Status {
            status: 400,
            message: "Missing userText".into(),
        }
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let source = RemoteAnswerSource::new(&base).unwrap();
    let err = collect_answer(source.answer(AnswerRequest::new("hi", Vec::new(), "en-US")))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Transport(_)), "got {err:?}");
}
