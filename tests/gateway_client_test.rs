//! GatewayClient against a local chat-completion stand-in

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use school_eval_core::{
    config::LlmConfig,
    error::EvalError,
    services::{ChatCompletion, ChatMessage, ChatRequest, GatewayClient},
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

async fn completions(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    recorded.auth.lock().unwrap().push(auth);
    recorded.bodies.lock().unwrap().push(body);
    Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": "안녕하세요" } }]
    }))
}

async fn rate_limited() -> (StatusCode, &'static str) {
    (StatusCode::TOO_MANY_REQUESTS, "slow down")
}

async fn no_choices() -> Json<Value> {
    Json(json!({ "choices": [] }))
}

/// Serve the stand-in gateway on an ephemeral port, returning its base URL
async fn spawn_gateway(recorded: Recorded) -> String {
    let app = Router::new()
        .route("/ok/chat/completions", post(completions))
        .route("/limited/chat/completions", post(rate_limited))
        .route("/empty/chat/completions", post(no_choices))
        .with_state(recorded);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: String) -> GatewayClient {
    GatewayClient::new(LlmConfig {
        base_url,
        model: "test/model".to_string(),
        api_key: SecretString::from("test-key".to_string()),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn request() -> ChatRequest {
    ChatRequest {
        messages: vec![ChatMessage::system("시스템"), ChatMessage::user("질문")],
        max_tokens: 100,
        temperature: 0.3,
    }
}

#[tokio::test]
async fn test_completion_round_trip() {
    let recorded = Recorded::default();
    let base = spawn_gateway(recorded.clone()).await;

    let reply = client(format!("{}/ok", base)).complete(request()).await.unwrap();
    assert_eq!(reply, "안녕하세요");

    assert_eq!(recorded.auth.lock().unwrap()[0], "Bearer test-key");
    let body = recorded.bodies.lock().unwrap()[0].clone();
    assert_eq!(body["model"], "test/model");
    assert_eq!(body["max_tokens"], 100);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "질문");
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let base = spawn_gateway(Recorded::default()).await;

    let err = client(format!("{}/limited", base))
        .complete(request())
        .await
        .unwrap_err();
    match err {
        EvalError::LlmApi(msg) => {
            assert!(msg.contains("429"));
            assert!(msg.contains("slow down"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_choice_yields_empty_reply() {
    let base = spawn_gateway(Recorded::default()).await;

    let reply = client(format!("{}/empty", base)).complete(request()).await.unwrap();
    assert_eq!(reply, "");
}
