//! Clients against a local fake completion endpoint

use casegen_llm::{CompletionClient, CompletionRequest, GeminiClient, LlmError, OpenAiClient};
use serde_json::{json, Value};
use std::collections::HashMap;
use warp::Filter;

macro_rules! spawn_server {
    ($filter:expr) => {{
        let (addr, server) = warp::serve($filter).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }};
}

#[tokio::test]
async fn openai_roundtrip() {
    let route = warp::post()
        .and(warp::path!("v1" / "chat" / "completions"))
        .and(warp::header::<String>("authorization"))
        .and(warp::body::json())
        .map(|auth: String, body: Value| {
            assert_eq!(auth, "Bearer test-key");
            let prompt = body["messages"][0]["content"].as_str().unwrap_or_default().to_string();
            warp::reply::json(&json!({
                "choices": [{"message": {"role": "assistant", "content": format!("echo: {prompt}")}}]
            }))
        });
    let addr = spawn_server!(route);

    let client = OpenAiClient::new("test-key").with_base_url(format!("http://{addr}/v1"));
    let text = client
        .complete(CompletionRequest::new("hello", 0.0))
        .await
        .unwrap();
    assert_eq!(text, "echo: hello");
}

#[tokio::test]
async fn openai_error_status_propagates() {
    let route = warp::post().map(|| {
        warp::reply::with_status("quota exceeded", warp::http::StatusCode::TOO_MANY_REQUESTS)
    });
    let addr = spawn_server!(route);

    let client = OpenAiClient::new("k").with_base_url(format!("http://{addr}"));
    let err = client
        .complete(CompletionRequest::new("x", 0.7))
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Status { status: 429, ref body } if body == "quota exceeded"));
}

#[tokio::test]
async fn gemini_roundtrip_with_key_query() {
    let route = warp::post()
        .and(warp::path!("models" / String))
        .and(warp::query::<HashMap<String, String>>())
        .map(|model: String, query: HashMap<String, String>| {
            assert_eq!(model, "gemini-test:generateContent");
            assert_eq!(query.get("key").map(String::as_str), Some("g-key"));
            warp::reply::json(&json!({
                "candidates": [{"content": {"parts": [{"text": "No"}]}}]
            }))
        });
    let addr = spawn_server!(route);

    let client = GeminiClient::new("g-key")
        .with_base_url(format!("http://{addr}"))
        .with_model("gemini-test");
    let text = client
        .complete(CompletionRequest::new("relevant?", 0.0))
        .await
        .unwrap();
    assert_eq!(text, "No");
}
