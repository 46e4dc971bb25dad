//! Test utilities for integration tests
#![allow(dead_code)]

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use tempfile::TempDir;
use tower::util::ServiceExt;

use gemchat::api::AppState;
use gemchat::api::app;
use gemchat::core::AppConfig;

pub const SYSTEM_MESSAGE: &str = "You are a test assistant.";
pub const WELCOME_MESSAGE: &str = "Welcome to the test chat!";
pub const MODEL: &str = "gemini-2.0-flash";

pub struct TestApp {
    pub router: Router,
    // Holds the widget directory open for the lifetime of the test
    pub web_ui: TempDir,
}

/// Creates a test application whose completions go to `api_base_url`,
/// usually a `mockito` server.
pub fn test_app(api_base_url: &str) -> TestApp {
    let web_ui = tempfile::tempdir().expect("Failed to create web ui directory");
    fs::write(
        web_ui.path().join("index.html"),
        "<!doctype html><title>gemchat</title>",
    )
    .expect("Failed to write index.html");

    let config = AppConfig {
        api_base_url: api_base_url.to_string(),
        api_key: String::from("test-api-key"),
        model: String::from(MODEL),
        system_message: String::from(SYSTEM_MESSAGE),
        welcome_message: String::from(WELCOME_MESSAGE),
        web_ui_path: web_ui.path().display().to_string(),
        session_idle_timeout: Duration::from_secs(3600),
    };
    let app_state = AppState::from_config(config);

    TestApp {
        router: app(Arc::new(app_state)),
        web_ui,
    }
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf-8")
}

/// One streamed chunk in the format of an OpenAI compatible API
pub fn completion_chunk(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "created": 1700000000,
        "model": MODEL,
        "choices": [{"index": 0, "delta": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

/// A full SSE response body for the given fragments
pub fn completion_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        body.push_str(&format!("data: {}\n\n", completion_chunk(fragment)));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

/// Splits an SSE body into `(event, data)` pairs, skipping comments.
/// The data of each event is a JSON string and is returned decoded.
pub fn sse_events(body: &str) -> Vec<(String, String)> {
    body.split("\n\n")
        .filter_map(|raw| {
            let mut event = None;
            let mut data = Vec::new();
            for line in raw.lines() {
                if let Some(name) = line.strip_prefix("event:") {
                    event = Some(name.trim().to_string());
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
                }
            }
            let event = event?;
            let data = data.join("\n");
            let data = serde_json::from_str::<String>(&data)
                .unwrap_or_else(|_| panic!("Event data is not a JSON string: {:?}", data));
            Some((event, data))
        })
        .collect()
}

pub async fn create_session(router: &Router) -> String {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/chat/sessions")
                .method("POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_to_string(response.into_body()).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    json["session_id"].as_str().unwrap().to_string()
}

/// Sends a chat message and returns the status and the SSE events
pub async fn send_message(
    router: &Router,
    session_id: &str,
    message: &str,
) -> (StatusCode, Vec<(String, String)>) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/chat")
                .method("POST")
                .header("content-type", "application/json")
                .body(Body::from(
                    serde_json::json!({
                        "session_id": session_id,
                        "message": message
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = body_to_string(response.into_body()).await;
    (status, sse_events(&body))
}

pub async fn get_transcript(router: &Router, session_id: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/chat/{}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = body_to_string(response.into_body()).await;
    let json = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}
