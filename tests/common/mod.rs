//! Shared test utilities and fixtures
//!
//! Mock OpenAI-compatible server helpers for integration tests.

#![allow(dead_code)]

use quill_types::Settings;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub async fn start_chat_mock() -> MockServer {
    MockServer::start().await
}

/// Settings pointing at `server` with a test key.
pub fn settings_for(server: &MockServer) -> Settings {
    Settings {
        api_base_url: server.uri(),
        api_key: "sk-integration".to_string(),
        ..Settings::default()
    }
}

/// Mount a chat completion reply carrying `actions` in the message.
pub async fn mount_chat_reply(server: &MockServer, content: &str, actions: Value) {
    let body = json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content,
                "mcp_actions": actions
            },
            "finish_reason": "stop"
        }]
    });

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_chat_status(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

pub async fn mount_models(server: &MockServer, status: u16, ids: &[&str]) {
    let data: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "data": data })))
        .mount(server)
        .await;
}

pub async fn mount_health(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
