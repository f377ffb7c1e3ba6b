//! Connection probes through the session

use quill_core::{ChatSession, MemoryDocument};
use quill_providers::ChatClient;
use quill_types::{ConnectionStatus, DEFAULT_MODELS, Settings};

use crate::common::{mount_health, mount_models, settings_for, start_chat_mock};

#[tokio::test]
async fn models_probe_replaces_model_list() {
    let server = start_chat_mock().await;
    mount_models(&server, 200, &["qwen-7b", "llama-3"]).await;

    let doc = MemoryDocument::new();
    let mut session = ChatSession::new(ChatClient::new(), &doc, settings_for(&server));

    let connection = session.check_connection().await.clone();
    assert_eq!(connection.status, ConnectionStatus::Ok);
    assert_eq!(connection.status.label(), "Connected");
    assert_eq!(
        session.available_models(),
        ["qwen-7b".to_string(), "llama-3".to_string()]
    );
}

#[tokio::test]
async fn missing_models_route_falls_back_to_health() {
    let server = start_chat_mock().await;
    mount_models(&server, 404, &[]).await;
    mount_health(&server, 200).await;

    let doc = MemoryDocument::new();
    let mut session = ChatSession::new(ChatClient::new(), &doc, settings_for(&server));

    assert_eq!(session.check_connection().await.status, ConnectionStatus::Ok);
    assert_eq!(session.available_models().len(), DEFAULT_MODELS.len());
}

#[tokio::test]
async fn failing_health_reports_models_status() {
    let server = start_chat_mock().await;
    mount_models(&server, 401, &[]).await;
    mount_health(&server, 503).await;

    let doc = MemoryDocument::new();
    let mut session = ChatSession::new(ChatClient::new(), &doc, settings_for(&server));

    let connection = session.check_connection().await.clone();
    assert_eq!(connection.status, ConnectionStatus::Error);
    assert_eq!(connection.status.label(), "Disconnected");
    assert_eq!(connection.message.as_deref(), Some("HTTP 401"));
}

#[tokio::test]
async fn explicit_models_url_is_probed() {
    let server = start_chat_mock().await;
    mount_models(&server, 200, &["custom"]).await;

    let doc = MemoryDocument::new();
    let settings = Settings {
        api_base_url: "http://127.0.0.1:9".to_string(),
        models_url: Some(format!("{}/v1/models", server.uri())),
        ..Settings::default()
    };
    let mut session = ChatSession::new(ChatClient::new(), &doc, settings);

    assert_eq!(session.check_connection().await.status, ConnectionStatus::Ok);
    assert_eq!(session.available_models(), ["custom".to_string()]);
}
