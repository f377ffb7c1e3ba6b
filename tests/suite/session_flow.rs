//! End-to-end chat turns against a mock server

use quill_core::{ChatSession, MemoryDocument, Paragraph, SessionError, TurnOutcome};
use quill_providers::ChatClient;
use quill_types::{Action, ConnectionStatus, Role, Settings};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{mount_chat_reply, mount_chat_status, settings_for, start_chat_mock};

fn strip_time(entry: &str) -> &str {
    entry.split_once(": ").map_or(entry, |(_, rest)| rest)
}

#[tokio::test]
async fn mixed_batch_applies_in_order_and_isolates_failures() {
    let server = start_chat_mock().await;
    mount_chat_reply(
        &server,
        "Working on it.",
        json!([
            { "type": "insertText", "payload": { "text": "Hello" } },
            { "type": "replaceSelection", "payload": { "text": "never lands" } },
            { "type": "doSomethingElse", "payload": {} },
            {
                "type": "insertHeading",
                "payload": { "text": "Title", "level": 2 },
                "explain": "section"
            }
        ]),
    )
    .await;

    let doc = MemoryDocument::new();
    // Paragraph 4 does not exist, so the replace fails.
    doc.select(quill_core::Selection::new(4, 0, 0));
    let mut session = ChatSession::new(ChatClient::new(), &doc, settings_for(&server));

    let TurnOutcome::Replied(report) = session.send("draft intro").await.unwrap() else {
        panic!("expected a reply");
    };

    let succeeded: Vec<bool> = report.outcomes.iter().map(|o| o.succeeded).collect();
    assert_eq!(succeeded, vec![true, false, true, true]);
    assert_eq!(
        report.outcomes[2].action,
        Action::Unknown {
            kind: "doSomethingElse".to_string()
        }
    );

    let log: Vec<&str> = session.action_log().iter().map(|e| strip_time(e)).collect();
    assert_eq!(log.len(), 4);
    assert_eq!(log[0], "insertText: Hello");
    assert!(log[1].starts_with("Action failed (replaceSelection):"));
    assert_eq!(log[2], "Unknown action: doSomethingElse");
    assert_eq!(log[3], "insertHeading(level 2): Title");

    assert_eq!(
        doc.paragraphs(),
        vec![Paragraph::normal("Hello"), Paragraph::new("Title", "Heading 2")]
    );
}

#[tokio::test]
async fn follow_up_turn_sends_whole_history() {
    let server = start_chat_mock().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system", "content": "Be brief." },
                { "role": "user", "content": "first" },
                { "role": "assistant", "content": "reply" },
                { "role": "user", "content": "second" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "second reply" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_chat_reply(&server, "reply", json!(null)).await;

    let doc = MemoryDocument::new();
    let settings = Settings {
        system_prompt: Some("Be brief.".to_string()),
        ..settings_for(&server)
    };
    let mut session = ChatSession::new(ChatClient::new(), &doc, settings);

    session.send("first").await.unwrap();
    let TurnOutcome::Replied(report) = session.send("second").await.unwrap() else {
        panic!("expected a reply");
    };

    assert_eq!(report.assistant_text, "second reply");
    let roles: Vec<Role> = session
        .conversation()
        .messages()
        .iter()
        .map(quill_types::ChatMessage::role)
        .collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
}

#[tokio::test]
async fn failed_request_then_recovery_updates_connection() {
    let server = start_chat_mock().await;
    mount_chat_status(&server, 502, "bad gateway").await;

    let doc = MemoryDocument::new();
    let mut session = ChatSession::new(ChatClient::new(), &doc, settings_for(&server));

    let err = session.send("hello").await.unwrap_err();
    let SessionError::Transport(transport) = err;
    assert_eq!(transport.status().map(|s| s.as_u16()), Some(502));
    assert_eq!(session.connection().status, ConnectionStatus::Error);

    server.reset().await;
    mount_chat_reply(&server, "back", json!([])).await;

    session.send("again").await.unwrap();
    assert_eq!(session.connection().status, ConnectionStatus::Ok);
    assert!(session.connection().message.is_none());
    assert!(doc.paragraphs().is_empty());
}

#[tokio::test]
async fn prompt_change_mid_conversation_keeps_single_system_message() {
    let server = start_chat_mock().await;
    mount_chat_reply(&server, "ok", json!(null)).await;

    let doc = MemoryDocument::new();
    let mut session = ChatSession::new(ChatClient::new(), &doc, settings_for(&server));
    session.send("one").await.unwrap();

    let mut next = session.settings().clone();
    next.system_prompt = Some("New rules.".to_string());
    session.update_settings(next.clone());
    next.system_prompt = Some("Newer rules.".to_string());
    session.update_settings(next);

    let messages = session.conversation().messages();
    let systems: Vec<_> = messages.iter().filter(|m| m.is_system()).collect();
    assert_eq!(systems.len(), 1);
    assert_eq!(messages[0].content(), "Newer rules.");
    assert_eq!(messages.len(), 3);
}
