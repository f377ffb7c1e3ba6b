//! Chat-driven edits against a file-backed document

use quill_core::{ChatSession, Selection, TextFileDocument, TurnOutcome};
use quill_providers::ChatClient;
use serde_json::json;

use crate::common::{mount_chat_reply, settings_for, start_chat_mock};

#[tokio::test]
async fn reply_actions_are_written_to_file() {
    let server = start_chat_mock().await;
    mount_chat_reply(
        &server,
        "Added a section.",
        json!([
            { "type": "insertHeading", "payload": { "text": "Results", "level": "2" } },
            { "type": "insertText", "payload": { "text": 42 } }
        ]),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.md");
    std::fs::write(&path, "# Report\n").unwrap();

    let doc = TextFileDocument::open(&path).unwrap();
    let mut session = ChatSession::new(ChatClient::new(), &doc, settings_for(&server));

    let TurnOutcome::Replied(report) = session.send("add results").await.unwrap() else {
        panic!("expected a reply");
    };
    assert!(report.outcomes.iter().all(|o| o.succeeded));

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content, "# Report\n## Results\n42\n");
}

#[tokio::test]
async fn replace_selection_edits_selected_words() {
    let server = start_chat_mock().await;
    mount_chat_reply(
        &server,
        "Rewrote it.",
        json!([{ "type": "replaceSelection", "payload": { "text": "swift" } }]),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("story.txt");
    std::fs::write(&path, "The slow fox\nEnd\n").unwrap();

    let doc = TextFileDocument::open(&path).unwrap();
    doc.document().select(Selection::new(0, 4, 8));
    let mut session = ChatSession::new(ChatClient::new(), &doc, settings_for(&server));

    session.send("make it faster").await.unwrap();

    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "The swift fox\nEnd\n"
    );
    assert_eq!(doc.document().selection(), Some(Selection::caret(0, 9)));
}

#[tokio::test]
async fn read_only_document_logs_failures_without_touching_file() {
    let server = start_chat_mock().await;
    mount_chat_reply(
        &server,
        "ok",
        json!([{ "type": "insertText", "payload": { "text": "nope" } }]),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("locked.txt");
    std::fs::write(&path, "original\r\nsecond").unwrap();

    let doc = TextFileDocument::open(&path).unwrap();
    doc.document().set_read_only(true);
    let mut session = ChatSession::new(ChatClient::new(), &doc, settings_for(&server));

    session.send("edit").await.unwrap();

    let entry = &session.action_log()[0];
    assert!(entry.ends_with("Action failed (insertText): document is read-only"));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "original\r\nsecond"
    );
}
