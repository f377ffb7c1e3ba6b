//! Applies model-requested actions to the document, one at a time.

use quill_types::{ACTION_PREVIEW_CHARS, Action, ActionOutcome, ActionRecord, preview};

use crate::document::{DocumentAdapter, DocumentError};

/// Apply `actions` in order, emitting exactly one `log` entry per action.
///
/// A failing action is recorded and the batch moves on; unknown action kinds
/// are logged without touching the document.
pub fn apply_actions(
    adapter: &DocumentAdapter<'_>,
    actions: &[ActionRecord],
    mut log: impl FnMut(&str),
) -> Vec<ActionOutcome> {
    let mut outcomes = Vec::with_capacity(actions.len());

    for record in actions {
        if let Some(explain) = record.explain() {
            tracing::debug!(kind = record.action().kind(), explain, "Action rationale");
        }

        let (succeeded, message) = match apply_one(adapter, record.action()) {
            Ok(message) => (true, message),
            Err(e) => (false, format!("Action failed ({}): {e}", record.action().kind())),
        };

        log(&message);
        outcomes.push(ActionOutcome {
            action: record.action().clone(),
            succeeded,
            message,
        });
    }

    outcomes
}

fn apply_one(adapter: &DocumentAdapter<'_>, action: &Action) -> Result<String, DocumentError> {
    match action {
        Action::InsertText { text } => {
            adapter.append_text(text)?;
            Ok(format!("insertText: {}", preview(text, ACTION_PREVIEW_CHARS)))
        }
        Action::ReplaceSelection { text } => {
            adapter.replace_selection(text)?;
            Ok(format!(
                "replaceSelection: {}",
                preview(text, ACTION_PREVIEW_CHARS)
            ))
        }
        Action::InsertHeading { text, level } => {
            adapter.append_heading(text, *level)?;
            Ok(format!(
                "insertHeading(level {level}): {}",
                preview(text, ACTION_PREVIEW_CHARS)
            ))
        }
        Action::Unknown { kind } => Ok(format!("Unknown action: {kind}")),
    }
}

#[cfg(test)]
mod tests {
    use quill_types::{Action, ActionRecord, HeadingLevel};
    use serde_json::json;

    use super::apply_actions;
    use crate::document::DocumentAdapter;
    use crate::memory_document::{MemoryDocument, Paragraph, Selection};

    fn run(doc: &MemoryDocument, actions: &[ActionRecord]) -> (Vec<String>, Vec<bool>) {
        let mut log = Vec::new();
        let outcomes = apply_actions(&DocumentAdapter::new(doc), actions, |entry| {
            log.push(entry.to_string());
        });
        (log, outcomes.iter().map(|o| o.succeeded).collect())
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let doc = MemoryDocument::new();
        let (log, outcomes) = run(&doc, &[]);
        assert!(log.is_empty());
        assert!(outcomes.is_empty());
    }

    #[test]
    fn text_then_heading_in_order() {
        let doc = MemoryDocument::new();
        let actions = ActionRecord::parse_batch(&json!([
            { "type": "insertText", "payload": { "text": "Hello" } },
            { "type": "insertHeading", "payload": { "text": "Title", "level": 2 } }
        ]))
        .unwrap();

        let (log, outcomes) = run(&doc, &actions);

        assert_eq!(
            doc.paragraphs(),
            vec![Paragraph::normal("Hello"), Paragraph::new("Title", "Heading 2")]
        );
        assert_eq!(log, vec!["insertText: Hello", "insertHeading(level 2): Title"]);
        assert_eq!(outcomes, vec![true, true]);
    }

    #[test]
    fn unknown_action_logs_and_does_not_mutate() {
        let doc = MemoryDocument::with_paragraphs([Paragraph::normal("untouched")]);
        let actions = ActionRecord::parse_batch(&json!([
            { "type": "doSomethingElse", "payload": { "text": "x" } }
        ]))
        .unwrap();

        let (log, outcomes) = run(&doc, &actions);

        assert_eq!(log, vec!["Unknown action: doSomethingElse"]);
        assert_eq!(outcomes, vec![true]);
        assert_eq!(doc.paragraphs(), vec![Paragraph::normal("untouched")]);
    }

    #[test]
    fn failing_action_does_not_stop_the_batch() {
        let doc = MemoryDocument::with_paragraphs([Paragraph::normal("abc")]);
        doc.select(Selection::new(7, 0, 1));
        let actions = vec![
            ActionRecord::new(Action::InsertText {
                text: "one".to_string(),
            }),
            ActionRecord::new(Action::ReplaceSelection {
                text: "two".to_string(),
            }),
            ActionRecord::new(Action::InsertHeading {
                text: "three".to_string(),
                level: HeadingLevel::new(1),
            }),
            ActionRecord::new(Action::InsertText {
                text: "four".to_string(),
            }),
        ];

        let (log, outcomes) = run(&doc, &actions);

        assert_eq!(log.len(), 4);
        assert_eq!(outcomes, vec![true, false, true, true]);
        assert!(log[1].starts_with("Action failed (replaceSelection): selection no longer exists"));
        assert_eq!(log[2], "insertHeading(level 1): three");
        assert_eq!(log[3], "insertText: four");
        assert_eq!(
            doc.paragraphs()
                .iter()
                .map(|p| p.text.as_str())
                .collect::<Vec<_>>(),
            vec!["abc", "one", "three", "four"]
        );
    }

    #[test]
    fn read_only_document_fails_every_mutation() {
        let doc = MemoryDocument::new();
        doc.set_read_only(true);
        let actions = ActionRecord::parse_batch(&json!([
            { "type": "insertText", "payload": { "text": "a" } },
            { "type": "mystery" },
            { "type": "insertHeading", "payload": { "text": "b" } }
        ]))
        .unwrap();

        let (log, outcomes) = run(&doc, &actions);

        assert_eq!(
            log,
            vec![
                "Action failed (insertText): document is read-only",
                "Unknown action: mystery",
                "Action failed (insertHeading): document is read-only",
            ]
        );
        assert_eq!(outcomes, vec![false, true, false]);
    }

    #[test]
    fn log_preview_is_limited_to_64_chars() {
        let doc = MemoryDocument::new();
        let long = "x".repeat(100);
        let actions = vec![ActionRecord::new(Action::InsertText { text: long.clone() })];

        let (log, _) = run(&doc, &actions);

        assert_eq!(log[0], format!("insertText: {}", "x".repeat(64)));
        assert_eq!(doc.paragraphs()[0].text, long);
    }

    #[test]
    fn heading_log_shows_clamped_level() {
        let doc = MemoryDocument::new();
        let actions = ActionRecord::parse_batch(&json!([
            { "type": "insertHeading", "payload": { "text": "Deep", "level": 7 } }
        ]))
        .unwrap();

        let (log, _) = run(&doc, &actions);
        assert_eq!(log, vec!["insertHeading(level 3): Deep"]);
        assert_eq!(doc.paragraphs()[0].style, "Heading 3");
    }
}
