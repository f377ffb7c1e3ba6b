//! Document adapter: the three mutations the assistant may perform.
//!
//! Every adapter call opens its own [`EditSession`], queues exactly one
//! mutation and commits before returning. Sessions are never held across
//! calls, so edits made by someone else between two calls are picked up by
//! the next one.

use std::path::PathBuf;

use quill_types::HeadingLevel;

pub const NORMAL_STYLE: &str = "Normal";

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document is read-only")]
    ReadOnly,
    #[error("unknown paragraph style: {0}")]
    UnknownStyle(String),
    #[error("selection no longer exists: paragraph {paragraph}, chars {start}..{end}")]
    StaleSelection {
        paragraph: usize,
        start: usize,
        end: usize,
    },
    #[error("paragraph reference {0} was not created in this session")]
    UnknownParagraph(usize),
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("document host unavailable: {0}")]
    Unavailable(String),
}

/// Handle to a paragraph appended earlier in the same session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParagraphRef(pub(crate) usize);

/// Host-side editing session. Calls queue work; [`EditSession::commit`]
/// applies it in order. A failure part-way leaves earlier work applied.
pub trait EditSession {
    /// Queue a paragraph at the end of the body. Each line of `text` becomes
    /// its own paragraph; the returned ref covers all of them.
    fn append_paragraph(&mut self, text: &str) -> ParagraphRef;

    /// Replace the user's selection, or insert at the caret when nothing is
    /// selected.
    fn replace_selection(&mut self, text: &str);

    fn set_style(&mut self, paragraph: ParagraphRef, style: &str);

    fn commit(self: Box<Self>) -> Result<(), DocumentError>;
}

/// A live document that can hand out editing sessions.
pub trait DocumentHost {
    fn open_session(&self) -> Result<Box<dyn EditSession + '_>, DocumentError>;
}

/// Mutation primitives over a [`DocumentHost`].
///
/// Failures are logged here and returned; nothing escapes as a panic.
#[derive(Clone, Copy)]
pub struct DocumentAdapter<'a> {
    host: &'a dyn DocumentHost,
}

impl<'a> DocumentAdapter<'a> {
    pub fn new(host: &'a dyn DocumentHost) -> Self {
        Self { host }
    }

    /// Append a new paragraph at the end of the body.
    pub fn append_text(&self, text: &str) -> Result<(), DocumentError> {
        self.run("append_text", |session| {
            session.append_paragraph(text);
        })
    }

    pub fn replace_selection(&self, text: &str) -> Result<(), DocumentError> {
        self.run("replace_selection", |session| {
            session.replace_selection(text);
        })
    }

    /// Append a paragraph and style it `Heading N`.
    pub fn append_heading(&self, text: &str, level: HeadingLevel) -> Result<(), DocumentError> {
        self.run("append_heading", |session| {
            let paragraph = session.append_paragraph(text);
            session.set_style(paragraph, level.style_name());
        })
    }

    fn run(
        &self,
        operation: &'static str,
        edit: impl FnOnce(&mut dyn EditSession),
    ) -> Result<(), DocumentError> {
        let result = self.host.open_session().and_then(|mut session| {
            edit(session.as_mut());
            session.commit()
        });
        if let Err(e) = &result {
            tracing::warn!(operation, "Document edit failed: {e}");
        }
        result
    }
}
