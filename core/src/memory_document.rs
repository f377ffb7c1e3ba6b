//! In-process document host.

use std::ops::Range;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::document::{DocumentError, DocumentHost, EditSession, NORMAL_STYLE, ParagraphRef};

pub const DEFAULT_STYLES: [&str; 4] = [NORMAL_STYLE, "Heading 1", "Heading 2", "Heading 3"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    pub style: String,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: style.into(),
        }
    }

    pub fn normal(text: impl Into<String>) -> Self {
        Self::new(text, NORMAL_STYLE)
    }
}

/// Character range inside one paragraph. `start == end` is a caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub paragraph: usize,
    pub start: usize,
    pub end: usize,
}

impl Selection {
    #[must_use]
    pub const fn new(paragraph: usize, start: usize, end: usize) -> Self {
        Self {
            paragraph,
            start,
            end,
        }
    }

    #[must_use]
    pub const fn caret(paragraph: usize, offset: usize) -> Self {
        Self::new(paragraph, offset, offset)
    }
}

#[derive(Debug)]
struct DocumentState {
    paragraphs: Vec<Paragraph>,
    selection: Option<Selection>,
    styles: Vec<String>,
    read_only: bool,
}

/// Paragraph list behind a mutex, so one document can be shared between the
/// session driving edits and whoever moves the selection.
#[derive(Debug)]
pub struct MemoryDocument {
    state: Mutex<DocumentState>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::with_paragraphs([])
    }

    pub fn with_paragraphs(paragraphs: impl IntoIterator<Item = Paragraph>) -> Self {
        Self {
            state: Mutex::new(DocumentState {
                paragraphs: paragraphs.into_iter().collect(),
                selection: None,
                styles: DEFAULT_STYLES.iter().map(ToString::to_string).collect(),
                read_only: false,
            }),
        }
    }

    /// Replace the style catalogue.
    #[must_use]
    pub fn with_styles<S: Into<String>>(self, styles: impl IntoIterator<Item = S>) -> Self {
        self.state().styles = styles.into_iter().map(Into::into).collect();
        self
    }

    fn state(&self) -> MutexGuard<'_, DocumentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn paragraphs(&self) -> Vec<Paragraph> {
        self.state().paragraphs.clone()
    }

    #[must_use]
    pub fn paragraph_count(&self) -> usize {
        self.state().paragraphs.len()
    }

    /// Move the user selection. It is validated only when an edit uses it.
    pub fn select(&self, selection: Selection) {
        self.state().selection = Some(selection);
    }

    pub fn clear_selection(&self) {
        self.state().selection = None;
    }

    #[must_use]
    pub fn selection(&self) -> Option<Selection> {
        self.state().selection
    }

    pub fn set_read_only(&self, read_only: bool) {
        self.state().read_only = read_only;
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.state().read_only
    }

    pub(crate) fn session(&self) -> MemorySession<'_> {
        MemorySession {
            document: self,
            pending: Vec::new(),
            appended: 0,
        }
    }
}

impl DocumentHost for MemoryDocument {
    fn open_session(&self) -> Result<Box<dyn EditSession + '_>, DocumentError> {
        Ok(Box::new(self.session()))
    }
}

#[derive(Debug)]
enum PendingEdit {
    Append(String),
    ReplaceSelection(String),
    SetStyle {
        paragraph: ParagraphRef,
        style: String,
    },
}

pub(crate) struct MemorySession<'a> {
    document: &'a MemoryDocument,
    pending: Vec<PendingEdit>,
    appended: usize,
}

/// What committing a session did. `changed` is set once any edit landed, even
/// when a later edit in the same session failed.
pub(crate) struct Commit {
    pub(crate) changed: bool,
    pub(crate) result: Result<(), DocumentError>,
}

impl MemorySession<'_> {
    pub(crate) fn apply(self) -> Commit {
        if self.pending.is_empty() {
            return Commit {
                changed: false,
                result: Ok(()),
            };
        }
        self.document.state().apply(self.pending)
    }
}

impl EditSession for MemorySession<'_> {
    fn append_paragraph(&mut self, text: &str) -> ParagraphRef {
        self.pending.push(PendingEdit::Append(text.to_string()));
        let paragraph = ParagraphRef(self.appended);
        self.appended += 1;
        paragraph
    }

    fn replace_selection(&mut self, text: &str) {
        self.pending
            .push(PendingEdit::ReplaceSelection(text.to_string()));
    }

    fn set_style(&mut self, paragraph: ParagraphRef, style: &str) {
        self.pending.push(PendingEdit::SetStyle {
            paragraph,
            style: style.to_string(),
        });
    }

    fn commit(self: Box<Self>) -> Result<(), DocumentError> {
        self.apply().result
    }
}

impl DocumentState {
    fn apply(&mut self, edits: Vec<PendingEdit>) -> Commit {
        if self.read_only {
            return Commit {
                changed: false,
                result: Err(DocumentError::ReadOnly),
            };
        }

        let mut appended = Vec::new();
        let mut changed = false;
        for edit in edits {
            if let Err(e) = self.apply_edit(edit, &mut appended) {
                return Commit {
                    changed,
                    result: Err(e),
                };
            }
            changed = true;
        }
        Commit {
            changed,
            result: Ok(()),
        }
    }

    fn apply_edit(
        &mut self,
        edit: PendingEdit,
        appended: &mut Vec<Range<usize>>,
    ) -> Result<(), DocumentError> {
        match edit {
            PendingEdit::Append(text) => {
                let start = self.paragraphs.len();
                self.paragraphs.extend(split_lines(&text).map(Paragraph::normal));
                appended.push(start..self.paragraphs.len());
            }
            PendingEdit::ReplaceSelection(text) => self.replace_selection(&text)?,
            PendingEdit::SetStyle { paragraph, style } => {
                let range = appended
                    .get(paragraph.0)
                    .cloned()
                    .ok_or(DocumentError::UnknownParagraph(paragraph.0))?;
                if !self.styles.contains(&style) {
                    return Err(DocumentError::UnknownStyle(style));
                }
                for target in &mut self.paragraphs[range] {
                    target.style.clone_from(&style);
                }
            }
        }
        Ok(())
    }

    fn replace_selection(&mut self, text: &str) -> Result<(), DocumentError> {
        let selection = match self.selection {
            Some(selection) => selection,
            None => {
                if self.paragraphs.is_empty() {
                    self.paragraphs.push(Paragraph::normal(""));
                }
                let last = self.paragraphs.len() - 1;
                Selection::caret(last, self.paragraphs[last].text.chars().count())
            }
        };

        let stale = DocumentError::StaleSelection {
            paragraph: selection.paragraph,
            start: selection.start,
            end: selection.end,
        };
        let Some(paragraph) = self.paragraphs.get_mut(selection.paragraph) else {
            return Err(stale);
        };
        if selection.start > selection.end || selection.end > paragraph.text.chars().count() {
            return Err(stale);
        }

        let start = byte_offset(&paragraph.text, selection.start);
        let end = byte_offset(&paragraph.text, selection.end);
        let tail = paragraph.text.split_off(end);
        paragraph.text.truncate(start);

        // Line breaks in the replacement start new paragraphs in the same style.
        let mut lines = split_lines(text);
        paragraph.text.push_str(lines.next().unwrap_or_default());
        let style = paragraph.style.clone();
        let inserted: Vec<Paragraph> = lines.map(|line| Paragraph::new(line, &style)).collect();

        let last = selection.paragraph + inserted.len();
        let after = selection.paragraph + 1;
        let following = self.paragraphs.split_off(after);
        self.paragraphs.extend(inserted);
        self.paragraphs.extend(following);
        let last_paragraph = &mut self.paragraphs[last];
        let caret = last_paragraph.text.chars().count();
        last_paragraph.text.push_str(&tail);

        if self.selection.is_some() {
            self.selection = Some(Selection::caret(last, caret));
        }
        Ok(())
    }
}

/// One paragraph per line; `\r\n` counts as a single break.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}
