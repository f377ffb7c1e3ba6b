//! Document host backed by a plain-text file.
//!
//! Each line is a paragraph. Lines starting with `# `, `## ` or `### ` are
//! `Heading 1..3`; a normal paragraph that would read as a heading is written
//! with a leading `\`. The whole file is rewritten atomically after every
//! commit that changed something.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use quill_types::HeadingLevel;
use quill_utils::atomic_write;

use crate::document::{DocumentError, DocumentHost, EditSession, ParagraphRef};
use crate::memory_document::{Commit, MemoryDocument, MemorySession, Paragraph};

#[derive(Debug)]
pub struct TextFileDocument {
    path: PathBuf,
    document: MemoryDocument,
}

impl TextFileDocument {
    /// Load `path`, or start empty when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let path = path.into();
        let paragraphs = match fs::read_to_string(&path) {
            Ok(content) => parse_paragraphs(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(DocumentError::Io { path, source }),
        };
        tracing::debug!(
            path = %path.display(),
            paragraphs = paragraphs.len(),
            "Opened text document"
        );
        Ok(Self {
            path,
            document: MemoryDocument::with_paragraphs(paragraphs),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The in-memory view; selection and read-only state live here.
    #[must_use]
    pub fn document(&self) -> &MemoryDocument {
        &self.document
    }

    fn flush(&self) -> Result<(), DocumentError> {
        let rendered = render_paragraphs(&self.document.paragraphs());
        atomic_write(&self.path, rendered.as_bytes()).map_err(|source| DocumentError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl DocumentHost for TextFileDocument {
    fn open_session(&self) -> Result<Box<dyn EditSession + '_>, DocumentError> {
        Ok(Box::new(TextFileSession {
            inner: self.document.session(),
            file: self,
        }))
    }
}

struct TextFileSession<'a> {
    inner: MemorySession<'a>,
    file: &'a TextFileDocument,
}

impl EditSession for TextFileSession<'_> {
    fn append_paragraph(&mut self, text: &str) -> ParagraphRef {
        self.inner.append_paragraph(text)
    }

    fn replace_selection(&mut self, text: &str) {
        self.inner.replace_selection(text);
    }

    fn set_style(&mut self, paragraph: ParagraphRef, style: &str) {
        self.inner.set_style(paragraph, style);
    }

    fn commit(self: Box<Self>) -> Result<(), DocumentError> {
        let TextFileSession { inner, file } = *self;
        let Commit { changed, result } = inner.apply();
        // Edits applied before a failure stay, so they are written too.
        let flushed = if changed { file.flush() } else { Ok(()) };
        result?;
        flushed
    }
}

fn heading_prefix(level: HeadingLevel) -> &'static str {
    match level.get() {
        1 => "# ",
        2 => "## ",
        _ => "### ",
    }
}

const HEADING_LEVELS: [HeadingLevel; 3] = [
    HeadingLevel::new(3),
    HeadingLevel::new(2),
    HeadingLevel::new(1),
];

const ESCAPE: char = '\\';

fn heading_of(line: &str) -> Option<(HeadingLevel, &str)> {
    HEADING_LEVELS.iter().find_map(|level| {
        line.strip_prefix(heading_prefix(*level))
            .map(|text| (*level, text))
    })
}

/// `\#...` and `\\...` carry one escape character in front of the text.
fn is_escaped(line: &str) -> bool {
    line.strip_prefix(ESCAPE)
        .is_some_and(|rest| rest.starts_with(['#', ESCAPE]))
}

#[must_use]
pub fn parse_paragraphs(content: &str) -> Vec<Paragraph> {
    content
        .lines()
        .map(|line| {
            if is_escaped(line) {
                return Paragraph::normal(&line[ESCAPE.len_utf8()..]);
            }
            match heading_of(line) {
                Some((level, text)) => Paragraph::new(text, level.style_name()),
                None => Paragraph::normal(line),
            }
        })
        .collect()
}

#[must_use]
pub fn render_paragraphs(paragraphs: &[Paragraph]) -> String {
    let mut out = String::new();
    for paragraph in paragraphs {
        let heading = HEADING_LEVELS
            .iter()
            .find(|level| level.style_name() == paragraph.style);
        match heading {
            Some(level) => out.push_str(heading_prefix(*level)),
            None if heading_of(&paragraph.text).is_some() || is_escaped(&paragraph.text) => {
                out.push(ESCAPE);
            }
            None => {}
        }
        out.push_str(&paragraph.text);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use quill_types::HeadingLevel;

    use super::{TextFileDocument, parse_paragraphs, render_paragraphs};
    use crate::document::{DocumentAdapter, DocumentError};
    use crate::memory_document::{Paragraph, Selection};

    #[test]
    fn parses_heading_prefixes() {
        let paragraphs = parse_paragraphs("# Top\nbody\n### Deep\n#### not a heading\n#tight");
        assert_eq!(
            paragraphs,
            vec![
                Paragraph::new("Top", "Heading 1"),
                Paragraph::normal("body"),
                Paragraph::new("Deep", "Heading 3"),
                Paragraph::normal("#### not a heading"),
                Paragraph::normal("#tight"),
            ]
        );
    }

    #[test]
    fn normal_text_that_looks_like_a_heading_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");

        let doc = TextFileDocument::open(&path).unwrap();
        let adapter = DocumentAdapter::new(&doc);
        adapter.append_text("# not a heading").unwrap();
        adapter.append_text("a\nb").unwrap();
        adapter.append_text("\\# already escaped").unwrap();
        adapter.append_text("\\plain backslash").unwrap();
        adapter.append_heading("# real", HeadingLevel::new(1)).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "\\# not a heading\na\nb\n\\\\# already escaped\n\\plain backslash\n# # real\n"
        );

        let reopened = TextFileDocument::open(&path).unwrap();
        assert_eq!(reopened.document().paragraphs(), doc.document().paragraphs());
        assert_eq!(
            reopened.document().paragraphs(),
            vec![
                Paragraph::normal("# not a heading"),
                Paragraph::normal("a"),
                Paragraph::normal("b"),
                Paragraph::normal("\\# already escaped"),
                Paragraph::normal("\\plain backslash"),
                Paragraph::new("# real", "Heading 1"),
            ]
        );
    }

    #[test]
    fn read_only_file_is_left_byte_for_byte() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.txt");
        std::fs::write(&path, "line one\r\nline two").unwrap();

        let doc = TextFileDocument::open(&path).unwrap();
        doc.document().set_read_only(true);
        let err = DocumentAdapter::new(&doc).append_text("x").unwrap_err();

        assert!(matches!(err, DocumentError::ReadOnly));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "line one\r\nline two"
        );
    }

    #[test]
    fn failed_first_edit_does_not_rewrite_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "kept as is").unwrap();

        let doc = TextFileDocument::open(&path).unwrap();
        doc.document().select(Selection::new(7, 0, 0));
        assert!(DocumentAdapter::new(&doc).replace_selection("x").is_err());

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "kept as is");
    }

    #[test]
    fn renders_headings_with_prefixes() {
        let rendered = render_paragraphs(&[
            Paragraph::new("Title", "Heading 2"),
            Paragraph::normal("Hello"),
        ]);
        assert_eq!(rendered, "## Title\nHello\n");
    }

    #[test]
    fn edits_are_flushed_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draft.md");
        std::fs::write(&path, "# Draft\nfirst line\n").unwrap();

        let doc = TextFileDocument::open(&path).unwrap();
        let adapter = DocumentAdapter::new(&doc);
        adapter.append_text("Hello").unwrap();
        adapter
            .append_heading("Summary", HeadingLevel::new(2))
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "# Draft\nfirst line\nHello\n## Summary\n");
    }

    #[test]
    fn missing_file_starts_empty_and_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.md");

        let doc = TextFileDocument::open(&path).unwrap();
        assert_eq!(doc.document().paragraph_count(), 0);

        DocumentAdapter::new(&doc).replace_selection("typed").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "typed\n");
    }

    #[test]
    fn selection_replacement_rewrites_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "The quick fox\n").unwrap();

        let doc = TextFileDocument::open(&path).unwrap();
        doc.document().select(Selection::new(0, 4, 9));
        DocumentAdapter::new(&doc).replace_selection("slow").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "The slow fox\n");
    }

    #[test]
    fn failed_edit_still_flushes_earlier_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");

        let doc = TextFileDocument::open(&path).unwrap();
        doc.document().select(Selection::new(5, 0, 0));
        let adapter = DocumentAdapter::new(&doc);
        adapter.append_text("kept").unwrap();
        let err = adapter.replace_selection("x").unwrap_err();

        assert!(matches!(err, DocumentError::StaleSelection { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "kept\n");
    }
}
