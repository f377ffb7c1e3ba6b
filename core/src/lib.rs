//! Document editing and chat orchestration for Quill.
//!
//! # Layout
//!
//! - [`document`] - [`DocumentHost`]/[`EditSession`] traits and the
//!   [`DocumentAdapter`] mutation primitives
//! - [`memory_document`], [`text_file`] - shipped hosts
//! - [`interpreter`] - applies a batch of model actions with per-action
//!   failure isolation
//! - [`conversation`] - message history with exactly one system message
//! - [`session`] - one chat turn end to end

pub mod conversation;
pub mod document;
pub mod interpreter;
pub mod memory_document;
pub mod session;
pub mod text_file;

pub use conversation::Conversation;
pub use document::{DocumentAdapter, DocumentError, DocumentHost, EditSession, ParagraphRef};
pub use interpreter::apply_actions;
pub use memory_document::{MemoryDocument, Paragraph, Selection};
pub use session::{ChatSession, Connection, SessionError, TurnOutcome, TurnReport};
pub use text_file::TextFileDocument;
