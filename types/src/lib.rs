//! Core domain types for Quill.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

mod action;
mod ids;
mod message;
mod settings;
mod text;

pub use action::{
    Action, ActionRecord, HeadingLevel, INSERT_HEADING, INSERT_TEXT, REPLACE_SELECTION,
};
pub use ids::MessageId;
pub use message::{ChatMessage, Role, WireMessage};
pub use settings::{
    ApiKey, ChatEndpoint, DEFAULT_API_BASE_URL, DEFAULT_MODEL, DEFAULT_MODELS,
    DEFAULT_SYSTEM_PROMPT, IncompleteSettings, ProbeTarget, Settings,
};
pub use text::{preview, truncate_with_ellipsis};

/// Characters of inserted text kept in an audit-log entry.
pub const ACTION_PREVIEW_CHARS: usize = 64;

// ============================================================================
// Action outcomes
// ============================================================================

/// Result of applying one action. `message` is the audit-log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: Action,
    pub succeeded: bool,
    pub message: String,
}

// ============================================================================
// Connection status
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Ok,
    Error,
}

impl ConnectionStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ConnectionStatus::Unknown => "Unknown",
            ConnectionStatus::Ok => "Connected",
            ConnectionStatus::Error => "Disconnected",
        }
    }
}

/// Outcome of a connection probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionReport {
    pub status: ConnectionStatus,
    pub message: Option<String>,
    /// Model ids from a successful models probe; `None` when the probe did not
    /// return a usable list.
    pub models: Option<Vec<String>>,
}

impl ConnectionReport {
    #[must_use]
    pub fn ok(models: Option<Vec<String>>) -> Self {
        Self {
            status: ConnectionStatus::Ok,
            message: None,
            models,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ConnectionStatus::Error,
            message: Some(message.into()),
            models: None,
        }
    }
}
