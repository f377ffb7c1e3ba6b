//! One chat session: settings, history, action log and connection state.

use chrono::Local;
use quill_providers::{ChatClient, TransportError};
use quill_types::{ActionOutcome, ConnectionReport, ConnectionStatus, DEFAULT_MODELS, Settings};

use crate::conversation::Conversation;
use crate::document::{DocumentAdapter, DocumentHost};
use crate::interpreter::apply_actions;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("chat request failed: {0}")]
    Transport(#[from] TransportError),
}

/// What happened to one line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Blank input; nothing was sent.
    Ignored,
    /// Endpoint or key missing; nothing was sent.
    NeedsConfiguration(String),
    Replied(TurnReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    pub assistant_text: String,
    pub outcomes: Vec<ActionOutcome>,
    /// The reply carried actions but edits are disabled.
    pub edits_skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connection {
    pub status: ConnectionStatus,
    pub message: Option<String>,
}

pub struct ChatSession<'d> {
    client: ChatClient,
    document: &'d dyn DocumentHost,
    settings: Settings,
    conversation: Conversation,
    action_log: Vec<String>,
    connection: Connection,
    available_models: Vec<String>,
}

impl<'d> ChatSession<'d> {
    pub fn new(client: ChatClient, document: &'d dyn DocumentHost, settings: Settings) -> Self {
        let conversation = Conversation::new(settings.system_prompt());
        Self {
            client,
            document,
            settings,
            conversation,
            action_log: Vec::new(),
            connection: Connection::default(),
            available_models: DEFAULT_MODELS.iter().map(ToString::to_string).collect(),
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    #[must_use]
    pub fn action_log(&self) -> &[String] {
        &self.action_log
    }

    pub fn clear_action_log(&mut self) {
        self.action_log.clear();
    }

    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    #[must_use]
    pub fn available_models(&self) -> &[String] {
        &self.available_models
    }

    pub fn clear_conversation(&mut self) {
        self.conversation.clear_turns();
    }

    /// Swap in new settings. Returns `true` when the endpoint, models URL or
    /// key changed, i.e. when the connection status is worth re-checking.
    pub fn update_settings(&mut self, settings: Settings) -> bool {
        if settings.system_prompt() != self.settings.system_prompt() {
            self.conversation.set_system_prompt(settings.system_prompt());
        }
        let endpoint_changed = settings.api_base_url != self.settings.api_base_url
            || settings.models_url != self.settings.models_url
            || settings.api_key != self.settings.api_key;
        self.settings = settings;
        endpoint_changed
    }

    /// Probe the configured server and record the result.
    pub async fn check_connection(&mut self) -> &Connection {
        let Some(target) = self.settings.probe_target() else {
            self.connection = Connection::default();
            return &self.connection;
        };

        let ConnectionReport {
            status,
            message,
            models,
        } = self.client.check_connection(&target).await;

        if let Some(models) = models {
            tracing::info!(count = models.len(), "Model list refreshed");
            self.available_models = models;
        }
        self.connection = Connection { status, message };
        &self.connection
    }

    /// Send one user turn and apply whatever edits the reply asks for.
    ///
    /// The user message stays in the history even when the request fails.
    pub async fn send(&mut self, input: &str) -> Result<TurnOutcome, SessionError> {
        if input.trim().is_empty() {
            return Ok(TurnOutcome::Ignored);
        }

        let endpoint = match self.settings.chat_endpoint() {
            Ok(endpoint) => endpoint,
            Err(e) => {
                return Ok(TurnOutcome::NeedsConfiguration(format!(
                    "{e}. Set the API base URL and API key in settings first."
                )));
            }
        };

        self.conversation.append_user(input);

        let reply = match self
            .client
            .send_chat(&endpoint, &self.conversation.payload())
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Chat turn failed: {e}");
                self.connection = Connection {
                    status: ConnectionStatus::Error,
                    message: Some(e.to_string()),
                };
                return Err(e.into());
            }
        };

        self.conversation.append_assistant(&reply.assistant_text);

        let actions = reply.actions.unwrap_or_default();
        let (outcomes, edits_skipped) = if self.settings.allow_edit() {
            let adapter = DocumentAdapter::new(self.document);
            let log = &mut self.action_log;
            let outcomes = apply_actions(&adapter, &actions, |entry| {
                log.push(format!("{}: {entry}", Local::now().format("%H:%M:%S")));
            });
            (outcomes, 0)
        } else {
            if !actions.is_empty() {
                tracing::info!(count = actions.len(), "Edits disabled, skipping actions");
            }
            (Vec::new(), actions.len())
        };

        self.connection = Connection {
            status: ConnectionStatus::Ok,
            message: None,
        };

        Ok(TurnOutcome::Replied(TurnReport {
            assistant_text: reply.assistant_text,
            outcomes,
            edits_skipped,
        }))
    }
}
