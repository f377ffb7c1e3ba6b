//! Ordered chat history with a single leading system message.

use std::time::SystemTime;

use quill_types::{ChatMessage, Role, WireMessage};

/// Message log for one session.
///
/// Invariant: `messages[0]` is the only system message; every other entry is
/// a user or assistant turn in the order it happened.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    next_seq: u64,
}

impl Conversation {
    #[must_use]
    pub fn new(system_prompt: &str) -> Self {
        let mut conversation = Self {
            messages: Vec::new(),
            next_seq: 0,
        };
        conversation.set_system_prompt(system_prompt);
        conversation
    }

    fn next_message(&mut self, role: Role, content: &str) -> ChatMessage {
        let seq = self.next_seq;
        self.next_seq += 1;
        ChatMessage::new(seq, role, content, SystemTime::now())
    }

    /// Drop the current system message and put a fresh one first.
    pub fn set_system_prompt(&mut self, prompt: &str) {
        self.messages.retain(|m| !m.is_system());
        let message = self.next_message(Role::System, prompt);
        self.messages.insert(0, message);
    }

    pub fn append_user(&mut self, content: &str) -> &ChatMessage {
        self.push(Role::User, content)
    }

    pub fn append_assistant(&mut self, content: &str) -> &ChatMessage {
        self.push(Role::Assistant, content)
    }

    fn push(&mut self, role: Role, content: &str) -> &ChatMessage {
        let message = self.next_message(role, content);
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        self.messages
            .first()
            .filter(|m| m.is_system())
            .map_or("", ChatMessage::content)
    }

    /// `{role, content}` pairs for the request body.
    #[must_use]
    pub fn payload(&self) -> Vec<WireMessage<'_>> {
        self.messages.iter().map(WireMessage::from).collect()
    }

    /// Forget every turn, keeping the system message.
    pub fn clear_turns(&mut self) {
        self.messages.retain(ChatMessage::is_system);
    }
}
