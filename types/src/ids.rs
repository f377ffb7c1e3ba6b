use std::fmt;

use crate::Role;

/// Conversation-local message id, rendered as `<role prefix>-<seq>` (`u-3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct MessageId {
    role: Role,
    seq: u64,
}

impl MessageId {
    #[must_use]
    pub fn new(role: Role, seq: u64) -> Self {
        Self { role, seq }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.role.id_prefix(), self.seq)
    }
}
