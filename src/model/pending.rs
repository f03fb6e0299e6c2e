//! The pending-state record for a conversation awaiting its next message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Records that the next inbound message in a conversation should be handled
/// as the continuation of `active_command`. A conversation holds at most one
/// of these; setting a new one replaces the old.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PendingState {
    /// The command that asked for a follow-up message. Stored as the raw
    /// command token; the dispatcher re-resolves it on the next message.
    pub active_command: String,
    /// Free-form label the command stashed for itself (often the prompt
    /// context, may be empty).
    pub label: String,
    pub created_at: DateTime<Utc>,
}

impl PendingState {
    pub fn new(active_command: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            active_command: active_command.into(),
            label: label.into(),
            created_at: Utc::now(),
        }
    }
}
