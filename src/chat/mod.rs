//! The conversational command layer: message types, the command registry and
//! the dispatcher that drives the per-conversation state machine.

mod commands;
mod dispatch;
mod registry;
pub(crate) mod replies;

use crate::api::{self, Mode};
use crate::error::Result;
use crate::identity::{DbIdentity, User};
use crate::ledger::Engine;
use crate::state::DbStateStore;
use crate::Config;
use serde::{Deserialize, Serialize};

pub use dispatch::Dispatcher;
pub use registry::{CommandName, Registry};

/// Wires a dispatcher from the configuration: the sheets backend for `mode`,
/// plus the SQLite-backed identity and pending-state stores.
pub async fn dispatcher(config: &Config, mode: Mode) -> Result<Dispatcher> {
    let sheets = api::sheets_api(config, mode).await?;
    let db = config.db().clone();
    Ok(Dispatcher::new(
        Engine::new(sheets),
        Box::new(DbStateStore::new(db.clone())),
        Box::new(DbIdentity::new(db)),
    ))
}

/// One message delivered by the chat transport.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Inbound {
    /// Opaque conversation id, one per chat.
    pub conversation_id: String,
    /// The platform's id for the sender, used as the identity key.
    pub sender_id: String,
    pub sender_name: String,
    pub text: String,
    /// True when the transport tagged the message as a command invocation
    /// (a structural marker on the leading token).
    pub is_command: bool,
}

impl Inbound {
    /// A command-marked message, e.g. `/log Coffee 5,50`.
    pub fn command(
        conversation_id: impl Into<String>,
        sender_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            sender_id: sender_id.into(),
            sender_name: String::new(),
            text: text.into(),
            is_command: true,
        }
    }

    /// A plain text message.
    pub fn text(
        conversation_id: impl Into<String>,
        sender_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            sender_id: sender_id.into(),
            sender_name: String::new(),
            text: text.into(),
            is_command: false,
        }
    }

    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = name.into();
        self
    }
}

/// What the bot sends back for one inbound message.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Reply {
    pub text: String,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Per-message context handed to command handlers. Identity is carried here
/// explicitly, never in shared or static state.
#[derive(Debug, Clone)]
pub struct Ctx {
    pub conversation_id: String,
    pub sender_id: String,
    pub sender_name: String,
    /// The registered user, when the sender is known.
    pub user: Option<User>,
}

impl Ctx {
    /// The signed-in user, or `Unauthorized`.
    pub fn user(&self) -> crate::error::Result<&User> {
        self.user.as_ref().ok_or(crate::error::Error::Unauthorized)
    }
}
