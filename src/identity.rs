//! User identity: who a chat sender is and which spreadsheet is theirs.
//!
//! Identity travels as an explicit value through the dispatch chain; nothing
//! here is ambient or static.

use crate::db::Db;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// A registered user.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: Uuid,
    /// The chat platform's sender id.
    pub external_id: String,
    pub display_name: String,
    /// The user's configured ledger spreadsheet; empty until configured.
    pub spreadsheet_id: String,
}

impl User {
    pub fn new(external_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            external_id: external_id.into(),
            display_name: display_name.into(),
            spreadsheet_id: String::new(),
        }
    }
}

/// Lookup and registration of users, keyed by the chat sender id.
#[async_trait::async_trait]
pub trait Identity: Send {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>>;

    /// Registers a new user. Callers check for an existing registration
    /// first; registering twice is an error at the store level.
    async fn create(&self, external_id: &str, display_name: &str) -> Result<User>;

    /// Points the user at a (validated) ledger spreadsheet.
    async fn update_configuration(&self, user_id: Uuid, spreadsheet_id: &str) -> Result<()>;
}

/// The SQLite-backed identity store used by the running bot.
pub struct DbIdentity {
    db: Db,
}

impl DbIdentity {
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl Identity for DbIdentity {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        self.db.find_user_by_external_id(external_id).await
    }

    async fn create(&self, external_id: &str, display_name: &str) -> Result<User> {
        let user = User::new(external_id, display_name);
        self.db.insert_user(&user).await?;
        Ok(user)
    }

    async fn update_configuration(&self, user_id: Uuid, spreadsheet_id: &str) -> Result<()> {
        self.db.update_user_spreadsheet(user_id, spreadsheet_id).await
    }
}

/// An in-memory identity store for tests.
#[derive(Default)]
pub struct MemoryIdentity {
    users: Mutex<HashMap<String, User>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Identity for MemoryIdentity {
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .expect("identity mutex poisoned")
            .get(external_id)
            .cloned())
    }

    async fn create(&self, external_id: &str, display_name: &str) -> Result<User> {
        let user = User::new(external_id, display_name);
        self.users
            .lock()
            .expect("identity mutex poisoned")
            .insert(external_id.to_string(), user.clone());
        Ok(user)
    }

    async fn update_configuration(&self, user_id: Uuid, spreadsheet_id: &str) -> Result<()> {
        let mut users = self.users.lock().expect("identity mutex poisoned");
        for user in users.values_mut() {
            if user.id == user_id {
                user.spreadsheet_id = spreadsheet_id.to_string();
                return Ok(());
            }
        }
        Err(anyhow::anyhow!("No user with id {user_id}").into())
    }
}
