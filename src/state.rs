//! Per-conversation pending state.
//!
//! The compute layer is stateless between messages, so "this conversation is
//! waiting for the details of a /log" has to live in a durable store. A
//! conversation holds at most one pending state: setting a new one replaces
//! the old, there is no stacking.

use crate::db::Db;
use crate::error::Result;
use crate::model::PendingState;
use std::collections::HashMap;
use std::sync::Mutex;

/// Get/set/clear of the single pending-state record per conversation.
///
/// No expiry is enforced here; a stale record stays valid until it is
/// consumed or cleared. `created_at` is stored so a sweep could be added.
#[async_trait::async_trait]
pub trait StateStore: Send {
    async fn get(&self, conversation_id: &str) -> Result<Option<PendingState>>;

    /// Upsert. Returns the stored record.
    async fn set(
        &self,
        conversation_id: &str,
        active_command: &str,
        label: &str,
    ) -> Result<PendingState>;

    /// Removes and returns the pending state, or `None` when nothing was
    /// pending.
    async fn clear(&self, conversation_id: &str) -> Result<Option<PendingState>>;
}

/// The SQLite-backed store used by the running bot.
pub struct DbStateStore {
    db: Db,
}

impl DbStateStore {
    pub(crate) fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl StateStore for DbStateStore {
    async fn get(&self, conversation_id: &str) -> Result<Option<PendingState>> {
        self.db.get_pending(conversation_id).await
    }

    async fn set(
        &self,
        conversation_id: &str,
        active_command: &str,
        label: &str,
    ) -> Result<PendingState> {
        let state = PendingState::new(active_command, label);
        self.db.put_pending(conversation_id, &state).await?;
        Ok(state)
    }

    async fn clear(&self, conversation_id: &str) -> Result<Option<PendingState>> {
        self.db.delete_pending(conversation_id).await
    }
}

/// Delegation so a shared handle can be both held by the dispatcher and
/// inspected from the outside (tests do this).
#[async_trait::async_trait]
impl<T> StateStore for std::sync::Arc<T>
where
    T: StateStore + Send + Sync,
{
    async fn get(&self, conversation_id: &str) -> Result<Option<PendingState>> {
        self.as_ref().get(conversation_id).await
    }

    async fn set(
        &self,
        conversation_id: &str,
        active_command: &str,
        label: &str,
    ) -> Result<PendingState> {
        self.as_ref().set(conversation_id, active_command, label).await
    }

    async fn clear(&self, conversation_id: &str) -> Result<Option<PendingState>> {
        self.as_ref().clear(conversation_id).await
    }
}

/// An in-memory store for tests.
#[derive(Default)]
pub struct MemoryStateStore {
    states: Mutex<HashMap<String, PendingState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, conversation_id: &str) -> Result<Option<PendingState>> {
        Ok(self
            .states
            .lock()
            .expect("state store mutex poisoned")
            .get(conversation_id)
            .cloned())
    }

    async fn set(
        &self,
        conversation_id: &str,
        active_command: &str,
        label: &str,
    ) -> Result<PendingState> {
        let state = PendingState::new(active_command, label);
        self.states
            .lock()
            .expect("state store mutex poisoned")
            .insert(conversation_id.to_string(), state.clone());
        Ok(state)
    }

    async fn clear(&self, conversation_id: &str) -> Result<Option<PendingState>> {
        Ok(self
            .states
            .lock()
            .expect("state store mutex poisoned")
            .remove(conversation_id))
    }
}
