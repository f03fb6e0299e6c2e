//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::{TestSheet, TEST_SPREADSHEET_ID};
use crate::chat::{Dispatcher, Inbound, Reply};
use crate::identity::MemoryIdentity;
use crate::ledger::{Engine, CATEGORY_SHEET, LEDGER_SHEET, RULE_SHEET};
use crate::model::PendingState;
use crate::state::{MemoryStateStore, StateStore};
use std::sync::Arc;

/// The conversation id every TestEnv message uses.
pub(crate) const CONVERSATION: &str = "conv";

/// A whole bot wired over the in-memory backend and stores. Registration and
/// configuration are driven through the dispatcher itself, the same way a
/// real conversation would get there.
pub(crate) struct TestEnv {
    dispatcher: Dispatcher,
    store: Arc<MemoryStateStore>,
}

impl TestEnv {
    /// A bot over the seeded ledger, with no registered users.
    pub(crate) async fn new() -> Self {
        Self::with_sheet(TestSheet::seeded(TEST_SPREADSHEET_ID)).await
    }

    /// A bot whose user "user" has signed up but not connected a spreadsheet.
    pub(crate) async fn registered() -> Self {
        let mut env = Self::new().await;
        env.send_command("user", "/start").await;
        env
    }

    /// A bot whose user "user" is signed up and connected to the seeded
    /// ledger.
    pub(crate) async fn configured() -> Self {
        let mut env = Self::registered().await;
        let reply = env
            .send_command("user", &format!("/spreadsheet {TEST_SPREADSHEET_ID}"))
            .await;
        assert!(
            reply.text.contains("connected"),
            "configuration failed: {}",
            reply.text
        );
        env
    }

    /// Like `configured`, but the ledger sheet holds no entries.
    pub(crate) async fn configured_empty() -> Self {
        let header = |cells: &[&str]| -> Vec<String> {
            cells.iter().map(|c| c.to_string()).collect()
        };
        let sheet = TestSheet::new(
            TEST_SPREADSHEET_ID,
            vec![
                (
                    LEDGER_SHEET.to_string(),
                    vec![header(&["", "Description", "Category"])],
                ),
                (CATEGORY_SHEET.to_string(), vec![header(&["Category"])]),
                (
                    RULE_SHEET.to_string(),
                    vec![header(&["Category", "Pattern"])],
                ),
            ],
        );
        let mut env = Self::with_sheet(sheet).await;
        env.send_command("user", "/start").await;
        let reply = env
            .send_command("user", &format!("/spreadsheet {TEST_SPREADSHEET_ID}"))
            .await;
        assert!(
            reply.text.contains("connected"),
            "configuration failed: {}",
            reply.text
        );
        env
    }

    async fn with_sheet(sheet: TestSheet) -> Self {
        let store = Arc::new(MemoryStateStore::new());
        let dispatcher = Dispatcher::new(
            Engine::new(Box::new(sheet)),
            Box::new(Arc::clone(&store)),
            Box::new(MemoryIdentity::new()),
        );
        Self { dispatcher, store }
    }

    /// Delivers a command-marked message from `sender`.
    pub(crate) async fn send_command(&mut self, sender: &str, text: &str) -> Reply {
        let msg = Inbound::command(CONVERSATION, sender, text).with_sender_name("Test User");
        self.dispatcher.dispatch(&msg).await
    }

    /// Delivers a plain text message from `sender`.
    pub(crate) async fn send_text(&mut self, sender: &str, text: &str) -> Reply {
        let msg = Inbound::text(CONVERSATION, sender, text).with_sender_name("Test User");
        self.dispatcher.dispatch(&msg).await
    }

    /// The conversation's pending state, straight from the store.
    pub(crate) async fn pending(&self, conversation_id: &str) -> Option<PendingState> {
        self.store.get(conversation_id).await.unwrap()
    }
}
