//! Routes one inbound message to the right command, in the right mode.
//!
//! Per conversation this is a two-state machine: idle, or awaiting the
//! arguments of a previously prompted command. The dispatcher never replies
//! with raw error text; every failure is mapped to a localized reply and the
//! conversation always gets an answer.

use crate::chat::commands::{self, Invocation, Services};
use crate::chat::registry::{CommandName, Registry};
use crate::chat::{replies, Ctx, Inbound, Reply};
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::ledger::Engine;
use crate::state::StateStore;
use tracing::{debug, error};

pub struct Dispatcher {
    engine: Engine,
    store: Box<dyn StateStore>,
    identity: Box<dyn Identity>,
}

impl Dispatcher {
    pub fn new(engine: Engine, store: Box<dyn StateStore>, identity: Box<dyn Identity>) -> Self {
        Self {
            engine,
            store,
            identity,
        }
    }

    /// Handles one message and always produces a reply. Unexpected failures
    /// are logged with the conversation id; the user sees a generic message.
    pub async fn dispatch(&mut self, msg: &Inbound) -> Reply {
        match self.dispatch_inner(msg).await {
            Ok(reply) => reply,
            Err(e) => {
                if let Error::Unexpected(ref inner) = e {
                    error!(
                        conversation = %msg.conversation_id,
                        "unexpected failure: {inner:#}"
                    );
                } else {
                    debug!(conversation = %msg.conversation_id, "rejected: {e}");
                }
                Reply::new(replies::for_error(&e))
            }
        }
    }

    async fn dispatch_inner(&mut self, msg: &Inbound) -> Result<Reply> {
        // 1. A command-marked message: extract and resolve the leading token.
        //    Aliases resolve to their primary command with the argument text
        //    preserved as-is.
        if msg.is_command {
            let (token, rest) = split_first_token(&msg.text);
            let token = Registry::normalize_token(token);
            return match Registry::resolve(&token) {
                Some(name) => self.invoke(name, rest, msg, Invocation::Direct).await,
                None => {
                    debug!(conversation = %msg.conversation_id, "unknown command '{token}'");
                    let fallback = self
                        .invoke(Registry::fallback(), "", msg, Invocation::Direct)
                        .await?;
                    Ok(Reply::new(format!(
                        "{}\n\n{}",
                        replies::unknown_command(),
                        fallback.text
                    )))
                }
            };
        }

        // 2. Plain text starting with an allow-listed bare command name.
        let (first, rest) = split_first_token(&msg.text);
        if let Some(name) = Registry::resolve_bare(&first.to_lowercase()) {
            return self.invoke(name, rest, msg, Invocation::Direct).await;
        }

        // 3. A pending multi-step interaction: this message continues it.
        if let Some(pending) = self.store.get(&msg.conversation_id).await? {
            let token = Registry::normalize_token(&pending.active_command);
            if let Some(name) = Registry::resolve(&token) {
                return self
                    .invoke(name, &msg.text, msg, Invocation::Continuation(pending))
                    .await;
            }
            // A pending command this build no longer knows. Drop it and fall
            // through to the default interpretation.
            debug!(conversation = %msg.conversation_id, "dropping stale pending '{token}'");
            self.store.clear(&msg.conversation_id).await?;
        }

        // 4. Default: unstructured text is an expense to log.
        self.invoke(Registry::implicit(), &msg.text, msg, Invocation::Direct)
            .await
    }

    async fn invoke(
        &mut self,
        name: CommandName,
        args: &str,
        msg: &Inbound,
        invocation: Invocation,
    ) -> Result<Reply> {
        let user = self.identity.find_by_external_id(&msg.sender_id).await?;
        if user.is_none() && name.requires_user() {
            return Err(Error::Unauthorized);
        }
        debug!(conversation = %msg.conversation_id, "running {name}");
        let ctx = Ctx {
            conversation_id: msg.conversation_id.clone(),
            sender_id: msg.sender_id.clone(),
            sender_name: msg.sender_name.clone(),
            user,
        };
        let mut services = Services {
            engine: &mut self.engine,
            store: self.store.as_ref(),
            identity: self.identity.as_ref(),
        };
        commands::run(&mut services, name, &ctx, args, invocation).await
    }
}

/// Splits off the first whitespace-delimited token; the remainder keeps its
/// internal spacing.
fn split_first_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim_start()),
        None => (text, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[test]
    fn test_split_first_token() {
        assert_eq!(split_first_token("/log Coffee 5,50"), ("/log", "Coffee 5,50"));
        assert_eq!(split_first_token("/undo"), ("/undo", ""));
        assert_eq!(split_first_token("  gasto  5,50 "), ("gasto", "5,50 "));
    }

    #[tokio::test]
    async fn test_unauthenticated_commands_get_the_sign_up_prompt() {
        let mut env = TestEnv::new().await;
        for text in ["/log Coffee 5,50", "/undo", "/help"] {
            let reply = env.send_command("stranger", text).await;
            assert_eq!(reply.text, replies::sign_up_prompt(), "for {text}");
        }
    }

    #[tokio::test]
    async fn test_start_works_without_registration() {
        let mut env = TestEnv::new().await;
        let reply = env.send_command("stranger", "/start").await;
        assert!(reply.text.contains("signed up"));
    }

    #[tokio::test]
    async fn test_unknown_command_falls_back_to_help() {
        let mut env = TestEnv::registered().await;
        let reply = env.send_command("user", "/frobnicate now").await;
        assert!(reply.text.contains(&replies::unknown_command()));
        assert!(reply.text.contains("/log"));
    }

    #[tokio::test]
    async fn test_alias_dispatches_identically_to_primary() {
        let mut env = TestEnv::registered().await;
        let via_alias = env.send_command("user", "/planilha not-a-real-sheet").await;
        let via_primary = env.send_command("user", "/spreadsheet not-a-real-sheet").await;
        assert_eq!(via_alias, via_primary);
    }

    #[tokio::test]
    async fn test_bare_log_token_without_marker() {
        let mut env = TestEnv::configured().await;
        let reply = env.send_text("user", "log Coffee 5,50").await;
        assert!(reply.text.contains("Coffee - 5,50"), "got: {}", reply.text);
    }

    #[tokio::test]
    async fn test_free_text_is_an_implicit_expense() {
        let mut env = TestEnv::configured().await;
        let reply = env.send_text("user", "Coffee 5,50 Food").await;
        assert!(reply.text.contains("Coffee - 5,50 (Food)"), "got: {}", reply.text);
    }

    #[tokio::test]
    async fn test_prompt_then_continuation_matches_direct_invocation() {
        let mut env = TestEnv::configured().await;

        let prompt = env.send_command("user", "/log").await;
        assert_eq!(prompt.text, replies::log_prompt());

        let continued = env.send_text("user", "Lunch 20,00").await;
        assert!(continued.text.contains("Lunch - 20,00"), "got: {}", continued.text);

        // The state was consumed: the same text again is a fresh implicit log,
        // not a continuation of anything.
        assert!(env.pending("conv").await.is_none());
    }

    #[tokio::test]
    async fn test_failed_continuation_leaves_the_conversation_idle() {
        let mut env = TestEnv::configured().await;
        env.send_command("user", "/log").await;
        assert!(env.pending("conv").await.is_some());

        let reply = env.send_text("user", "garbage without numbers").await;
        assert!(reply.text.contains("amount"), "got: {}", reply.text);
        // Cleared before validation: the user restarts /log from scratch.
        assert!(env.pending("conv").await.is_none());
    }

    #[tokio::test]
    async fn test_cancel_clears_whatever_is_pending() {
        let mut env = TestEnv::configured().await;
        env.send_command("user", "/spreadsheet").await;
        assert!(env.pending("conv").await.is_some());

        let reply = env.send_command("user", "/cancel").await;
        assert_eq!(reply.text, replies::cancelled());
        assert!(env.pending("conv").await.is_none());

        let reply = env.send_command("user", "/cancel").await;
        assert_eq!(reply.text, replies::nothing_to_cancel());
    }

    #[tokio::test]
    async fn test_new_prompt_overwrites_pending_state() {
        let mut env = TestEnv::configured().await;
        env.send_command("user", "/log").await;
        env.send_command("user", "/category").await;

        let pending = env.pending("conv").await.unwrap();
        assert_eq!(pending.active_command, "category");
    }

    #[tokio::test]
    async fn test_undo_round_trip() {
        let mut env = TestEnv::configured().await;
        env.send_text("user", "Cinema 30,00").await;

        let reply = env.send_command("user", "/undo").await;
        assert!(reply.text.contains("Cinema - 30,00"), "got: {}", reply.text);
    }

    #[tokio::test]
    async fn test_undo_on_empty_ledger() {
        let mut env = TestEnv::configured_empty().await;
        let reply = env.send_command("user", "/undo").await;
        assert_eq!(reply.text, replies::for_error(&Error::NoEntries));
    }

    #[tokio::test]
    async fn test_unconfigured_user_is_told_to_connect_a_spreadsheet() {
        let mut env = TestEnv::registered().await;
        let reply = env.send_command("user", "/log Coffee 5,50").await;
        assert_eq!(reply.text, replies::not_configured());
    }

    #[tokio::test]
    async fn test_configure_spreadsheet_via_continuation() {
        let mut env = TestEnv::registered().await;
        let prompt = env.send_command("user", "/spreadsheet").await;
        assert_eq!(prompt.text, replies::spreadsheet_prompt());

        let reply = env
            .send_text("user", crate::api::TEST_SPREADSHEET_ID)
            .await;
        assert_eq!(reply.text, replies::spreadsheet_configured());

        let logged = env.send_text("user", "Coffee 5,50").await;
        assert!(logged.text.contains("Coffee"), "got: {}", logged.text);
    }

    #[tokio::test]
    async fn test_category_command_adds_a_rule() {
        let mut env = TestEnv::configured().await;
        let reply = env.send_command("user", "/category Transport taxi").await;
        assert!(reply.text.contains("Transport"));

        let logged = env.send_text("user", "taxi ride 12,00").await;
        assert!(logged.text.contains("(Transport)"), "got: {}", logged.text);
    }
}
