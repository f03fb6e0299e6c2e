//! Command handlers and their continuation behavior.
//!
//! A handler invoked without arguments prompts and records pending state; the
//! conversation's next message is routed back here as a continuation.
//! Continuations clear the pending state before validating the new input, so
//! a failed continuation leaves the conversation idle and the user restarts
//! the command.

use crate::chat::registry::CommandName;
use crate::chat::{replies, Ctx, Reply};
use crate::config;
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::ledger::Engine;
use crate::model::{Amount, PendingState};
use crate::state::StateStore;

/// How a handler was reached.
pub(crate) enum Invocation {
    /// A direct (or implicit) invocation with whatever arguments came along.
    Direct,
    /// The conversation had pending state and this message completes it.
    Continuation(PendingState),
}

/// What the handlers operate on. The engine owns the spreadsheet backend;
/// the stores are shared seams.
pub(crate) struct Services<'a> {
    pub engine: &'a mut Engine,
    pub store: &'a dyn StateStore,
    pub identity: &'a dyn Identity,
}

pub(crate) async fn run(
    services: &mut Services<'_>,
    name: CommandName,
    ctx: &Ctx,
    args: &str,
    invocation: Invocation,
) -> Result<Reply> {
    match name {
        CommandName::Start => start(services, ctx).await,
        CommandName::Help => Ok(Reply::new(replies::help_text())),
        CommandName::Log => log(services, ctx, args, invocation).await,
        CommandName::Undo => undo(services, ctx).await,
        CommandName::Last => last(services, ctx).await,
        CommandName::Spreadsheet => spreadsheet(services, ctx, args, invocation).await,
        CommandName::Category => category(services, ctx, args, invocation).await,
        CommandName::Cancel => cancel(services, ctx).await,
    }
}

async fn start(services: &mut Services<'_>, ctx: &Ctx) -> Result<Reply> {
    if ctx.user.is_some() {
        return Ok(Reply::new(replies::already_registered()));
    }
    let user = services
        .identity
        .create(&ctx.sender_id, &ctx.sender_name)
        .await?;
    Ok(Reply::new(replies::welcome(&user.display_name)))
}

async fn log(
    services: &mut Services<'_>,
    ctx: &Ctx,
    args: &str,
    invocation: Invocation,
) -> Result<Reply> {
    let continuation = matches!(invocation, Invocation::Continuation(_));
    if continuation {
        services.store.clear(&ctx.conversation_id).await?;
    }

    let args = args.trim();
    if args.is_empty() {
        if continuation {
            return Err(Error::invalid_input("empty expense details"));
        }
        services
            .store
            .set(&ctx.conversation_id, &CommandName::Log.to_string(), "")
            .await?;
        return Ok(Reply::new(replies::log_prompt()));
    }

    let user = ctx.user()?;
    if user.spreadsheet_id.is_empty() {
        return Ok(Reply::new(replies::not_configured()));
    }

    let (description, raw_amount, user_category) = parse_entry_args(args)?;
    let entry = services
        .engine
        .append_entry(&user.spreadsheet_id, &description, &raw_amount, &user_category)
        .await?;
    Ok(Reply::new(replies::logged(&entry)))
}

async fn undo(services: &mut Services<'_>, ctx: &Ctx) -> Result<Reply> {
    let user = ctx.user()?;
    if user.spreadsheet_id.is_empty() {
        return Ok(Reply::new(replies::not_configured()));
    }
    let entry = services.engine.remove_last_entry(&user.spreadsheet_id).await?;
    Ok(Reply::new(replies::removed(&entry)))
}

async fn last(services: &mut Services<'_>, ctx: &Ctx) -> Result<Reply> {
    let user = ctx.user()?;
    if user.spreadsheet_id.is_empty() {
        return Ok(Reply::new(replies::not_configured()));
    }
    let entry = services.engine.last_entry(&user.spreadsheet_id).await?;
    Ok(Reply::new(replies::last(&entry)))
}

async fn spreadsheet(
    services: &mut Services<'_>,
    ctx: &Ctx,
    args: &str,
    invocation: Invocation,
) -> Result<Reply> {
    let continuation = matches!(invocation, Invocation::Continuation(_));
    if continuation {
        services.store.clear(&ctx.conversation_id).await?;
    }

    let args = args.trim();
    if args.is_empty() {
        if continuation {
            return Err(Error::invalid_input("empty spreadsheet link"));
        }
        services
            .store
            .set(&ctx.conversation_id, &CommandName::Spreadsheet.to_string(), "")
            .await?;
        return Ok(Reply::new(replies::spreadsheet_prompt()));
    }

    let user = ctx.user()?;
    let spreadsheet_id = config::extract_spreadsheet_id(args)?;
    services.engine.validate(&spreadsheet_id).await?;
    services
        .identity
        .update_configuration(user.id, &spreadsheet_id)
        .await?;
    Ok(Reply::new(replies::spreadsheet_configured()))
}

async fn category(
    services: &mut Services<'_>,
    ctx: &Ctx,
    args: &str,
    invocation: Invocation,
) -> Result<Reply> {
    let continuation = matches!(invocation, Invocation::Continuation(_));
    if continuation {
        services.store.clear(&ctx.conversation_id).await?;
    }

    let args = args.trim();
    if args.is_empty() {
        if continuation {
            return Err(Error::invalid_input("empty rule"));
        }
        services
            .store
            .set(&ctx.conversation_id, &CommandName::Category.to_string(), "")
            .await?;
        return Ok(Reply::new(replies::rule_prompt()));
    }

    let user = ctx.user()?;
    if user.spreadsheet_id.is_empty() {
        return Ok(Reply::new(replies::not_configured()));
    }

    let (category, pattern) = args
        .split_once(char::is_whitespace)
        .map(|(category, pattern)| (category.trim(), pattern.trim()))
        .ok_or_else(|| Error::invalid_input("a rule needs a category and a pattern"))?;
    services
        .engine
        .add_rule(&user.spreadsheet_id, category, pattern)
        .await?;
    Ok(Reply::new(replies::rule_added(category, pattern)))
}

async fn cancel(services: &mut Services<'_>, ctx: &Ctx) -> Result<Reply> {
    match services.store.clear(&ctx.conversation_id).await? {
        Some(_) => Ok(Reply::new(replies::cancelled())),
        None => Ok(Reply::new(replies::nothing_to_cancel())),
    }
}

/// Splits expense arguments into `(description, raw_amount, category)`.
///
/// The amount is the last or second-to-last whitespace token; a token after
/// the amount is the optional category label. Everything before the amount is
/// the description.
fn parse_entry_args(args: &str) -> Result<(String, String, String)> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(Error::invalid_input(
            "an expense needs a description and an amount",
        ));
    }

    let n = tokens.len();
    if Amount::parse(tokens[n - 1]).is_ok() {
        return Ok((
            tokens[..n - 1].join(" "),
            tokens[n - 1].to_string(),
            String::new(),
        ));
    }
    if n >= 3 && Amount::parse(tokens[n - 2]).is_ok() {
        return Ok((
            tokens[..n - 2].join(" "),
            tokens[n - 2].to_string(),
            tokens[n - 1].to_string(),
        ));
    }

    // Neither candidate parsed; report the one that was meant as the amount.
    let candidate = if n >= 3 && tokens[n - 2].chars().any(|c| c.is_ascii_digit()) {
        tokens[n - 2]
    } else {
        tokens[n - 1]
    };
    Err(Error::invalid_amount(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_description_and_amount() {
        let (description, amount, category) = parse_entry_args("Coffee 5,50").unwrap();
        assert_eq!(description, "Coffee");
        assert_eq!(amount, "5,50");
        assert_eq!(category, "");
    }

    #[test]
    fn test_parse_with_category() {
        let (description, amount, category) =
            parse_entry_args("Coffee at the corner 5,50 Food").unwrap();
        assert_eq!(description, "Coffee at the corner");
        assert_eq!(amount, "5,50");
        assert_eq!(category, "Food");
    }

    #[test]
    fn test_parse_multi_word_description() {
        let (description, amount, category) = parse_entry_args("Lunch with friends 42").unwrap();
        assert_eq!(description, "Lunch with friends");
        assert_eq!(amount, "42");
        assert_eq!(category, "");
    }

    #[test]
    fn test_parse_too_few_tokens() {
        assert!(matches!(
            parse_entry_args("Coffee").unwrap_err(),
            Error::InvalidInput(_)
        ));
    }

    #[test]
    fn test_parse_bad_amount_is_reported_as_amount_error() {
        let err = parse_entry_args("Coffee 5,5,0 Food").unwrap_err();
        match err {
            Error::InvalidAmountFormat { raw } => assert_eq!(raw, "5,5,0"),
            other => panic!("expected InvalidAmountFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_no_amount_anywhere() {
        let err = parse_entry_args("just some words").unwrap_err();
        assert!(matches!(err, Error::InvalidAmountFormat { .. }));
    }
}
