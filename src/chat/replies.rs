//! Every user-facing reply string in one place.
//!
//! The rest of the crate returns typed errors; only this module turns them
//! into text, so no raw error detail can leak into a chat message.

use crate::error::Error;
use crate::model::Entry;

pub(crate) fn welcome(name: &str) -> String {
    let greeting = if name.is_empty() {
        "Welcome!".to_string()
    } else {
        format!("Welcome, {name}!")
    };
    format!(
        "{greeting} You're signed up.\n\
         Connect your ledger with /spreadsheet <link>, then log expenses like:\n\
         Coffee 5,50"
    )
}

pub(crate) fn already_registered() -> String {
    "You're already signed up. Log an expense like: Coffee 5,50".to_string()
}

pub(crate) fn help_text() -> String {
    "What I can do:\n\
     /log <description> <amount> [category] - record an expense\n\
     /undo - remove the most recent entry\n\
     /last - show the most recent entry\n\
     /category <name> <pattern> - auto-categorize matching descriptions\n\
     /spreadsheet <link> - connect your ledger spreadsheet\n\
     /cancel - abandon the current step\n\
     You can also just type an expense, like: Coffee 5,50 Food"
        .to_string()
}

pub(crate) fn unknown_command() -> String {
    "I don't recognize that command.".to_string()
}

pub(crate) fn sign_up_prompt() -> String {
    "You're not signed up yet. Send /start to get going.".to_string()
}

pub(crate) fn log_prompt() -> String {
    "Send me the expense: <description> <amount> [category]\nFor example: Lunch 20,00".to_string()
}

pub(crate) fn logged(entry: &Entry) -> String {
    format!("Recorded: {entry}")
}

pub(crate) fn removed(entry: &Entry) -> String {
    format!("Removed: {entry}")
}

pub(crate) fn last(entry: &Entry) -> String {
    format!("Your latest entry: {entry}")
}

pub(crate) fn not_configured() -> String {
    "You don't have a spreadsheet connected yet. Send /spreadsheet <link> first.".to_string()
}

pub(crate) fn spreadsheet_prompt() -> String {
    "Send me the link (or id) of your ledger spreadsheet.".to_string()
}

pub(crate) fn spreadsheet_configured() -> String {
    "Your spreadsheet is connected. Log an expense like: Coffee 5,50".to_string()
}

pub(crate) fn rule_prompt() -> String {
    "Send me the rule: <category> <pattern>\nFor example: Food coffee".to_string()
}

pub(crate) fn rule_added(category: &str, pattern: &str) -> String {
    format!("New rule: descriptions containing \"{pattern}\" go to {category}.")
}

pub(crate) fn cancelled() -> String {
    "Cancelled.".to_string()
}

pub(crate) fn nothing_to_cancel() -> String {
    "There was nothing to cancel.".to_string()
}

/// Maps a typed failure to its reply. `Unexpected` gets the generic message;
/// the caller is responsible for logging the detail.
pub(crate) fn for_error(error: &Error) -> String {
    match error {
        Error::InvalidAmountFormat { raw } => {
            format!("I couldn't read \"{raw}\" as an amount. Try something like 5,50.")
        }
        Error::InvalidInput(_) => {
            "That doesn't look right. Send /help to see what I understand.".to_string()
        }
        Error::Unauthorized => sign_up_prompt(),
        Error::ResourceNotFound(_) => {
            "I can't find your spreadsheet. Check the link and /spreadsheet again.".to_string()
        }
        Error::PermissionDenied(_) => {
            "I'm not allowed into that spreadsheet. Share it with the bot account and retry."
                .to_string()
        }
        Error::RequiredSheetNotFound(name) => {
            format!("Your spreadsheet is missing the \"{name}\" sheet.")
        }
        Error::NoEntries => "Your ledger has no entries yet.".to_string(),
        Error::Unexpected(_) => "Something went wrong on my side. Please try again.".to_string(),
    }
}
