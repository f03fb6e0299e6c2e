//! The command namespace: primary commands, the alias table and token
//! normalization.
//!
//! Aliases are plain data, one level deep. They carry no behavior of their
//! own: resolving an alias yields the primary command, and the trailing
//! argument text is untouched.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The primary commands.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandName {
    Start,
    Help,
    Log,
    Undo,
    Last,
    Spreadsheet,
    Category,
    Cancel,
}

serde_plain::derive_display_from_serialize!(CommandName);
serde_plain::derive_fromstr_from_deserialize!(CommandName);

impl CommandName {
    /// Every command except signup requires a registered user.
    pub fn requires_user(&self) -> bool {
        !matches!(self, CommandName::Start)
    }
}

/// `(alias, primary)` rewrite pairs. Never alias to alias.
const ALIASES: &[(&str, CommandName)] = &[
    ("planilha", CommandName::Spreadsheet),
    ("gasto", CommandName::Log),
    ("desfazer", CommandName::Undo),
    ("ultimo", CommandName::Last),
    ("ajuda", CommandName::Help),
    ("categoria", CommandName::Category),
    ("cancelar", CommandName::Cancel),
];

/// Commands that may be invoked by their bare name, without the command
/// marker, as the first word of a plain message.
const BARE_TOKENS: &[CommandName] = &[CommandName::Log];

/// Resolves normalized tokens to commands. Primary names and aliases share
/// one namespace.
pub struct Registry;

impl Registry {
    /// Normalizes a raw command token: strips the leading marker and any
    /// platform suffix (`/log@SomeBot` -> `log`), lowercased.
    pub fn normalize_token(raw: &str) -> String {
        let token = raw.trim().trim_start_matches('/');
        let token = token.split('@').next().unwrap_or(token);
        token.to_lowercase()
    }

    /// Looks up a normalized token: a primary name resolves to itself, an
    /// alias resolves to its target.
    pub fn resolve(token: &str) -> Option<CommandName> {
        if let Ok(name) = CommandName::from_str(token) {
            return Some(name);
        }
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == token)
            .map(|(_, name)| *name)
    }

    /// Resolves a token from unmarked text, restricted to the bare-name
    /// allow-list (the expense-logging command and its aliases).
    pub fn resolve_bare(token: &str) -> Option<CommandName> {
        Self::resolve(token).filter(|name| BARE_TOKENS.contains(name))
    }

    /// The command invoked when a marked token is not recognized.
    pub fn fallback() -> CommandName {
        CommandName::Help
    }

    /// The command that absorbs unstructured text when nothing is pending.
    pub fn implicit() -> CommandName {
        CommandName::Log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_token() {
        assert_eq!(Registry::normalize_token("/log"), "log");
        assert_eq!(Registry::normalize_token("/LOG@ExpenseBot"), "log");
        assert_eq!(Registry::normalize_token("Undo"), "undo");
    }

    #[test]
    fn test_resolve_primary_names() {
        assert_eq!(Registry::resolve("log"), Some(CommandName::Log));
        assert_eq!(Registry::resolve("spreadsheet"), Some(CommandName::Spreadsheet));
        assert_eq!(Registry::resolve("nope"), None);
    }

    #[test]
    fn test_resolve_aliases() {
        assert_eq!(Registry::resolve("planilha"), Some(CommandName::Spreadsheet));
        assert_eq!(Registry::resolve("gasto"), Some(CommandName::Log));
        assert_eq!(Registry::resolve("desfazer"), Some(CommandName::Undo));
    }

    #[test]
    fn test_bare_tokens_are_log_only() {
        assert_eq!(Registry::resolve_bare("log"), Some(CommandName::Log));
        assert_eq!(Registry::resolve_bare("gasto"), Some(CommandName::Log));
        assert_eq!(Registry::resolve_bare("undo"), None);
        assert_eq!(Registry::resolve_bare("help"), None);
    }

    #[test]
    fn test_display_round_trip() {
        for name in [CommandName::Log, CommandName::Spreadsheet, CommandName::Cancel] {
            let shown = name.to_string();
            assert_eq!(CommandName::from_str(&shown).unwrap(), name);
        }
    }

    #[test]
    fn test_only_start_skips_the_auth_gate() {
        assert!(!CommandName::Start.requires_user());
        for name in [
            CommandName::Help,
            CommandName::Log,
            CommandName::Undo,
            CommandName::Last,
            CommandName::Spreadsheet,
            CommandName::Category,
            CommandName::Cancel,
        ] {
            assert!(name.requires_user(), "{name} must require sign-in");
        }
    }
}
