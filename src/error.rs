//! The crate-wide error type.
//!
//! Expected, user-recoverable failures are explicit variants so the chat layer
//! can map each one to a specific reply. Anything else travels as `Unexpected`
//! and is logged, never shown to the user verbatim.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The user-supplied amount string could not be parsed as money.
    #[error("invalid amount format: '{raw}'")]
    InvalidAmountFormat { raw: String },

    /// Malformed command arguments.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The conversation has no registered user and the command requires one.
    #[error("conversation is not signed up")]
    Unauthorized,

    /// The spreadsheet, or a sheet within it, does not exist or is unreachable.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// The credential was rejected by the spreadsheet backend.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The spreadsheet is reachable but an expected sheet is missing.
    #[error("required sheet '{0}' not found")]
    RequiredSheetNotFound(String),

    /// The ledger holds no entries at or after the first entry row.
    #[error("the ledger has no entries")]
    NoEntries,

    /// Anything we did not anticipate: network failures, backend surprises.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl Error {
    pub fn invalid_amount(raw: impl Into<String>) -> Self {
        Error::InvalidAmountFormat { raw: raw.into() }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Error::ResourceNotFound(what.into())
    }
}
