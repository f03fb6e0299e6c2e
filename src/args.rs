//! These structs provide the CLI interface for the ledgerbot binary.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

/// ledgerbot: a chat-driven expense tracker backed by a Google Sheet.
///
/// Users record, categorize and undo expense entries by talking to the bot;
/// each entry becomes a row in their ledger spreadsheet. The `chat` command
/// runs a local interactive session that behaves exactly like the bot does
/// behind a chat transport.
///
/// Set LEDGER_BOT_IN_TEST_MODE to run against an in-memory spreadsheet
/// instead of the Google APIs.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration files.
    ///
    /// Decide what directory you want to store data in and pass it as
    /// --home (defaults to $HOME/ledgerbot). Optionally pass the URL of a
    /// default ledger spreadsheet as --sheet-url; individual chat users
    /// connect their own spreadsheets during conversation.
    ///
    /// Before talking to Google, place an access-token file at
    /// .secrets/token.json inside the home directory.
    Init(InitArgs),

    /// Run a local interactive chat session against the dispatcher.
    ///
    /// Lines starting with '/' are treated as command invocations, anything
    /// else as plain text, mirroring how a chat transport marks messages.
    Chat,

    /// Validate the default spreadsheet configured at init time.
    Validate,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where ledgerbot data and configuration is held.
    /// Defaults to ~/ledgerbot
    #[arg(long, env = "LEDGER_BOT_HOME", default_value_t = default_home())]
    home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, home: PathBuf) -> Self {
        Self {
            log_level,
            home: home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &DisplayPath {
        &self.home
    }
}

/// Args for the `ledgerbot init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL of the default ledger spreadsheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long, default_value = "")]
    sheet_url: String,
}

impl InitArgs {
    pub fn new(sheet_url: impl Into<String>) -> Self {
        Self {
            sheet_url: sheet_url.into(),
        }
    }

    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }
}

/// A `PathBuf` wrapper that implements `Display` and `FromStr` so clap can
/// show and parse default values.
#[derive(Debug, Clone)]
pub struct DisplayPath(PathBuf);

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        Self(value)
    }
}

fn default_home() -> DisplayPath {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ledgerbot")
        .into()
}
