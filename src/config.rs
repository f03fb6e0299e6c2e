//! Configuration file handling.
//!
//! The configuration file is stored at `$LEDGER_BOT_HOME/config.json` and
//! holds the default spreadsheet URL plus the access-token file path. The
//! SQLite database and the `.secrets` directory live alongside it.

use crate::db::Db;
use crate::error::{Error, Result};
use crate::utils;
use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "ledgerbot";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const TOKEN_JSON: &str = "token.json";
const CONFIG_JSON: &str = "config.json";
const LEDGER_BOT_SQLITE: &str = "ledgerbot.sqlite";

/// The `Config` object represents the configuration of the app. You
/// instantiate it by providing the path to `$LEDGER_BOT_HOME` and from there
/// it loads `$LEDGER_BOT_HOME/config.json`, the SQLite database, and paths to
/// the other items expected inside the home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    db: Db,
    spreadsheet_id: String,
}

impl Config {
    /// Creates the data directory and its contents:
    /// - an initial `config.json` using `sheet_url` along with default settings
    /// - the `.secrets` directory where the access-token file is expected
    /// - a fresh SQLite database
    pub async fn create(dir: impl Into<PathBuf>, sheet_url: &str) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .map_err(|e| anyhow!(e).context("Unable to create the ledgerbot home directory"))?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            sheet_url: sheet_url.to_string(),
            token_path: None,
        };
        config_file.save(&config_path).await?;

        let db = Db::init(root.join(LEDGER_BOT_SQLITE))
            .await
            .map_err(|e| anyhow!(e).context("Unable to create SQLite DB"))?;

        let spreadsheet_id = if sheet_url.is_empty() {
            String::new()
        } else {
            extract_spreadsheet_id(sheet_url)?
        };

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            db,
            spreadsheet_id,
        })
    }

    /// Loads an existing home directory: validates that it and the config
    /// file exist, loads the config and the database.
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative).await?;
        let _ = utils::read_dir(&root)
            .await
            .map_err(|e| anyhow!(e).context("Ledgerbot home is missing"))?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            return Err(anyhow!("The config file is missing '{}'", config_path.display()).into());
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let spreadsheet_id = if config_file.sheet_url.is_empty() {
            String::new()
        } else {
            extract_spreadsheet_id(&config_file.sheet_url)?
        };

        let db = Db::load(root.join(LEDGER_BOT_SQLITE))
            .await
            .map_err(|e| anyhow!(e).context("Unable to load SQLite DB"))?;

        Ok(Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
            db,
            spreadsheet_id,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    pub fn sheet_url(&self) -> &str {
        &self.config_file.sheet_url
    }

    /// The default spreadsheet id, extracted from the configured URL. Empty
    /// when no default was configured.
    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves
    /// it relative to the home directory.
    pub fn token_path(&self) -> PathBuf {
        let p = self.config_file.token_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }

    /// Reads the access token for the spreadsheet backend. The token file is
    /// provisioned outside of this program.
    pub async fn access_token(&self) -> Result<String> {
        let path = self.token_path();
        let token: TokenFile = utils::deserialize(&path).await.map_err(|e| {
            anyhow!(e).context(format!(
                "Unable to read the access token at '{}'",
                path.display()
            ))
        })?;
        Ok(token.access_token)
    }
}

/// The access-token file written by whatever provisions credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenFile {
    access_token: String,
}

/// Represents the serialization and deserialization format of the
/// configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "ledgerbot",
///   "config_version": 1,
///   "sheet_url": "https://docs.google.com/spreadsheets/d/7KpXm2RfZwNJgs84QhVYno5DU6iM9Wlr3bCzAv1txRpL",
///   "token_path": ".secrets/token.json"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "ledgerbot"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// URL of the default ledger spreadsheet; may be empty.
    sheet_url: String,

    /// Path to the access-token file (optional, relative to the home
    /// directory or absolute). Defaults to `.secrets/token.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

impl ConfigFile {
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;
        if config.app_name != APP_NAME {
            return Err(anyhow!(
                "Invalid app_name in config file: expected '{}', got '{}'",
                APP_NAME,
                config.app_name
            )
            .into());
        }
        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path.as_ref(), data).await
    }

    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(TOKEN_JSON))
    }
}

/// Extracts a spreadsheet id from a Google Sheets URL, or accepts a bare id.
///
/// URL format: `https://docs.google.com/spreadsheets/d/SPREADSHEET_ID/...`.
/// Anything without slashes is taken to be the id itself.
pub(crate) fn extract_spreadsheet_id(input: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::invalid_input("spreadsheet link is empty"));
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        let url = Url::parse(input)
            .map_err(|_| Error::invalid_input(format!("'{input}' is not a valid link")))?;
        let mut segments = url
            .path_segments()
            .ok_or_else(|| Error::invalid_input(format!("'{input}' has no path")))?;
        while let Some(segment) = segments.next() {
            if segment == "d" {
                if let Some(id) = segments.next() {
                    if !id.is_empty() {
                        return Ok(id.to_string());
                    }
                }
            }
        }
        return Err(Error::invalid_input(format!(
            "'{input}' does not look like a spreadsheet link"
        )));
    }

    if input.contains('/') || input.contains(char::is_whitespace) {
        return Err(Error::invalid_input(format!(
            "'{input}' does not look like a spreadsheet id"
        )));
    }
    Ok(input.to_string())
}
