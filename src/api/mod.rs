//! The boundary to the spreadsheet backend.
//!
//! `SheetsApi` is the raw surface the ledger code talks to. There are two
//! implementations: `GoogleSheets` against the real API and `TestSheet`, an
//! in-memory stand-in that lets the whole app run top-to-bottom without
//! Google.

mod range;
mod sheet;
mod sheet_test_client;

use crate::error::Result;
use crate::Config;
use serde::{Deserialize, Serialize};

pub use range::{col_letters, letters_to_index, A1Range};
pub(crate) use sheet_test_client::TestSheet;

/// The spreadsheet id the in-memory test backend answers to.
pub const TEST_SPREADSHEET_ID: &str = "test-spreadsheet";

/// One write target: a range plus the row-major values to put there.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SheetRange {
    pub range: A1Range,
    pub values: Vec<Vec<String>>,
}

impl SheetRange {
    pub fn new(range: A1Range, values: Vec<Vec<String>>) -> Self {
        Self { range, values }
    }
}

/// Identity and sheet inventory of one spreadsheet.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SpreadsheetMeta {
    pub spreadsheet_id: String,
    pub sheets: Vec<SheetMeta>,
}

/// One sheet (tab) inside a spreadsheet.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SheetMeta {
    pub sheet_id: i64,
    pub title: String,
}

/// Raw operations against the spreadsheet backend. Everything above this
/// trait is backend-agnostic; everything below it belongs to one concrete
/// client.
#[async_trait::async_trait]
pub trait SheetsApi: Send {
    /// Fetches the spreadsheet's identity and list of sheets.
    async fn metadata(&mut self, spreadsheet_id: &str) -> Result<SpreadsheetMeta>;

    /// Reads a range as rows of display strings. Trailing empty rows are not
    /// returned by the backend.
    async fn read_range(&mut self, spreadsheet_id: &str, range: &A1Range)
        -> Result<Vec<Vec<String>>>;

    /// One batched multi-range write. Values are user-entered, so formula
    /// strings are evaluated by the backend.
    async fn write_ranges(&mut self, spreadsheet_id: &str, data: &[SheetRange]) -> Result<()>;

    /// Inserts a blank row at the 1-based `row`, shifting `row` and below down.
    async fn insert_row(&mut self, spreadsheet_id: &str, sheet_id: i64, row: u32) -> Result<()>;

    /// Deletes the 1-based `row`, shifting subsequent rows up.
    async fn delete_row(&mut self, spreadsheet_id: &str, sheet_id: i64, row: u32) -> Result<()>;
}

/// Selects the sheets backend. This allows for running the program without
/// hitting the Google APIs: when `LEDGER_BOT_IN_TEST_MODE` is set and
/// non-zero in length, the mode will be `Mode::Test`, otherwise `Mode::Google`.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Google,
    Test,
}

serde_plain::derive_display_from_serialize!(Mode);
serde_plain::derive_fromstr_from_deserialize!(Mode);

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var("LEDGER_BOT_IN_TEST_MODE") {
            Ok(value) if !value.is_empty() => Mode::Test,
            _ => Mode::Google,
        }
    }
}

/// Creates the `SheetsApi` implementation for `mode`.
pub async fn sheets_api(config: &Config, mode: Mode) -> Result<Box<dyn SheetsApi + Send>> {
    match mode {
        Mode::Google => {
            let token = config.access_token().await?;
            Ok(Box::new(sheet::GoogleSheets::new(token)))
        }
        Mode::Test => Ok(Box::new(TestSheet::seeded(TEST_SPREADSHEET_ID))),
    }
}
