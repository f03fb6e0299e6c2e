//! Implements the very simple `SheetsApi` trait using in-memory data for
//! testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that
//! we can run the whole app, top-to-bottom, without using Google Sheets.

use crate::api::{A1Range, SheetMeta, SheetRange, SheetsApi, SpreadsheetMeta};
use crate::error::{Error, Result};
use std::io::Cursor;

/// An implementation of the `SheetsApi` trait that does not use Google
/// sheets. It holds one spreadsheet's tabs in memory and, via `seeded`, can
/// start with some existing data.
pub(crate) struct TestSheet {
    spreadsheet_id: String,
    tabs: Vec<Tab>,
}

/// One sheet (tab) held in memory.
#[derive(Debug, Clone)]
pub(crate) struct Tab {
    sheet_id: i64,
    title: String,
    rows: Vec<Vec<String>>,
}

impl TestSheet {
    /// Create a new `TestSheet` answering to `spreadsheet_id`, with the given
    /// `(title, rows)` tabs. Sheet ids are assigned in order.
    pub(crate) fn new(
        spreadsheet_id: impl Into<String>,
        tabs: Vec<(String, Vec<Vec<String>>)>,
    ) -> Self {
        let tabs = tabs
            .into_iter()
            .enumerate()
            .map(|(ix, (title, rows))| Tab {
                sheet_id: ix as i64,
                title,
                rows,
            })
            .collect();
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            tabs,
        }
    }

    /// Loads the seed data from this module: a ledger with a few entries, a
    /// category list and a rule list.
    pub(crate) fn seeded(spreadsheet_id: impl Into<String>) -> Self {
        Self::new(
            spreadsheet_id,
            vec![
                (
                    crate::ledger::LEDGER_SHEET.to_string(),
                    load_csv(EXPENSE_DATA).unwrap(),
                ),
                (
                    crate::ledger::CATEGORY_SHEET.to_string(),
                    load_csv(CATEGORY_DATA).unwrap(),
                ),
                (
                    crate::ledger::RULE_SHEET.to_string(),
                    load_csv(RULE_DATA).unwrap(),
                ),
            ],
        )
    }

    /// The current rows of a tab, for test assertions.
    pub(crate) fn rows(&self, title: &str) -> Option<&Vec<Vec<String>>> {
        self.tabs.iter().find(|t| t.title == title).map(|t| &t.rows)
    }

    fn check_id(&self, spreadsheet_id: &str) -> Result<()> {
        if spreadsheet_id != self.spreadsheet_id {
            return Err(Error::not_found(format!(
                "spreadsheet '{spreadsheet_id}'"
            )));
        }
        Ok(())
    }

    fn tab(&self, title: &str) -> Result<&Tab> {
        self.tabs
            .iter()
            .find(|t| t.title == title)
            .ok_or_else(|| Error::not_found(format!("sheet '{title}'")))
    }

    fn tab_by_id_mut(&mut self, sheet_id: i64) -> Result<&mut Tab> {
        self.tabs
            .iter_mut()
            .find(|t| t.sheet_id == sheet_id)
            .ok_or_else(|| Error::not_found(format!("sheet id {sheet_id}")))
    }
}

#[async_trait::async_trait]
impl SheetsApi for TestSheet {
    async fn metadata(&mut self, spreadsheet_id: &str) -> Result<SpreadsheetMeta> {
        self.check_id(spreadsheet_id)?;
        Ok(SpreadsheetMeta {
            spreadsheet_id: self.spreadsheet_id.clone(),
            sheets: self
                .tabs
                .iter()
                .map(|t| SheetMeta {
                    sheet_id: t.sheet_id,
                    title: t.title.clone(),
                })
                .collect(),
        })
    }

    async fn read_range(
        &mut self,
        spreadsheet_id: &str,
        range: &A1Range,
    ) -> Result<Vec<Vec<String>>> {
        self.check_id(spreadsheet_id)?;
        let tab = self.tab(&range.sheet)?;

        let start_ix = range.start_row.saturating_sub(1) as usize;
        let end_ix = match range.end_row {
            Some(end_row) => (end_row as usize).min(tab.rows.len()),
            None => tab.rows.len(),
        };

        let mut out: Vec<Vec<String>> = Vec::new();
        for row in tab.rows.iter().take(end_ix).skip(start_ix) {
            let cells: Vec<String> = (range.start_col..=range.end_col)
                .map(|col| row.get(col).cloned().unwrap_or_default())
                .collect();
            out.push(cells);
        }

        // The backend does not return trailing empty rows.
        while out
            .last()
            .is_some_and(|cells| cells.iter().all(|c| c.is_empty()))
        {
            out.pop();
        }
        Ok(out)
    }

    async fn write_ranges(&mut self, spreadsheet_id: &str, data: &[SheetRange]) -> Result<()> {
        self.check_id(spreadsheet_id)?;
        for sheet_range in data {
            let range = sheet_range.range.clone();
            // Resolve the numeric id first so we can borrow mutably by id.
            let sheet_id = self.tab(&range.sheet)?.sheet_id;
            let tab = self.tab_by_id_mut(sheet_id)?;
            for (row_offset, values) in sheet_range.values.iter().enumerate() {
                let row_ix = (range.start_row as usize - 1) + row_offset;
                while tab.rows.len() <= row_ix {
                    tab.rows.push(Vec::new());
                }
                let row = &mut tab.rows[row_ix];
                for (col_offset, value) in values.iter().enumerate() {
                    let col_ix = range.start_col + col_offset;
                    while row.len() <= col_ix {
                        row.push(String::new());
                    }
                    row[col_ix] = value.clone();
                }
            }
        }
        Ok(())
    }

    async fn insert_row(&mut self, spreadsheet_id: &str, sheet_id: i64, row: u32) -> Result<()> {
        self.check_id(spreadsheet_id)?;
        let tab = self.tab_by_id_mut(sheet_id)?;
        let ix = (row as usize).saturating_sub(1);
        if ix > tab.rows.len() {
            tab.rows.resize(ix, Vec::new());
        }
        tab.rows.insert(ix, Vec::new());
        Ok(())
    }

    async fn delete_row(&mut self, spreadsheet_id: &str, sheet_id: i64, row: u32) -> Result<()> {
        self.check_id(spreadsheet_id)?;
        let tab = self.tab_by_id_mut(sheet_id)?;
        let ix = (row as usize).saturating_sub(1);
        if ix < tab.rows.len() {
            tab.rows.remove(ix);
        }
        Ok(())
    }
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Result<Vec<Vec<String>>> {
    let bytes = csv_data.as_bytes();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false) // Ensure headers are treated as part of the data
        .from_reader(Cursor::new(bytes));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(anyhow::Error::new)?;
        let row: Vec<String> = record.iter().map(|field| field.to_string()).collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Seed ledger data. Column A is unused, matching the live sheet layout.
const EXPENSE_DATA: &str = r##",Description,Category,Exchange Rate,Amount,Total,Date,Created,Source
,Groceries at the market,Food,,87.43,87.43,2026-08-01,2026-08-01T10:15:30Z,chat
,Bus ticket,Transport,,4.40,4.40,2026-08-02,2026-08-02T08:45:12Z,chat
,Electric bill,Utilities,,142.67,142.67,2026-08-03,2026-08-03T07:22:45Z,chat
"##;

/// Seed category list.
const CATEGORY_DATA: &str = r##"Category
Food
Transport
Utilities
Leisure
"##;

/// Seed categorization rules, first match wins.
const RULE_DATA: &str = r##"Category,Pattern
Food,coffee
Food,lunch
Transport,uber
Utilities,electric
"##;
