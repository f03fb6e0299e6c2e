//! The three ledger operations (append, undo, read-last) plus validation and
//! rule management, composed from the accessor, the amount parser and the
//! category catalog.

use crate::api::{A1Range, SheetRange, SheetsApi};
use crate::error::{Error, Result};
use crate::ledger::{
    Accessor, AMOUNT_COL, CATEGORY_COL, CATEGORY_NAME_COL, CATEGORY_SHEET, CREATED_COL, DATE_COL,
    DESCRIPTION_COL, FIRST_ENTRY_ROW, LEDGER_SHEET, RATE_COL, RULE_CATEGORY_COL, RULE_PATTERN_COL,
    RULE_SHEET, SOURCE_COL, TOTAL_COL,
};
use crate::model::{Amount, Catalog, Entry};
use chrono::{Local, Utc};
use tracing::{debug, warn};

/// Value written to the source column for entries recorded through chat.
const ENTRY_SOURCE: &str = "chat";

/// Ledger operations over one spreadsheet backend.
pub struct Engine {
    pub(crate) accessor: Accessor,
}

impl Engine {
    pub fn new(api: Box<dyn SheetsApi + Send>) -> Self {
        Self {
            accessor: Accessor::new(api),
        }
    }

    /// Appends one expense entry.
    ///
    /// The amount is parsed first: nothing is written when it is invalid.
    /// The category list and rules are fetched once and reused for the whole
    /// operation, then the entry row is inserted at the first free row and
    /// written in a single batched call.
    pub async fn append_entry(
        &mut self,
        spreadsheet_id: &str,
        description: &str,
        raw_amount: &str,
        user_category: &str,
    ) -> Result<Entry> {
        let amount = Amount::parse(raw_amount)?;
        let description = description.trim();
        if description.is_empty() {
            return Err(Error::invalid_input("entry description is empty"));
        }

        let catalog = self.catalog(spreadsheet_id).await?;
        let category = catalog.resolve(user_category, description);

        let sheet_id = self
            .accessor
            .resolve_sheet_id(spreadsheet_id, LEDGER_SHEET)
            .await?;
        let row = self
            .accessor
            .find_first_empty_row(spreadsheet_id, LEDGER_SHEET, DESCRIPTION_COL, FIRST_ENTRY_ROW)
            .await?;
        debug!("appending '{description}' at row {row}");

        self.accessor
            .insert_row(spreadsheet_id, sheet_id, row)
            .await?;
        self.accessor
            .write_cells(spreadsheet_id, &[entry_row(row, description, amount, &category)])
            .await?;

        Ok(Entry::new(description, amount, category))
    }

    /// Removes the most recent entry and returns it.
    ///
    /// The row is read before it is deleted; its content is gone afterwards.
    pub async fn remove_last_entry(&mut self, spreadsheet_id: &str) -> Result<Entry> {
        let sheet_id = self
            .accessor
            .resolve_sheet_id(spreadsheet_id, LEDGER_SHEET)
            .await?;
        let row = self
            .accessor
            .find_last_non_empty_row(spreadsheet_id, LEDGER_SHEET, DESCRIPTION_COL, FIRST_ENTRY_ROW)
            .await?;
        let entry = self.entry_at(spreadsheet_id, row).await?;
        debug!("removing row {row}: {entry}");
        self.accessor
            .delete_row(spreadsheet_id, sheet_id, row)
            .await?;
        Ok(entry)
    }

    /// Reads the most recent entry without touching it.
    pub async fn last_entry(&mut self, spreadsheet_id: &str) -> Result<Entry> {
        let row = self
            .accessor
            .find_last_non_empty_row(spreadsheet_id, LEDGER_SHEET, DESCRIPTION_COL, FIRST_ENTRY_ROW)
            .await?;
        self.entry_at(spreadsheet_id, row).await
    }

    /// Full ledger validation: the spreadsheet must be reachable, report the
    /// same id, and contain every required sheet.
    pub async fn validate(&mut self, spreadsheet_id: &str) -> Result<()> {
        self.accessor.validate_identity(spreadsheet_id).await?;
        for required in [LEDGER_SHEET, CATEGORY_SHEET, RULE_SHEET] {
            match self.accessor.resolve_sheet_id(spreadsheet_id, required).await {
                Ok(_) => {}
                Err(Error::ResourceNotFound(_)) => {
                    return Err(Error::RequiredSheetNotFound(required.to_string()));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Appends a `(category, pattern)` row to the rule sheet, using the same
    /// find-empty/insert/write sequence as entry appends.
    pub async fn add_rule(
        &mut self,
        spreadsheet_id: &str,
        category: &str,
        pattern: &str,
    ) -> Result<()> {
        let category = category.trim();
        let pattern = pattern.trim();
        if category.is_empty() || pattern.is_empty() {
            return Err(Error::invalid_input("a rule needs a category and a pattern"));
        }

        let sheet_id = self
            .accessor
            .resolve_sheet_id(spreadsheet_id, RULE_SHEET)
            .await?;
        let row = self
            .accessor
            .find_first_empty_row(spreadsheet_id, RULE_SHEET, RULE_CATEGORY_COL, FIRST_ENTRY_ROW)
            .await?;
        self.accessor
            .insert_row(spreadsheet_id, sheet_id, row)
            .await?;
        self.accessor
            .write_cells(
                spreadsheet_id,
                &[SheetRange::new(
                    A1Range::row(RULE_SHEET, row, RULE_CATEGORY_COL, RULE_PATTERN_COL),
                    vec![vec![category.to_string(), pattern.to_string()]],
                )],
            )
            .await?;
        Ok(())
    }

    /// Fetches the category list and rule list once, as one snapshot for the
    /// duration of a single operation.
    async fn catalog(&mut self, spreadsheet_id: &str) -> Result<Catalog> {
        let category_rows = self
            .accessor
            .read_columns(
                spreadsheet_id,
                CATEGORY_SHEET,
                CATEGORY_NAME_COL,
                CATEGORY_NAME_COL,
                FIRST_ENTRY_ROW,
            )
            .await?;
        let rule_rows = self
            .accessor
            .read_columns(
                spreadsheet_id,
                RULE_SHEET,
                RULE_CATEGORY_COL,
                RULE_PATTERN_COL,
                FIRST_ENTRY_ROW,
            )
            .await?;
        Ok(Catalog::from_rows(&category_rows, &rule_rows))
    }

    /// Reconstructs the entry stored at `row`.
    async fn entry_at(&mut self, spreadsheet_id: &str, row: u32) -> Result<Entry> {
        let cells = self
            .accessor
            .read_row(spreadsheet_id, LEDGER_SHEET, row, DESCRIPTION_COL, SOURCE_COL)
            .await?
            .ok_or(Error::NoEntries)?;

        // Cell indexes are relative to DESCRIPTION_COL.
        fn cell(cells: &[String], col: usize) -> &str {
            cells
                .get(col - DESCRIPTION_COL)
                .map(String::as_str)
                .unwrap_or_default()
        }

        let amount = match Amount::parse(cell(&cells, AMOUNT_COL)) {
            Ok(amount) => amount,
            Err(_) => {
                // A half-written row (e.g. an append cancelled between insert
                // and write) has no recoverable amount.
                warn!("row {row} has an unreadable amount cell");
                Amount::default()
            }
        };

        Ok(Entry::new(
            cell(&cells, DESCRIPTION_COL),
            amount,
            cell(&cells, CATEGORY_COL),
        ))
    }
}

/// Builds the batched write for one entry row: description, category, a blank
/// exchange-rate cell, the amount, the computed-total formula, the entry date,
/// the creation timestamp and the source marker.
fn entry_row(row: u32, description: &str, amount: Amount, category: &str) -> SheetRange {
    let mut values = vec![String::new(); SOURCE_COL - DESCRIPTION_COL + 1];
    let mut set = |col: usize, value: String| values[col - DESCRIPTION_COL] = value;
    set(DESCRIPTION_COL, description.to_string());
    set(CATEGORY_COL, category.to_string());
    set(AMOUNT_COL, format!("{:.2}", amount.value()));
    set(TOTAL_COL, total_formula(row));
    set(DATE_COL, Local::now().date_naive().to_string());
    set(CREATED_COL, Utc::now().to_rfc3339());
    set(SOURCE_COL, ENTRY_SOURCE.to_string());
    SheetRange::new(
        A1Range::row(LEDGER_SHEET, row, DESCRIPTION_COL, SOURCE_COL),
        vec![values],
    )
}

/// The computed total falls back to the amount when the exchange-rate cell is
/// blank.
fn total_formula(row: u32) -> String {
    let rate = format!("{}{row}", crate::api::col_letters(RATE_COL));
    let amount = format!("{}{row}", crate::api::col_letters(AMOUNT_COL));
    format!("=IF(ISBLANK({rate}), {amount}, {amount}*{rate})")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TestSheet, TEST_SPREADSHEET_ID};

    fn seeded_engine() -> Engine {
        Engine::new(Box::new(TestSheet::seeded(TEST_SPREADSHEET_ID)))
    }

    /// A ledger with `n` entries, plus category and rule sheets.
    fn engine_with_entries(n: usize) -> Engine {
        let mut expense_rows = vec![vec![String::new(), "Description".to_string()]];
        for i in 0..n {
            expense_rows.push(vec![
                String::new(),
                format!("entry {i}"),
                String::new(),
                String::new(),
                "1.00".to_string(),
            ]);
        }
        let category_rows = vec![
            vec!["Category".to_string()],
            vec!["Food".to_string()],
            vec!["Transport".to_string()],
        ];
        let rule_rows = vec![
            vec!["Category".to_string(), "Pattern".to_string()],
            vec!["Food".to_string(), "coffee".to_string()],
        ];
        Engine::new(Box::new(TestSheet::new(
            TEST_SPREADSHEET_ID,
            vec![
                (LEDGER_SHEET.to_string(), expense_rows),
                (CATEGORY_SHEET.to_string(), category_rows),
                (RULE_SHEET.to_string(), rule_rows),
            ],
        )))
    }

    #[tokio::test]
    async fn test_append_lands_on_first_free_row() {
        // Entries through row 15; the append must land on row 16.
        let mut engine = engine_with_entries(14);
        let entry = engine
            .append_entry(TEST_SPREADSHEET_ID, "Coffee", "5,50", "")
            .await
            .unwrap();

        assert_eq!(entry.description, "Coffee");
        assert_eq!(entry.amount.to_string(), "5,50");
        assert_eq!(entry.category, "Food");

        let cells = engine
            .accessor
            .read_row(TEST_SPREADSHEET_ID, LEDGER_SHEET, 16, DESCRIPTION_COL, SOURCE_COL)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cells[0], "Coffee");
        assert_eq!(cells[1], "Food");
        assert_eq!(cells[AMOUNT_COL - DESCRIPTION_COL], "5.50");
        assert_eq!(
            cells[TOTAL_COL - DESCRIPTION_COL],
            "=IF(ISBLANK(D16), E16, E16*D16)"
        );
        assert_eq!(cells[SOURCE_COL - DESCRIPTION_COL], ENTRY_SOURCE);
    }

    #[tokio::test]
    async fn test_append_invalid_amount_writes_nothing() {
        let mut engine = engine_with_entries(2);
        let err = engine
            .append_entry(TEST_SPREADSHEET_ID, "Coffee", "5,5,0", "")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAmountFormat { .. }));

        // Row 4 must still be the free row.
        let row = engine
            .accessor
            .find_first_empty_row(TEST_SPREADSHEET_ID, LEDGER_SHEET, DESCRIPTION_COL, FIRST_ENTRY_ROW)
            .await
            .unwrap();
        assert_eq!(row, 4);
    }

    #[tokio::test]
    async fn test_append_with_valid_user_category_keeps_canonical_casing() {
        let mut engine = engine_with_entries(0);
        let entry = engine
            .append_entry(TEST_SPREADSHEET_ID, "Snack", "3,00", "food")
            .await
            .unwrap();
        assert_eq!(entry.category, "Food");
    }

    #[tokio::test]
    async fn test_append_with_unknown_user_category_is_uncategorized() {
        let mut engine = engine_with_entries(0);
        // "coffee" would rule-match Food, but the explicit bad category wins.
        let entry = engine
            .append_entry(TEST_SPREADSHEET_ID, "coffee beans", "3,00", "Fod")
            .await
            .unwrap();
        assert_eq!(entry.category, "");
    }

    #[tokio::test]
    async fn test_remove_last_returns_and_deletes() {
        let mut engine = seeded_engine();
        let removed = engine.remove_last_entry(TEST_SPREADSHEET_ID).await.unwrap();
        assert_eq!(removed.description, "Electric bill");
        assert_eq!(removed.amount.to_string(), "142,67");
        assert_eq!(removed.category, "Utilities");

        let last = engine.last_entry(TEST_SPREADSHEET_ID).await.unwrap();
        assert_eq!(last.description, "Bus ticket");
    }

    #[tokio::test]
    async fn test_remove_last_on_empty_ledger_deletes_nothing() {
        let mut engine = engine_with_entries(0);
        let err = engine.remove_last_entry(TEST_SPREADSHEET_ID).await.unwrap_err();
        assert!(matches!(err, Error::NoEntries));
    }

    #[tokio::test]
    async fn test_last_entry_does_not_delete() {
        let mut engine = seeded_engine();
        let first = engine.last_entry(TEST_SPREADSHEET_ID).await.unwrap();
        let second = engine.last_entry(TEST_SPREADSHEET_ID).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_validate_seeded_ledger() {
        let mut engine = seeded_engine();
        engine.validate(TEST_SPREADSHEET_ID).await.unwrap();
    }

    #[tokio::test]
    async fn test_validate_missing_required_sheet() {
        let mut engine = Engine::new(Box::new(TestSheet::new(
            TEST_SPREADSHEET_ID,
            vec![(LEDGER_SHEET.to_string(), Vec::new())],
        )));
        let err = engine.validate(TEST_SPREADSHEET_ID).await.unwrap_err();
        match err {
            Error::RequiredSheetNotFound(name) => assert_eq!(name, CATEGORY_SHEET),
            other => panic!("expected RequiredSheetNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_add_rule_appends_to_rule_sheet() {
        let mut engine = engine_with_entries(0);
        engine
            .add_rule(TEST_SPREADSHEET_ID, "Transport", "taxi")
            .await
            .unwrap();

        let entry = engine
            .append_entry(TEST_SPREADSHEET_ID, "taxi to the airport", "30,00", "")
            .await
            .unwrap();
        assert_eq!(entry.category, "Transport");
    }

    #[tokio::test]
    async fn test_add_rule_requires_both_fields() {
        let mut engine = engine_with_entries(0);
        let err = engine
            .add_rule(TEST_SPREADSHEET_ID, "Transport", "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
