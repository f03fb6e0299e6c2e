//! Row- and sheet-level operations against one spreadsheet.
//!
//! This sits directly on the `SheetsApi` boundary and adds the addressing
//! conventions the engine needs: sheet-id resolution, row scans, row
//! insertion/deletion and batched writes.

use crate::api::{A1Range, SheetRange, SheetsApi};
use crate::error::{Error, Result};
use tracing::debug;

/// Low-level ledger operations. Owns the backend client; everything above
/// this type addresses cells by sheet name, column index and 1-based row.
pub struct Accessor {
    api: Box<dyn SheetsApi + Send>,
}

impl Accessor {
    pub fn new(api: Box<dyn SheetsApi + Send>) -> Self {
        Self { api }
    }

    /// Resolves a sheet title to its numeric id. Fails `ResourceNotFound`
    /// when the spreadsheet is unreachable or no sheet carries that title.
    pub async fn resolve_sheet_id(
        &mut self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<i64> {
        let meta = self.api.metadata(spreadsheet_id).await?;
        meta.sheets
            .iter()
            .find(|sheet| sheet.title == sheet_name)
            .map(|sheet| sheet.sheet_id)
            .ok_or_else(|| Error::not_found(format!("sheet '{sheet_name}'")))
    }

    /// Scans `column` from `start_row` and returns the 1-based index of the
    /// first row whose cell is blank, or `start_row + count` when every read
    /// row is populated.
    ///
    /// This is a linear scan over an unbounded range, with no locking: two
    /// concurrent callers can compute the same row and the later write wins.
    /// The transport is expected to serialize messages per conversation.
    pub async fn find_first_empty_row(
        &mut self,
        spreadsheet_id: &str,
        sheet_name: &str,
        column: usize,
        start_row: u32,
    ) -> Result<u32> {
        let range = A1Range::column(sheet_name, column, start_row);
        let rows = self.api.read_range(spreadsheet_id, &range).await?;
        for (ix, cells) in rows.iter().enumerate() {
            let blank = cells.first().map(|c| c.trim().is_empty()).unwrap_or(true);
            if blank {
                return Ok(start_row + ix as u32);
            }
        }
        Ok(start_row + rows.len() as u32)
    }

    /// The last populated row in `column`, or `NoEntries` when the column is
    /// empty from `start_row` on.
    pub async fn find_last_non_empty_row(
        &mut self,
        spreadsheet_id: &str,
        sheet_name: &str,
        column: usize,
        start_row: u32,
    ) -> Result<u32> {
        let first_empty = self
            .find_first_empty_row(spreadsheet_id, sheet_name, column, start_row)
            .await?;
        if first_empty <= start_row {
            return Err(Error::NoEntries);
        }
        Ok(first_empty - 1)
    }

    /// Inserts a blank row at `row`, shifting `row` and below down by one.
    pub async fn insert_row(&mut self, spreadsheet_id: &str, sheet_id: i64, row: u32) -> Result<()> {
        debug!("inserting row {row} into sheet {sheet_id}");
        self.api.insert_row(spreadsheet_id, sheet_id, row).await
    }

    /// Deletes `row`, shifting subsequent rows up.
    pub async fn delete_row(&mut self, spreadsheet_id: &str, sheet_id: i64, row: u32) -> Result<()> {
        debug!("deleting row {row} from sheet {sheet_id}");
        self.api.delete_row(spreadsheet_id, sheet_id, row).await
    }

    /// A single batched multi-range write.
    pub async fn write_cells(&mut self, spreadsheet_id: &str, updates: &[SheetRange]) -> Result<()> {
        self.api.write_ranges(spreadsheet_id, updates).await
    }

    /// Reads one row across `[start_col, end_col]`. `None` when the backend
    /// returns nothing for the range.
    pub async fn read_row(
        &mut self,
        spreadsheet_id: &str,
        sheet_name: &str,
        row: u32,
        start_col: usize,
        end_col: usize,
    ) -> Result<Option<Vec<String>>> {
        let range = A1Range::row(sheet_name, row, start_col, end_col);
        let mut rows = self.api.read_range(spreadsheet_id, &range).await?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(rows.remove(0)))
    }

    /// Reads a whole column range as rows, e.g. the category list.
    pub async fn read_columns(
        &mut self,
        spreadsheet_id: &str,
        sheet_name: &str,
        start_col: usize,
        end_col: usize,
        start_row: u32,
    ) -> Result<Vec<Vec<String>>> {
        let range = A1Range {
            sheet: sheet_name.to_string(),
            start_col,
            start_row,
            end_col,
            end_row: None,
        };
        self.api.read_range(spreadsheet_id, &range).await
    }

    /// Checks that `spreadsheet_id` names a reachable spreadsheet whose
    /// backend-reported id matches. A blank id is `InvalidInput`; an
    /// unreachable spreadsheet is `ResourceNotFound`.
    pub async fn validate_identity(&mut self, spreadsheet_id: &str) -> Result<()> {
        if spreadsheet_id.trim().is_empty() {
            return Err(Error::invalid_input("spreadsheet id is blank"));
        }
        let meta = self.api.metadata(spreadsheet_id).await?;
        if meta.spreadsheet_id != spreadsheet_id {
            return Err(Error::invalid_input(format!(
                "spreadsheet reports id '{}' instead of '{spreadsheet_id}'",
                meta.spreadsheet_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{TestSheet, TEST_SPREADSHEET_ID};
    use crate::ledger::{DESCRIPTION_COL, FIRST_ENTRY_ROW, LEDGER_SHEET};

    fn ledger_with_rows(n: usize) -> Accessor {
        let mut rows = vec![vec![String::new(), "Description".to_string()]];
        for i in 0..n {
            rows.push(vec![String::new(), format!("entry {i}")]);
        }
        Accessor::new(Box::new(TestSheet::new(
            TEST_SPREADSHEET_ID,
            vec![(LEDGER_SHEET.to_string(), rows)],
        )))
    }

    #[tokio::test]
    async fn test_first_empty_row_is_start_plus_count() {
        // Entries fill [2, 2+14), i.e. rows 2..=15; the next free row is 16.
        let mut accessor = ledger_with_rows(14);
        let row = accessor
            .find_first_empty_row(
                TEST_SPREADSHEET_ID,
                LEDGER_SHEET,
                DESCRIPTION_COL,
                FIRST_ENTRY_ROW,
            )
            .await
            .unwrap();
        assert_eq!(row, 16);
    }

    #[tokio::test]
    async fn test_first_empty_row_on_empty_ledger_is_start() {
        let mut accessor = ledger_with_rows(0);
        let row = accessor
            .find_first_empty_row(
                TEST_SPREADSHEET_ID,
                LEDGER_SHEET,
                DESCRIPTION_COL,
                FIRST_ENTRY_ROW,
            )
            .await
            .unwrap();
        assert_eq!(row, FIRST_ENTRY_ROW);
    }

    #[tokio::test]
    async fn test_first_empty_row_finds_gap() {
        let rows = vec![
            vec![String::new(), "Description".to_string()],
            vec![String::new(), "entry".to_string()],
            vec![String::new(), String::new()],
            vec![String::new(), "later entry".to_string()],
        ];
        let mut accessor = Accessor::new(Box::new(TestSheet::new(
            TEST_SPREADSHEET_ID,
            vec![(LEDGER_SHEET.to_string(), rows)],
        )));
        let row = accessor
            .find_first_empty_row(
                TEST_SPREADSHEET_ID,
                LEDGER_SHEET,
                DESCRIPTION_COL,
                FIRST_ENTRY_ROW,
            )
            .await
            .unwrap();
        assert_eq!(row, 3);
    }

    #[tokio::test]
    async fn test_last_non_empty_row() {
        let mut accessor = ledger_with_rows(3);
        let row = accessor
            .find_last_non_empty_row(
                TEST_SPREADSHEET_ID,
                LEDGER_SHEET,
                DESCRIPTION_COL,
                FIRST_ENTRY_ROW,
            )
            .await
            .unwrap();
        assert_eq!(row, 4);
    }

    #[tokio::test]
    async fn test_last_non_empty_row_empty_ledger_is_no_entries() {
        let mut accessor = ledger_with_rows(0);
        let err = accessor
            .find_last_non_empty_row(
                TEST_SPREADSHEET_ID,
                LEDGER_SHEET,
                DESCRIPTION_COL,
                FIRST_ENTRY_ROW,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoEntries));
    }

    #[tokio::test]
    async fn test_resolve_sheet_id() {
        let mut accessor = Accessor::new(Box::new(TestSheet::seeded(TEST_SPREADSHEET_ID)));
        let id = accessor
            .resolve_sheet_id(TEST_SPREADSHEET_ID, LEDGER_SHEET)
            .await
            .unwrap();
        assert_eq!(id, 0);
        let err = accessor
            .resolve_sheet_id(TEST_SPREADSHEET_ID, "Nope")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn test_validate_identity() {
        let mut accessor = Accessor::new(Box::new(TestSheet::seeded(TEST_SPREADSHEET_ID)));
        accessor.validate_identity(TEST_SPREADSHEET_ID).await.unwrap();

        let err = accessor.validate_identity("").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = accessor.validate_identity("unknown-id").await.unwrap_err();
        assert!(matches!(err, Error::ResourceNotFound(_)));
    }
}
