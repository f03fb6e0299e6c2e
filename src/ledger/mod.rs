//! The ledger: a spreadsheet with a fixed set of sheets and a fixed column
//! layout per sheet. The layout is a contract, not per-user configuration.

mod accessor;
mod engine;

pub use accessor::Accessor;
pub use engine::Engine;

/// The sheet holding one row per expense entry.
pub(crate) const LEDGER_SHEET: &str = "Expenses";
/// The sheet holding the fixed category list (one name per row, column A).
pub(crate) const CATEGORY_SHEET: &str = "Categories";
/// The sheet holding categorization rules (category in A, pattern in B).
pub(crate) const RULE_SHEET: &str = "Rules";

/// Row 1 is the header; entries start at row 2.
pub(crate) const FIRST_ENTRY_ROW: u32 = 2;

// Ledger sheet columns, 0-based. Column A is unused.
pub(crate) const DESCRIPTION_COL: usize = 1; // B
pub(crate) const CATEGORY_COL: usize = 2; // C
pub(crate) const RATE_COL: usize = 3; // D, user-maintained exchange rate
pub(crate) const AMOUNT_COL: usize = 4; // E
pub(crate) const TOTAL_COL: usize = 5; // F, formula
pub(crate) const DATE_COL: usize = 6; // G
pub(crate) const CREATED_COL: usize = 7; // H
pub(crate) const SOURCE_COL: usize = 8; // I

// Rule sheet columns.
pub(crate) const RULE_CATEGORY_COL: usize = 0; // A
pub(crate) const RULE_PATTERN_COL: usize = 1; // B

// Category sheet column.
pub(crate) const CATEGORY_NAME_COL: usize = 0; // A
