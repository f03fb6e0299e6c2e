//! A single expense entry, as it lives in one row of the ledger sheet.

use crate::model::Amount;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One ledger row at a point in time. Entries have no stored key; their
/// identity is the row they occupy.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Entry {
    pub description: String,
    pub amount: Amount,
    /// Resolved category; empty means uncategorized.
    pub category: String,
}

impl Entry {
    pub fn new(description: impl Into<String>, amount: Amount, category: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            amount,
            category: category.into(),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.category.is_empty() {
            write!(f, "{} - {}", self.description, self.amount)
        } else {
            write!(f, "{} - {} ({})", self.description, self.amount, self.category)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_and_without_category() {
        let amount = Amount::parse("5,50").unwrap();
        let with = Entry::new("Coffee", amount, "Food");
        assert_eq!(with.to_string(), "Coffee - 5,50 (Food)");
        let without = Entry::new("Coffee", amount, "");
        assert_eq!(without.to_string(), "Coffee - 5,50");
    }
}
