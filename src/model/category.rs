//! Category catalog and the entry categorization decision.
//!
//! The catalog is built from two sheets: a fixed list of category names and an
//! ordered list of description-pattern rules. It is fetched once per ledger
//! operation and passed down so that one operation never sees two different
//! versions of the sheet data.

use serde::{Deserialize, Serialize};

/// One row from the Rules sheet: entries whose description contains `pattern`
/// (case-insensitive) belong to `category`. Sheet order is significant, the
/// first matching rule wins.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoryRule {
    pub category: String,
    pub pattern: String,
}

impl CategoryRule {
    pub fn new(category: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            pattern: pattern.into(),
        }
    }
}

/// A snapshot of the category list and rule list.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    categories: Vec<String>,
    rules: Vec<CategoryRule>,
}

impl Catalog {
    pub fn new(categories: Vec<String>, rules: Vec<CategoryRule>) -> Self {
        Self { categories, rules }
    }

    /// Builds a catalog from raw sheet rows: category names from the first
    /// column of `category_rows`, rules from the first two columns of
    /// `rule_rows`. Blank rows and rules missing either field are skipped.
    pub fn from_rows(category_rows: &[Vec<String>], rule_rows: &[Vec<String>]) -> Self {
        let categories = category_rows
            .iter()
            .filter_map(|row| row.first())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        let rules = rule_rows
            .iter()
            .filter_map(|row| match (row.first(), row.get(1)) {
                (Some(category), Some(pattern))
                    if !category.trim().is_empty() && !pattern.trim().is_empty() =>
                {
                    Some(CategoryRule::new(category.trim(), pattern.trim()))
                }
                _ => None,
            })
            .collect();

        Self { categories, rules }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Decides the category for an entry.
    ///
    /// A non-empty `user_category` is matched case-insensitively against the
    /// fixed list and, when found, the list's canonical casing is returned.
    /// When it is not in the list the result is empty: an invalid explicit
    /// category means "uncategorized", the rules are not consulted.
    ///
    /// With no `user_category`, the first rule whose pattern is a
    /// case-insensitive substring of the trimmed description wins.
    pub fn resolve(&self, user_category: &str, description: &str) -> String {
        let description = description.trim().to_lowercase();

        let user_category = user_category.trim();
        if !user_category.is_empty() {
            let wanted = user_category.to_lowercase();
            return self
                .categories
                .iter()
                .find(|name| name.to_lowercase() == wanted)
                .cloned()
                .unwrap_or_default();
        }

        self.rules
            .iter()
            .find(|rule| description.contains(&rule.pattern.to_lowercase()))
            .map(|rule| rule.category.clone())
            .unwrap_or_default()
    }
}
