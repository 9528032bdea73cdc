pub mod differ;

use serde::{Deserialize, Serialize};

use crate::menu::MenuItem;

pub use differ::{diff_snapshots, textual_diff};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiffReport {
    pub old_version: String,
    pub new_version: String,
    pub added_items: Vec<MenuItem>,
    pub removed_items: Vec<MenuItem>,
    pub price_changes: Vec<PriceChange>,
    pub category_changes: Vec<CategoryChange>,
    pub has_changes: bool,
    pub summary: DiffSummary,
}

impl DiffReport {
    pub fn change_count(&self) -> usize {
        self.added_items.len()
            + self.removed_items.len()
            + self.price_changes.len()
            + self.category_changes.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PriceChange {
    pub identifier: String,
    pub old_price_cents: Option<i64>,
    pub new_price_cents: Option<i64>,
    /// `new - old`; absent when either side has no price or the difference
    /// does not fit in an `i64`.
    pub delta_cents: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryChange {
    pub identifier: String,
    pub old_category: Option<String>,
    pub new_category: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub price_changed: usize,
    pub category_changed: usize,
    /// Identifier-bearing items on each side; older reports lack these.
    #[serde(default)]
    pub old_tracked: usize,
    #[serde(default)]
    pub new_tracked: usize,
}
