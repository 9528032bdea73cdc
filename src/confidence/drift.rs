use std::collections::BTreeMap;

use crate::confidence::{DriftDetails, DriftPolicy, DriftPriceChange, DriftReport};
use crate::menu::MenuItem;

/// Classifies how far `current` has moved from `previous`, matching items by
/// normalized name. Items are never matched by identifier here, so an item
/// that is invisible to the snapshot diff can still register as drift.
pub fn detect_drift(
    current: &[MenuItem],
    previous: Option<&[MenuItem]>,
    policy: &DriftPolicy,
) -> DriftReport {
    let Some(previous) = previous else {
        return DriftReport::default();
    };

    let current_map = index_by_name(current);
    let previous_map = index_by_name(previous);

    let added: Vec<&MenuItem> = current_map
        .iter()
        .filter(|(name, _)| !previous_map.contains_key(*name))
        .map(|(_, item)| *item)
        .collect();
    let removed: Vec<&MenuItem> = previous_map
        .iter()
        .filter(|(name, _)| !current_map.contains_key(*name))
        .map(|(_, item)| *item)
        .collect();

    let mut changed = Vec::new();
    for (name, item) in &current_map {
        let Some(before) = previous_map.get(name) else {
            continue;
        };
        if let (Some(old_price), Some(new_price)) = (before.price_cents, item.price_cents) {
            if old_price != new_price {
                changed.push(DriftPriceChange {
                    name: label(item, name),
                    old_price,
                    new_price,
                    delta_cents: new_price.saturating_sub(old_price),
                });
            }
        }
    }

    let change_count = added.len() + removed.len() + changed.len();
    let denominator = previous.len().max(1) as f64;
    let severity = policy.classify(change_count as f64 / denominator);

    let limit = policy.detail_limit;
    DriftReport {
        severity,
        added_count: added.len(),
        removed_count: removed.len(),
        price_change_count: changed.len(),
        details: DriftDetails {
            added: added
                .iter()
                .take(limit)
                .map(|item| label(item, &item.normalized_name()))
                .collect(),
            removed: removed
                .iter()
                .take(limit)
                .map(|item| label(item, &item.normalized_name()))
                .collect(),
            changed: changed.into_iter().take(limit).collect(),
        },
    }
}

fn index_by_name(items: &[MenuItem]) -> BTreeMap<String, &MenuItem> {
    let mut map = BTreeMap::new();
    for item in items {
        map.insert(item.normalized_name(), item);
    }
    map
}

fn label(item: &MenuItem, key: &str) -> String {
    let name = item.display_name();
    if name.is_empty() {
        key.to_string()
    } else {
        name
    }
}
