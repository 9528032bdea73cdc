use std::collections::BTreeMap;

use similar::{ChangeTag, TextDiff};

use crate::diff::{CategoryChange, DiffReport, DiffSummary, PriceChange};
use crate::menu::MenuItem;
use crate::output::price_label;
use crate::snapshot::Snapshot;

/// Compares two snapshots by stable item identifier.
///
/// Items without an identifier cannot be tracked across snapshots and are
/// left out of every list. Output lists are ordered by identifier.
pub fn diff_snapshots(old: &Snapshot, new: &Snapshot) -> DiffReport {
    let old_map = index_by_identifier(&old.items);
    let new_map = index_by_identifier(&new.items);

    let mut added_items = Vec::new();
    let mut price_changes = Vec::new();
    let mut category_changes = Vec::new();

    for (id, new_item) in &new_map {
        let Some(old_item) = old_map.get(id) else {
            added_items.push((*new_item).clone());
            continue;
        };
        if old_item.price_cents != new_item.price_cents {
            price_changes.push(PriceChange {
                identifier: (*id).to_string(),
                old_price_cents: old_item.price_cents,
                new_price_cents: new_item.price_cents,
                delta_cents: match (old_item.price_cents, new_item.price_cents) {
                    (Some(before), Some(after)) => after.checked_sub(before),
                    _ => None,
                },
            });
        }
        if old_item.category != new_item.category {
            category_changes.push(CategoryChange {
                identifier: (*id).to_string(),
                old_category: old_item.category.clone(),
                new_category: new_item.category.clone(),
            });
        }
    }

    let removed_items: Vec<MenuItem> = old_map
        .iter()
        .filter(|(id, _)| !new_map.contains_key(*id))
        .map(|(_, item)| (*item).clone())
        .collect();

    let summary = DiffSummary {
        added: added_items.len(),
        removed: removed_items.len(),
        price_changed: price_changes.len(),
        category_changed: category_changes.len(),
        old_tracked: old_map.len(),
        new_tracked: new_map.len(),
    };
    let has_changes =
        summary.added + summary.removed + summary.price_changed + summary.category_changed > 0;

    DiffReport {
        old_version: old.version_id.clone(),
        new_version: new.version_id.clone(),
        added_items,
        removed_items,
        price_changes,
        category_changes,
        has_changes,
        summary,
    }
}

fn index_by_identifier(items: &[MenuItem]) -> BTreeMap<&str, &MenuItem> {
    let mut map = BTreeMap::new();
    for item in items {
        if let Some(id) = item.identifier.as_deref() {
            map.insert(id, item);
        }
    }
    map
}

pub fn textual_diff(old: &Snapshot, new: &Snapshot) -> String {
    let old_str = render_listing(&old.items);
    let new_str = render_listing(&new.items);
    let diff = TextDiff::from_lines(&old_str, &new_str);
    let mut out = String::new();
    for change in diff.iter_all_changes() {
        let symbol = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        out.push_str(symbol);
        out.push_str(change.value());
    }
    out
}

fn render_listing(items: &[MenuItem]) -> String {
    let mut lines: Vec<String> = items
        .iter()
        .map(|item| {
            format!(
                "{} | {} | {} | {}\n",
                item.identifier.as_deref().unwrap_or("-"),
                item.display_name(),
                price_label(item.price_cents),
                item.category.as_deref().unwrap_or("-"),
            )
        })
        .collect();
    lines.sort();
    lines.concat()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{TimeZone, Utc};

    use super::{diff_snapshots, textual_diff};
    use crate::menu::MenuItem;
    use crate::snapshot::Snapshot;

    fn snap(version: &str, items: Vec<MenuItem>) -> Snapshot {
        Snapshot::new(version, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), items)
    }

    fn item(id: &str, price: Option<i64>, category: Option<&str>) -> MenuItem {
        let mut item = MenuItem::new(format!("Item {id}")).with_identifier(id);
        item.price_cents = price;
        item.category = category.map(str::to_string);
        item
    }

    fn ids(items: &[MenuItem]) -> BTreeSet<String> {
        items.iter().filter_map(|i| i.identifier.clone()).collect()
    }

    #[test]
    fn detects_added_removed_and_changed_items() {
        let old = snap(
            "v1",
            vec![
                item("a", Some(500), Some("Mains")),
                item("b", Some(300), Some("Sides")),
                item("c", Some(200), Some("Drinks")),
            ],
        );
        let new = snap(
            "v2",
            vec![
                item("a", Some(550), Some("Mains")),
                item("c", Some(200), Some("drinks")),
                item("d", Some(900), Some("Mains")),
            ],
        );

        let report = diff_snapshots(&old, &new);
        assert_eq!(report.old_version, "v1");
        assert_eq!(report.new_version, "v2");
        assert_eq!(ids(&report.added_items), BTreeSet::from(["d".to_string()]));
        assert_eq!(ids(&report.removed_items), BTreeSet::from(["b".to_string()]));
        assert_eq!(report.price_changes.len(), 1);
        assert_eq!(report.price_changes[0].identifier, "a");
        assert_eq!(report.price_changes[0].delta_cents, Some(50));
        assert_eq!(report.category_changes.len(), 1);
        assert_eq!(report.category_changes[0].identifier, "c");
        assert_eq!(report.summary.added, 1);
        assert_eq!(report.summary.removed, 1);
        assert!(report.has_changes);
    }

    #[test]
    fn null_price_is_distinct_from_any_price() {
        let old = snap("v1", vec![item("a", None, None)]);
        let new = snap("v2", vec![item("a", Some(5), None)]);
        let report = diff_snapshots(&old, &new);
        assert_eq!(report.price_changes.len(), 1);
        assert_eq!(report.price_changes[0].old_price_cents, None);
        assert_eq!(report.price_changes[0].new_price_cents, Some(5));
        assert_eq!(report.price_changes[0].delta_cents, None);
    }

    #[test]
    fn items_without_identifier_are_ignored() {
        let old = snap("v1", vec![MenuItem::new("Ghost").with_price(100)]);
        let new = snap("v2", vec![MenuItem::new("Phantom").with_price(200)]);
        let report = diff_snapshots(&old, &new);
        assert!(!report.has_changes);
        assert_eq!(report.change_count(), 0);
    }

    #[test]
    fn diff_is_symmetric_in_added_and_removed() {
        let a = snap("a", vec![item("1", Some(1), None), item("2", Some(2), None)]);
        let b = snap("b", vec![item("2", Some(3), None), item("3", None, None)]);
        let forward = diff_snapshots(&a, &b);
        let backward = diff_snapshots(&b, &a);
        assert_eq!(ids(&forward.added_items), ids(&backward.removed_items));
        assert_eq!(ids(&forward.removed_items), ids(&backward.added_items));
    }

    #[test]
    fn diff_against_self_has_no_changes() {
        let a = snap(
            "a",
            vec![item("1", Some(1), Some("X")), item("2", None, None), MenuItem::new("anon")],
        );
        let report = diff_snapshots(&a, &a);
        assert!(!report.has_changes);
        assert_eq!(report.change_count(), 0);
        assert_eq!(report.summary.added + report.summary.removed, 0);
        assert_eq!(report.summary.price_changed + report.summary.category_changed, 0);
        assert_eq!((report.summary.old_tracked, report.summary.new_tracked), (2, 2));
    }

    #[test]
    fn extreme_price_moves_leave_delta_unset() {
        let old = snap("v1", vec![item("a", Some(i64::MIN), None), item("b", Some(100), None)]);
        let new = snap("v2", vec![item("a", Some(i64::MAX), None), item("b", Some(i64::MAX), None)]);
        let report = diff_snapshots(&old, &new);
        assert_eq!(report.price_changes.len(), 2);
        assert_eq!(report.price_changes[0].delta_cents, None);
        assert_eq!(report.price_changes[1].delta_cents, Some(i64::MAX - 100));
    }

    #[test]
    fn empty_snapshots_produce_empty_report() {
        let report = diff_snapshots(&snap("a", vec![]), &snap("b", vec![]));
        assert!(!report.has_changes);
    }

    #[test]
    fn has_changes_matches_list_lengths() {
        let old = snap("v1", vec![item("a", Some(1), Some("X"))]);
        let new = snap("v2", vec![item("a", Some(1), Some("Y"))]);
        let report = diff_snapshots(&old, &new);
        assert_eq!(report.has_changes, report.change_count() > 0);
        assert!(report.has_changes);
    }

    #[test]
    fn textual_diff_marks_changed_lines() {
        let old = snap("v1", vec![item("a", Some(500), None)]);
        let new = snap("v2", vec![item("a", Some(650), None)]);
        let text = textual_diff(&old, &new);
        assert!(text.contains("-a | Item a | 5.00"));
        assert!(text.contains("+a | Item a | 6.50"));
    }
}
