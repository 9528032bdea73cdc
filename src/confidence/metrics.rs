use crate::confidence::Metrics;
use crate::menu::{MenuItem, SourceDecision};

const UNKNOWN_CATEGORY: &str = "unknown";

pub fn compute_metrics(items: &[MenuItem]) -> Metrics {
    let mut metrics = Metrics {
        total_items: items.len(),
        ..Metrics::default()
    };

    for item in items {
        match item.source_decision {
            Some(SourceDecision::Merged) => metrics.merged_items += 1,
            Some(SourceDecision::SourceA) => metrics.source_a_only_items += 1,
            Some(SourceDecision::SourceB) => metrics.source_b_only_items += 1,
            None => {}
        }
        if item.is_flagged() {
            metrics.flagged_items += 1;
        }
        if item.price_cents.is_some() {
            metrics.items_with_price += 1;
        }
        if item.has_image() {
            metrics.items_with_image += 1;
        }
        let category = item.category.as_deref().unwrap_or(UNKNOWN_CATEGORY);
        *metrics.categories.entry(category.to_string()).or_insert(0) += 1;
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::compute_metrics;
    use crate::menu::{MenuItem, SourceDecision};

    #[test]
    fn tallies_sources_flags_and_coverage() {
        let items = vec![
            MenuItem::new("A")
                .with_source(SourceDecision::Merged)
                .with_price(100)
                .with_category("Mains")
                .with_image("https://img/a.png"),
            MenuItem::new("B")
                .with_source(SourceDecision::SourceA)
                .with_flag("price_mismatch")
                .with_category("Mains"),
            MenuItem::new("C").with_source(SourceDecision::SourceB).with_price(0),
            MenuItem::new("D").with_image("   "),
        ];

        let metrics = compute_metrics(&items);
        assert_eq!(metrics.total_items, 4);
        assert_eq!(metrics.merged_items, 1);
        assert_eq!(metrics.source_a_only_items, 1);
        assert_eq!(metrics.source_b_only_items, 1);
        assert_eq!(metrics.flagged_items, 1);
        assert_eq!(metrics.items_with_price, 2);
        assert_eq!(metrics.items_with_image, 1);
        assert_eq!(metrics.categories.get("Mains"), Some(&2));
        assert_eq!(metrics.categories.get("unknown"), Some(&2));
    }

    #[test]
    fn empty_menu_has_zero_metrics() {
        let metrics = compute_metrics(&[]);
        assert_eq!(metrics, Default::default());
    }
}
