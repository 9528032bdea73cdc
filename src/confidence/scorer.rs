use tracing::debug;

use crate::confidence::drift::detect_drift;
use crate::confidence::metrics::compute_metrics;
use crate::confidence::{ConfidenceReport, DriftPolicy, Metrics, ScoringPolicy};
use crate::menu::AdjudicatedMenu;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceScorer {
    scoring: ScoringPolicy,
    drift: DriftPolicy,
}

impl ConfidenceScorer {
    pub fn new(scoring: ScoringPolicy, drift: DriftPolicy) -> Self {
        Self { scoring, drift }
    }

    pub fn score(
        &self,
        current: &AdjudicatedMenu,
        previous: Option<&AdjudicatedMenu>,
    ) -> ConfidenceReport {
        let metrics = compute_metrics(&current.items);
        let score = score_metrics(&metrics, &self.scoring);
        let drift = detect_drift(
            &current.items,
            previous.map(|menu| menu.items.as_slice()),
            &self.drift,
        );
        debug!(
            "scored {} items: score={score:.3} drift={}",
            metrics.total_items, drift.severity
        );
        ConfidenceReport {
            score,
            metrics,
            drift,
        }
    }
}

pub fn score_metrics(metrics: &Metrics, policy: &ScoringPolicy) -> f64 {
    if metrics.total_items == 0 {
        return 0.0;
    }
    let total = metrics.total_items as f64;
    let merged_ratio = metrics.merged_items as f64 / total;
    let flagged_ratio = metrics.flagged_items as f64 / total;
    let source_a_ratio = metrics.source_a_only_items as f64 / total;
    let source_b_ratio = metrics.source_b_only_items as f64 / total;

    let mut score = policy.base
        + merged_ratio * policy.merged_weight
        + (1.0 - flagged_ratio) * policy.low_flag_weight;
    if source_a_ratio > policy.imbalance_ratio {
        score -= policy.imbalance_penalty;
    }
    if source_b_ratio > policy.imbalance_ratio {
        score -= policy.imbalance_penalty;
    }
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::{score_metrics, ConfidenceScorer};
    use crate::confidence::{DriftSeverity, Metrics, ScoringPolicy};
    use crate::menu::{AdjudicatedMenu, MenuItem, SourceDecision};

    fn metrics(total: usize, merged: usize, flagged: usize, a_only: usize, b_only: usize) -> Metrics {
        Metrics {
            total_items: total,
            merged_items: merged,
            flagged_items: flagged,
            source_a_only_items: a_only,
            source_b_only_items: b_only,
            ..Metrics::default()
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_menu_scores_zero() {
        assert_eq!(score_metrics(&Metrics::default(), &ScoringPolicy::default()), 0.0);
    }

    #[test]
    fn reproduces_reference_scenario() {
        let score = score_metrics(&metrics(10, 8, 1, 1, 1), &ScoringPolicy::default());
        assert!(approx(score, 0.92), "score was {score}");
    }

    #[test]
    fn both_imbalance_penalties_can_fire() {
        // Custom ratio so both single-source shares exceed it at once.
        let policy = ScoringPolicy {
            imbalance_ratio: 0.3,
            ..ScoringPolicy::default()
        };
        let score = score_metrics(&metrics(10, 0, 0, 5, 5), &policy);
        assert!(approx(score, 0.5 + 0.2 - 0.2), "score was {score}");

        let default_policy = ScoringPolicy::default();
        let a_heavy = score_metrics(&metrics(10, 0, 0, 6, 4), &default_policy);
        assert!(approx(a_heavy, 0.5 + 0.2 - 0.1), "score was {a_heavy}");
    }

    #[test]
    fn score_stays_within_bounds() {
        let policy = ScoringPolicy::default();
        for total in 1..=12usize {
            for merged in 0..=total {
                for flagged in 0..=total {
                    for a_only in 0..=(total - merged) {
                        let b_only = total - merged - a_only;
                        let score =
                            score_metrics(&metrics(total, merged, flagged, a_only, b_only), &policy);
                        assert!((0.0..=1.0).contains(&score));
                    }
                }
            }
        }

        let harsh = ScoringPolicy {
            base: -2.0,
            ..ScoringPolicy::default()
        };
        assert_eq!(score_metrics(&metrics(4, 0, 4, 4, 0), &harsh), 0.0);
        let generous = ScoringPolicy {
            base: 3.0,
            ..ScoringPolicy::default()
        };
        assert_eq!(score_metrics(&metrics(4, 4, 0, 0, 0), &generous), 1.0);
    }

    #[test]
    fn more_merged_never_lowers_score_and_more_flags_never_raise_it() {
        let policy = ScoringPolicy::default();
        let total = 20;
        for merged in 0..total {
            let before = score_metrics(&metrics(total, merged, 3, 0, 0), &policy);
            let after = score_metrics(&metrics(total, merged + 1, 3, 0, 0), &policy);
            assert!(after >= before);
        }
        for flagged in 0..total {
            let before = score_metrics(&metrics(total, 10, flagged, 2, 2), &policy);
            let after = score_metrics(&metrics(total, 10, flagged + 1, 2, 2), &policy);
            assert!(after <= before);
        }
    }

    #[test]
    fn scorer_combines_metrics_and_drift() {
        let current = AdjudicatedMenu::new(vec![
            MenuItem::new("Soup").with_source(SourceDecision::Merged).with_price(500),
            MenuItem::new("Salad").with_source(SourceDecision::Merged).with_price(700),
        ]);
        let previous = AdjudicatedMenu::new(vec![
            MenuItem::new("Soup").with_price(450),
            MenuItem::new("Salad").with_price(700),
        ]);

        let report = ConfidenceScorer::default().score(&current, Some(&previous));
        assert!(approx(report.score, 1.0));
        assert_eq!(report.metrics.total_items, 2);
        assert_eq!(report.drift.price_change_count, 1);
        assert_eq!(report.drift.severity, DriftSeverity::High);
    }

    #[test]
    fn missing_previous_menu_means_no_drift() {
        let current = AdjudicatedMenu::new(vec![MenuItem::new("Soup")]);
        let report = ConfidenceScorer::default().score(&current, None);
        assert_eq!(report.drift.severity, DriftSeverity::None);
        assert_eq!(report.drift.change_count(), 0);
    }
}
