use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::confidence::{ConfidenceReport, DriftSeverity};
use crate::scheduler::{
    PlanMetrics, RefreshDecision, SchedulerPlan, SchedulerPolicy, Tier, TierTimes,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshScheduler {
    policy: SchedulerPolicy,
}

impl RefreshScheduler {
    pub fn new(policy: SchedulerPolicy) -> Self {
        Self { policy }
    }

    pub fn plan(
        &self,
        confidence: &ConfidenceReport,
        critical_alerts_present: bool,
        diff_available: bool,
        last_runs: TierTimes,
        now: DateTime<Utc>,
    ) -> SchedulerPlan {
        let mut reasons = Vec::new();
        let candidate = self.candidate_decision(
            confidence,
            critical_alerts_present,
            &last_runs,
            &mut reasons,
        );
        let decision = self.apply_intervals(candidate, &last_runs, now, &mut reasons);
        info!("refresh decision: {decision} ({} reasons)", reasons.len());

        SchedulerPlan {
            decision,
            reasons,
            metrics: PlanMetrics {
                confidence: confidence.score,
                drift_severity: confidence.drift.severity,
                critical_alerts: critical_alerts_present,
                diff_available,
                total_items: confidence.metrics.total_items,
                flagged_items: confidence.metrics.flagged_items,
            },
            last_runs,
            next_eligible_runs: TierTimes::new(
                self.next_eligible(last_runs.tier1, Tier::Tier1),
                self.next_eligible(last_runs.tier2, Tier::Tier2),
            ),
            generated_at: now,
        }
    }

    fn next_eligible(&self, last: Option<DateTime<Utc>>, tier: Tier) -> Option<DateTime<Utc>> {
        last.and_then(|at| at.checked_add_signed(self.policy.min_interval(tier)))
    }

    /// Rule table, highest priority first; the first matching rule decides.
    fn candidate_decision(
        &self,
        confidence: &ConfidenceReport,
        critical_alerts_present: bool,
        last_runs: &TierTimes,
        reasons: &mut Vec<String>,
    ) -> RefreshDecision {
        let score = confidence.score;
        let severity = confidence.drift.severity;
        let policy = &self.policy;

        if last_runs.tier1.is_none() && last_runs.tier2.is_none() {
            reasons.push("initial run required: neither tier has run before".to_string());
            return RefreshDecision::RunTier1AndTier2;
        }

        let decision = if critical_alerts_present {
            reasons.push("critical alerts present; running tier1 and tier2".to_string());
            RefreshDecision::RunTier1AndTier2
        } else if severity == DriftSeverity::High {
            reasons.push("high drift severity; escalating to tier1 and tier2".to_string());
            RefreshDecision::RunTier1AndTier2
        } else if score < policy.low_confidence {
            reasons.push(format!(
                "confidence {score:.2} below {:.2}; running tier1 only",
                policy.low_confidence
            ));
            RefreshDecision::RunTier1Only
        } else if score < policy.high_confidence {
            reasons.push(format!(
                "confidence {score:.2} between {:.2} and {:.2}; running tier2 only",
                policy.low_confidence, policy.high_confidence
            ));
            RefreshDecision::RunTier2Only
        } else if severity == DriftSeverity::None {
            reasons.push(format!(
                "confidence {score:.2} at or above {:.2} with no drift; reusing cache",
                policy.high_confidence
            ));
            RefreshDecision::ReuseCache
        } else {
            reasons.push(format!(
                "confidence {score:.2} at or above {:.2} but drift severity is {severity}; running tier2 only",
                policy.high_confidence
            ));
            RefreshDecision::RunTier2Only
        };
        debug!("candidate decision: {decision}");
        decision
    }

    fn apply_intervals(
        &self,
        candidate: RefreshDecision,
        last_runs: &TierTimes,
        now: DateTime<Utc>,
        reasons: &mut Vec<String>,
    ) -> RefreshDecision {
        let mut blocked: Vec<(Tier, String)> = Vec::new();
        for tier in Tier::ALL {
            if !candidate.runs(tier) {
                continue;
            }
            let Some(last) = last_runs.get(tier) else {
                continue;
            };
            let elapsed = now - last;
            if elapsed < self.policy.min_interval(tier) {
                blocked.push((
                    tier,
                    format!(
                        "{tier} last ran {:.1} days ago (minimum interval {} days)",
                        elapsed.num_seconds() as f64 / 86_400.0,
                        self.policy.interval_days(tier)
                    ),
                ));
            }
        }
        if blocked.is_empty() {
            return candidate;
        }

        let is_blocked = |tier: Tier| blocked.iter().any(|(t, _)| *t == tier);
        let downgraded = RefreshDecision::from_tiers(
            candidate.runs(Tier::Tier1) && !is_blocked(Tier::Tier1),
            candidate.runs(Tier::Tier2) && !is_blocked(Tier::Tier2),
        );
        let detail = blocked
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        reasons.push(format!(
            "{detail}; downgrading {candidate} to {downgraded}"
        ));
        downgraded
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::RefreshScheduler;
    use crate::confidence::{ConfidenceReport, DriftReport, DriftSeverity, Metrics};
    use crate::scheduler::{RefreshDecision, SchedulerPolicy, TierTimes};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> Option<DateTime<Utc>> {
        Some(now() - Duration::days(days))
    }

    fn report(score: f64, severity: DriftSeverity) -> ConfidenceReport {
        ConfidenceReport {
            score,
            metrics: Metrics {
                total_items: 10,
                ..Metrics::default()
            },
            drift: DriftReport {
                severity,
                ..DriftReport::default()
            },
        }
    }

    fn eligible_runs() -> TierTimes {
        TierTimes::new(days_ago(30), days_ago(30))
    }

    #[test]
    fn first_run_overrides_everything() {
        let plan = RefreshScheduler::default().plan(
            &report(0.99, DriftSeverity::None),
            true,
            true,
            TierTimes::default(),
            now(),
        );
        assert_eq!(plan.decision, RefreshDecision::RunTier1AndTier2);
        assert_eq!(plan.reasons.len(), 1);
        assert!(plan.reasons[0].starts_with("initial run required"));
        assert_eq!(plan.next_eligible_runs, TierTimes::default());
    }

    #[test]
    fn one_tier_history_is_not_an_initial_run() {
        let plan = RefreshScheduler::default().plan(
            &report(0.95, DriftSeverity::None),
            false,
            true,
            TierTimes::new(None, days_ago(10)),
            now(),
        );
        assert_eq!(plan.decision, RefreshDecision::ReuseCache);
        assert!(plan.reasons[0].contains("reusing cache"));
    }

    #[test]
    fn critical_alerts_beat_high_confidence() {
        let plan = RefreshScheduler::default().plan(
            &report(0.95, DriftSeverity::None),
            true,
            true,
            eligible_runs(),
            now(),
        );
        assert_eq!(plan.decision, RefreshDecision::RunTier1AndTier2);
        assert_eq!(plan.reasons, vec!["critical alerts present; running tier1 and tier2"]);
    }

    #[test]
    fn high_drift_escalates_to_both_tiers() {
        let plan = RefreshScheduler::default().plan(
            &report(0.95, DriftSeverity::High),
            false,
            true,
            eligible_runs(),
            now(),
        );
        assert_eq!(plan.decision, RefreshDecision::RunTier1AndTier2);
        assert!(plan.reasons[0].starts_with("high drift severity"));
    }

    #[test]
    fn confidence_bands_pick_tiers() {
        let scheduler = RefreshScheduler::default();
        let cases = [
            (0.10, DriftSeverity::None, RefreshDecision::RunTier1Only, "below 0.40"),
            (0.39, DriftSeverity::Medium, RefreshDecision::RunTier1Only, "below 0.40"),
            (0.40, DriftSeverity::None, RefreshDecision::RunTier2Only, "between 0.40 and 0.70"),
            (0.69, DriftSeverity::Low, RefreshDecision::RunTier2Only, "between 0.40 and 0.70"),
            (0.70, DriftSeverity::None, RefreshDecision::ReuseCache, "no drift"),
            (0.85, DriftSeverity::Low, RefreshDecision::RunTier2Only, "drift severity is low"),
            (0.85, DriftSeverity::Medium, RefreshDecision::RunTier2Only, "drift severity is medium"),
        ];
        for (score, severity, expected, fragment) in cases {
            let plan = scheduler.plan(&report(score, severity), false, true, eligible_runs(), now());
            assert_eq!(plan.decision, expected, "score {score} severity {severity}");
            assert_eq!(plan.reasons.len(), 1);
            assert!(plan.reasons[0].contains(fragment), "{:?}", plan.reasons);
        }
    }

    #[test]
    fn ineligible_tier1_downgrades_to_tier2_only() {
        let plan = RefreshScheduler::default().plan(
            &report(0.95, DriftSeverity::None),
            true,
            true,
            TierTimes::new(days_ago(3), days_ago(10)),
            now(),
        );
        assert_eq!(plan.decision, RefreshDecision::RunTier2Only);
        assert_eq!(plan.reasons.len(), 2);
        assert!(plan.reasons[0].starts_with("critical alerts present"));
        assert!(plan.reasons[1].contains("tier1 last ran 3.0 days ago (minimum interval 15 days)"));
        assert!(plan.reasons[1].contains("downgrading runTier1AndTier2 to runTier2Only"));
        assert!(!plan.reasons[1].contains("tier2 last ran"));
    }

    #[test]
    fn ineligible_tier2_downgrades_to_tier1_only() {
        let plan = RefreshScheduler::default().plan(
            &report(0.5, DriftSeverity::High),
            false,
            true,
            TierTimes::new(days_ago(20), days_ago(2)),
            now(),
        );
        assert_eq!(plan.decision, RefreshDecision::RunTier1Only);
        assert!(plan.reasons[1].contains("tier2 last ran 2.0 days ago (minimum interval 7 days)"));
    }

    #[test]
    fn both_tiers_ineligible_reuses_cache() {
        let plan = RefreshScheduler::default().plan(
            &report(0.5, DriftSeverity::None),
            true,
            false,
            TierTimes::new(days_ago(1), days_ago(1)),
            now(),
        );
        assert_eq!(plan.decision, RefreshDecision::ReuseCache);
        assert_eq!(plan.reasons.len(), 2);
        assert!(plan.reasons[1].contains("tier1 last ran"));
        assert!(plan.reasons[1].contains("tier2 last ran"));
        assert!(plan.reasons[1].ends_with("downgrading runTier1AndTier2 to reuseCache"));
    }

    #[test]
    fn single_tier_decisions_downgrade_to_cache() {
        let scheduler = RefreshScheduler::default();
        let tier1_only = scheduler.plan(
            &report(0.2, DriftSeverity::None),
            false,
            true,
            TierTimes::new(days_ago(5), days_ago(1)),
            now(),
        );
        assert_eq!(tier1_only.decision, RefreshDecision::ReuseCache);
        assert!(tier1_only.reasons[1].contains("downgrading runTier1Only to reuseCache"));

        let tier2_only = scheduler.plan(
            &report(0.5, DriftSeverity::None),
            false,
            true,
            TierTimes::new(days_ago(1), days_ago(6)),
            now(),
        );
        assert_eq!(tier2_only.decision, RefreshDecision::ReuseCache);
        assert!(tier2_only.reasons[1].contains("downgrading runTier2Only to reuseCache"));
    }

    #[test]
    fn interval_boundary_is_inclusive() {
        let plan = RefreshScheduler::default().plan(
            &report(0.2, DriftSeverity::None),
            false,
            true,
            TierTimes::new(days_ago(15), None),
            now(),
        );
        assert_eq!(plan.decision, RefreshDecision::RunTier1Only);
        assert_eq!(plan.reasons.len(), 1);
    }

    #[test]
    fn never_run_tier_is_always_eligible() {
        let plan = RefreshScheduler::default().plan(
            &report(0.5, DriftSeverity::None),
            false,
            true,
            TierTimes::new(days_ago(1), None),
            now(),
        );
        assert_eq!(plan.decision, RefreshDecision::RunTier2Only);
        assert_eq!(plan.next_eligible_runs.tier1, Some(now() + Duration::days(14)));
        assert_eq!(plan.next_eligible_runs.tier2, None);
    }

    #[test]
    fn alternate_policy_changes_thresholds() {
        let scheduler = RefreshScheduler::new(SchedulerPolicy {
            tier1_min_interval_days: 1,
            tier2_min_interval_days: 1,
            low_confidence: 0.6,
            high_confidence: 0.9,
        });
        let plan = scheduler.plan(
            &report(0.5, DriftSeverity::None),
            false,
            true,
            TierTimes::new(days_ago(2), days_ago(2)),
            now(),
        );
        assert_eq!(plan.decision, RefreshDecision::RunTier1Only);
    }

    #[test]
    fn plan_echoes_inputs() {
        let runs = TierTimes::new(days_ago(20), days_ago(8));
        let plan = RefreshScheduler::default().plan(
            &report(0.92, DriftSeverity::None),
            false,
            false,
            runs,
            now(),
        );
        assert_eq!(plan.last_runs, runs);
        assert!(!plan.metrics.diff_available);
        assert_eq!(plan.metrics.total_items, 10);
        assert_eq!(plan.generated_at, now());
    }

    #[test]
    fn oversized_interval_blocks_tier_without_overflow() {
        let scheduler = RefreshScheduler::new(SchedulerPolicy {
            tier1_min_interval_days: i64::MAX / 1000,
            ..SchedulerPolicy::default()
        });
        let plan = scheduler.plan(
            &report(0.92, DriftSeverity::None),
            true,
            true,
            TierTimes::new(days_ago(400), days_ago(30)),
            now(),
        );
        assert_eq!(plan.decision, RefreshDecision::RunTier2Only);
        assert_eq!(plan.next_eligible_runs.tier1, None);
        assert_eq!(
            plan.next_eligible_runs.tier2,
            Some(now() - Duration::days(30) + Duration::days(7))
        );
    }
}
