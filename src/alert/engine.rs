use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::rules::{AlertEventKind, AlertPolicy, AlertSeverity};
use crate::confidence::{ConfidenceReport, DriftSeverity};
use crate::diff::DiffReport;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertEvent {
    pub kind: AlertEventKind,
    pub severity: AlertSeverity,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertsReport {
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub alerts: Vec<AlertEvent>,
}

impl AlertsReport {
    pub fn new(generated_at: DateTime<Utc>, alerts: Vec<AlertEvent>) -> Self {
        Self {
            generated_at,
            alerts,
        }
    }

    pub fn has_critical(&self) -> bool {
        self.alerts
            .iter()
            .any(|alert| alert.severity == AlertSeverity::Critical)
    }
}

pub fn evaluate_alerts(
    diff: &DiffReport,
    confidence: Option<&ConfidenceReport>,
    policy: &AlertPolicy,
) -> Vec<AlertEvent> {
    let mut events = Vec::new();

    for change in &diff.price_changes {
        let (Some(old), Some(delta)) = (change.old_price_cents, change.delta_cents) else {
            continue;
        };
        if old <= 0 {
            continue;
        }
        let pct = delta as f64 / old as f64 * 100.0;
        if pct.abs() > policy.price_jump_pct {
            let new_price = change
                .new_price_cents
                .or_else(|| old.checked_add(delta))
                .map(|cents| cents.to_string())
                .unwrap_or_else(|| "?".to_string());
            events.push(AlertEvent {
                kind: AlertEventKind::PriceJump,
                severity: AlertSeverity::Critical,
                title: format!("Price jump on {}", change.identifier),
                body: format!(
                    "{} -> {} cents ({pct:+.1}%) between {} and {}",
                    old,
                    new_price,
                    diff.old_version,
                    diff.new_version
                ),
            });
        }
    }

    let removed_ratio = diff.summary.removed as f64 / diff.summary.old_tracked.max(1) as f64;
    if diff.summary.removed > 0 && removed_ratio > policy.mass_removal_ratio {
        events.push(AlertEvent {
            kind: AlertEventKind::MassRemoval,
            severity: AlertSeverity::Critical,
            title: format!("{} items removed", diff.summary.removed),
            body: format!(
                "{:.0}% of tracked items disappeared in {}",
                removed_ratio * 100.0,
                diff.new_version
            ),
        });
    }

    if diff.summary.added > 0 {
        events.push(AlertEvent {
            kind: AlertEventKind::ItemsAdded,
            severity: AlertSeverity::Info,
            title: format!("{} items added", diff.summary.added),
            body: format!("New items in {}", diff.new_version),
        });
    }
    if diff.summary.removed > 0 {
        events.push(AlertEvent {
            kind: AlertEventKind::ItemsRemoved,
            severity: AlertSeverity::Info,
            title: format!("{} items removed", diff.summary.removed),
            body: format!("Items missing from {}", diff.new_version),
        });
    }

    if let Some(report) = confidence {
        if report.score < policy.low_confidence {
            events.push(AlertEvent {
                kind: AlertEventKind::LowConfidence,
                severity: AlertSeverity::Warning,
                title: format!("Low menu confidence ({:.2})", report.score),
                body: format!(
                    "{} of {} items flagged, {} merged",
                    report.metrics.flagged_items,
                    report.metrics.total_items,
                    report.metrics.merged_items
                ),
            });
        }
        if report.drift.severity != DriftSeverity::None {
            events.push(AlertEvent {
                kind: AlertEventKind::DriftDetected,
                severity: if report.drift.severity == DriftSeverity::High {
                    AlertSeverity::Critical
                } else {
                    AlertSeverity::Warning
                },
                title: format!("Menu drift: {}", report.drift.severity),
                body: format!(
                    "{} added, {} removed, {} price changes",
                    report.drift.added_count,
                    report.drift.removed_count,
                    report.drift.price_change_count
                ),
            });
        }
    }

    events
}
