use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::alert::{AlertEvent, AlertSeverity};
use crate::confidence::{ConfidenceReport, DriftSeverity};
use crate::diff::DiffReport;
use crate::output::price_label;
use crate::scheduler::{RefreshDecision, SchedulerPlan, SchedulerPolicy, Tier};
use crate::snapshot::{Snapshot, SnapshotEntry};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn render_versions_table(entries: &[SnapshotEntry]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Version", "Created At", "Items", "File"]);
    for entry in entries {
        table.add_row(vec![
            entry.version_id.clone(),
            entry.created_at.to_rfc3339(),
            entry.item_count.to_string(),
            entry.snapshot_filename.clone(),
        ]);
    }
    table.to_string()
}

pub fn render_snapshot_table(snapshot: &Snapshot) -> String {
    let mut table = new_table();
    table.set_header(vec!["Identifier", "Name", "Price", "Category", "Source", "Flags"]);
    for item in &snapshot.items {
        table.add_row(vec![
            item.identifier.clone().unwrap_or_else(|| "-".to_string()),
            item.display_name(),
            price_label(item.price_cents),
            item.category.clone().unwrap_or_else(|| "-".to_string()),
            item.source_decision
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
            item.flags.join(", "),
        ]);
    }
    format!(
        "{} ({} items, created {})\n{}",
        snapshot.version_id,
        snapshot.items.len(),
        snapshot.created_at.to_rfc3339(),
        table
    )
}

pub fn render_diff_table(report: &DiffReport) -> String {
    let mut table = new_table();
    table.set_header(vec!["Change", "Identifier", "Old", "New"]);

    for item in &report.added_items {
        table.add_row(Row::from(vec![
            Cell::new("ADDED").fg(Color::Green),
            Cell::new(item.identifier.clone().unwrap_or_default()),
            Cell::new("-"),
            Cell::new(format!("{} {}", item.display_name(), price_label(item.price_cents))),
        ]));
    }
    for item in &report.removed_items {
        table.add_row(Row::from(vec![
            Cell::new("REMOVED").fg(Color::Red),
            Cell::new(item.identifier.clone().unwrap_or_default()),
            Cell::new(format!("{} {}", item.display_name(), price_label(item.price_cents))),
            Cell::new("-"),
        ]));
    }
    for change in &report.price_changes {
        table.add_row(Row::from(vec![
            Cell::new("PRICE").fg(Color::Yellow),
            Cell::new(change.identifier.clone()),
            Cell::new(price_label(change.old_price_cents)),
            Cell::new(price_label(change.new_price_cents)),
        ]));
    }
    for change in &report.category_changes {
        table.add_row(Row::from(vec![
            Cell::new("CATEGORY").fg(Color::Cyan),
            Cell::new(change.identifier.clone()),
            Cell::new(change.old_category.clone().unwrap_or_else(|| "-".to_string())),
            Cell::new(change.new_category.clone().unwrap_or_else(|| "-".to_string())),
        ]));
    }

    format!(
        "{}\n{} -> {}: {} added, {} removed, {} price changes, {} category changes",
        table,
        report.old_version,
        report.new_version,
        report.summary.added,
        report.summary.removed,
        report.summary.price_changed,
        report.summary.category_changed
    )
}

pub fn render_confidence_table(report: &ConfidenceReport, bands: &SchedulerPolicy) -> String {
    let metrics = &report.metrics;
    let mut table = new_table();
    table.set_header(vec!["Metric", "Value"]);
    let score_cell =
        Cell::new(format!("{:.3}", report.score)).fg(score_color(report.score, bands));
    table.add_row(Row::from(vec![Cell::new("Confidence"), score_cell]));
    table.add_row(vec!["Total items".to_string(), metrics.total_items.to_string()]);
    table.add_row(vec!["Merged".to_string(), metrics.merged_items.to_string()]);
    table.add_row(vec![
        "Source A only".to_string(),
        metrics.source_a_only_items.to_string(),
    ]);
    table.add_row(vec![
        "Source B only".to_string(),
        metrics.source_b_only_items.to_string(),
    ]);
    table.add_row(vec!["Flagged".to_string(), metrics.flagged_items.to_string()]);
    table.add_row(vec!["With price".to_string(), metrics.items_with_price.to_string()]);
    table.add_row(vec!["With image".to_string(), metrics.items_with_image.to_string()]);
    table.add_row(Row::from(vec![
        Cell::new("Drift"),
        drift_cell(report.drift.severity),
    ]));
    table.add_row(vec![
        "Drift changes".to_string(),
        format!(
            "+{} / -{} / {} price",
            report.drift.added_count, report.drift.removed_count, report.drift.price_change_count
        ),
    ]);
    table.to_string()
}

fn score_color(score: f64, bands: &SchedulerPolicy) -> Color {
    if score >= bands.high_confidence {
        Color::Green
    } else if score >= bands.low_confidence {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn drift_cell(severity: DriftSeverity) -> Cell {
    let cell = Cell::new(severity.to_string().to_uppercase());
    match severity {
        DriftSeverity::None => cell.fg(Color::Green),
        DriftSeverity::Low => cell,
        DriftSeverity::Medium => cell.fg(Color::Yellow),
        DriftSeverity::High => cell.fg(Color::Red),
    }
}

pub fn render_alerts_table(events: &[AlertEvent]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Severity", "Kind", "Title", "Detail"]);
    for event in events {
        let severity = Cell::new(event.severity.to_string().to_uppercase());
        let severity = match event.severity {
            AlertSeverity::Critical => severity.fg(Color::Red),
            AlertSeverity::Warning => severity.fg(Color::Yellow),
            AlertSeverity::Info => severity,
        };
        table.add_row(Row::from(vec![
            severity,
            Cell::new(format!("{:?}", event.kind)),
            Cell::new(event.title.clone()),
            Cell::new(event.body.clone()),
        ]));
    }
    table.to_string()
}

pub fn render_plan_table(plan: &SchedulerPlan) -> String {
    let mut table = new_table();
    table.set_header(vec!["Tier", "Last Run", "Next Eligible", "Runs"]);
    for tier in Tier::ALL {
        let runs = plan.decision.runs(tier);
        let runs_cell = if runs {
            Cell::new("YES").fg(Color::Yellow)
        } else {
            Cell::new("NO")
        };
        table.add_row(Row::from(vec![
            Cell::new(tier.to_string()),
            Cell::new(
                plan.last_runs
                    .get(tier)
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string()),
            ),
            Cell::new(
                plan.next_eligible_runs
                    .get(tier)
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_else(|| "now".to_string()),
            ),
            runs_cell,
        ]));
    }

    let action = match plan.decision {
        RefreshDecision::ReuseCache => "cache",
        _ => "refresh",
    };
    let mut out = format!(
        "Decision: {} ({action}), confidence {:.3}, drift {}\n",
        plan.decision, plan.metrics.confidence, plan.metrics.drift_severity
    );
    out.push_str(&table.to_string());
    for (idx, reason) in plan.reasons.iter().enumerate() {
        out.push_str(&format!("\n{}. {reason}", idx + 1));
    }
    out
}
