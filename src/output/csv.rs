use anyhow::Result;

use crate::alert::AlertEvent;
use crate::diff::DiffReport;
use crate::snapshot::SnapshotEntry;

pub fn diff_to_csv(report: &DiffReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["change", "identifier", "name", "old", "new"])?;
    for item in &report.added_items {
        writer.write_record([
            "added".to_string(),
            item.identifier.clone().unwrap_or_default(),
            item.display_name(),
            String::new(),
            item.price_cents.map(|p| p.to_string()).unwrap_or_default(),
        ])?;
    }
    for item in &report.removed_items {
        writer.write_record([
            "removed".to_string(),
            item.identifier.clone().unwrap_or_default(),
            item.display_name(),
            item.price_cents.map(|p| p.to_string()).unwrap_or_default(),
            String::new(),
        ])?;
    }
    for change in &report.price_changes {
        writer.write_record([
            "price".to_string(),
            change.identifier.clone(),
            String::new(),
            change.old_price_cents.map(|p| p.to_string()).unwrap_or_default(),
            change.new_price_cents.map(|p| p.to_string()).unwrap_or_default(),
        ])?;
    }
    for change in &report.category_changes {
        writer.write_record([
            "category".to_string(),
            change.identifier.clone(),
            String::new(),
            change.old_category.clone().unwrap_or_default(),
            change.new_category.clone().unwrap_or_default(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn versions_to_csv(entries: &[SnapshotEntry]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["version_id", "created_at", "items", "filename"])?;
    for entry in entries {
        writer.write_record([
            entry.version_id.clone(),
            entry.created_at.to_rfc3339(),
            entry.item_count.to_string(),
            entry.snapshot_filename.clone(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn alerts_to_csv(events: &[AlertEvent]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["severity", "kind", "title", "body"])?;
    for event in events {
        writer.write_record([
            event.severity.to_string(),
            event.kind.to_string(),
            event.title.clone(),
            event.body.clone(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
