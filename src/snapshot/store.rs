use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::snapshot::migrations::BASE_MIGRATION;
use crate::snapshot::{LatestPointer, Snapshot, SnapshotEntry, VersionSelector};

pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed opening snapshot store: {}", path.display()))?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(BASE_MIGRATION)?;
        Ok(())
    }

    /// Records a new version. The latest pointer only moves forward in
    /// `createdAt` order, so importing an older capture keeps "latest" intact.
    pub fn insert_snapshot(
        &self,
        subject: &str,
        snapshot: &Snapshot,
        snapshot_filename: &str,
    ) -> Result<SnapshotEntry> {
        if self.contains(subject, &snapshot.version_id)? {
            bail!(
                "snapshot {} already exists for subject {subject}",
                snapshot.version_id
            );
        }

        let created_at_ms = snapshot.created_at.timestamp_millis();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r#"
INSERT INTO snapshot_history(
    subject, version_id, created_at, created_at_ms, snapshot_filename, item_count, snapshot_json
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
"#,
            params![
                subject,
                snapshot.version_id,
                snapshot.created_at.to_rfc3339(),
                created_at_ms,
                snapshot_filename,
                snapshot.items.len() as i64,
                serde_json::to_string(snapshot)?
            ],
        )?;

        let current_latest_ms: Option<i64> = tx
            .query_row(
                "SELECT created_at_ms FROM latest_snapshot WHERE subject = ?1",
                params![subject],
                |row| row.get(0),
            )
            .optional()?;
        if current_latest_ms.map_or(true, |ms| created_at_ms >= ms) {
            tx.execute(
                r#"
INSERT INTO latest_snapshot(subject, subject_version_id, snapshot_filename, created_at_ms)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT(subject) DO UPDATE SET
    subject_version_id = excluded.subject_version_id,
    snapshot_filename = excluded.snapshot_filename,
    created_at_ms = excluded.created_at_ms
"#,
                params![subject, snapshot.version_id, snapshot_filename, created_at_ms],
            )?;
            debug!("latest pointer for {subject} -> {}", snapshot.version_id);
        }
        tx.commit()?;

        Ok(SnapshotEntry {
            subject: subject.to_string(),
            version_id: snapshot.version_id.clone(),
            created_at: snapshot.created_at,
            snapshot_filename: snapshot_filename.to_string(),
            item_count: snapshot.items.len(),
        })
    }

    pub fn contains(&self, subject: &str, version_id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM snapshot_history WHERE subject = ?1 AND version_id = ?2",
                params![subject, version_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn latest_pointer(&self, subject: &str) -> Result<Option<LatestPointer>> {
        let pointer = self
            .conn
            .query_row(
                r#"
SELECT subject_version_id, snapshot_filename
FROM latest_snapshot
WHERE subject = ?1
"#,
                params![subject],
                |row| {
                    Ok(LatestPointer {
                        subject_version_id: row.get(0)?,
                        snapshot_filename: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(pointer)
    }

    pub fn resolve(&self, subject: &str, selector: &VersionSelector) -> Result<Option<Snapshot>> {
        let version_id = match selector {
            VersionSelector::Latest => match self.latest_pointer(subject)? {
                Some(pointer) => pointer.subject_version_id,
                None => return Ok(None),
            },
            VersionSelector::Version(id) => id.clone(),
        };
        self.load_version(subject, &version_id)
    }

    fn load_version(&self, subject: &str, version_id: &str) -> Result<Option<Snapshot>> {
        let json: Option<String> = self
            .conn
            .query_row(
                r#"
SELECT snapshot_json
FROM snapshot_history
WHERE subject = ?1 AND version_id = ?2
"#,
                params![subject, version_id],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(json) => {
                let snapshot = serde_json::from_str(&json).with_context(|| {
                    format!("stored snapshot {version_id} for {subject} is unreadable")
                })?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    pub fn list_versions(&self, subject: &str) -> Result<Vec<SnapshotEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
SELECT subject, version_id, created_at, snapshot_filename, item_count
FROM snapshot_history
WHERE subject = ?1
ORDER BY created_at_ms ASC, id ASC
"#,
        )?;
        let rows = stmt
            .query_map(params![subject], row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn previous_version(&self, subject: &str, version_id: &str) -> Result<Option<SnapshotEntry>> {
        let versions = self.list_versions(subject)?;
        let Some(pos) = versions.iter().position(|e| e.version_id == version_id) else {
            return Ok(None);
        };
        if pos == 0 {
            return Ok(None);
        }
        Ok(versions.into_iter().nth(pos - 1))
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<SnapshotEntry> {
    let created_at_raw: String = row.get(2)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;
    Ok(SnapshotEntry {
        subject: row.get(0)?,
        version_id: row.get(1)?,
        created_at,
        snapshot_filename: row.get(3)?,
        item_count: row.get::<_, i64>(4)? as usize,
    })
}
