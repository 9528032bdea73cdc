pub const BASE_MIGRATION: &str = r#"
CREATE TABLE IF NOT EXISTS snapshot_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    subject TEXT NOT NULL,
    version_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    created_at_ms INTEGER NOT NULL,
    snapshot_filename TEXT NOT NULL,
    item_count INTEGER NOT NULL,
    snapshot_json TEXT NOT NULL,
    UNIQUE(subject, version_id)
);
CREATE INDEX IF NOT EXISTS idx_snapshot_subject_created
    ON snapshot_history(subject, created_at_ms ASC);

CREATE TABLE IF NOT EXISTS latest_snapshot (
    subject TEXT PRIMARY KEY,
    subject_version_id TEXT NOT NULL,
    snapshot_filename TEXT NOT NULL,
    created_at_ms INTEGER NOT NULL
);
"#;
