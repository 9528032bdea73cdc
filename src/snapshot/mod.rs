pub mod migrations;
pub mod store;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::menu::MenuItem;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

impl Snapshot {
    pub fn new(version_id: impl Into<String>, created_at: DateTime<Utc>, items: Vec<MenuItem>) -> Self {
        Self {
            version_id: version_id.into(),
            created_at,
            items,
        }
    }

    pub fn with_hash(created_at: DateTime<Utc>, items: Vec<MenuItem>) -> Self {
        let version_id = content_version_id(&items);
        Self {
            version_id,
            created_at,
            items,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDraft {
    #[serde(default)]
    pub version_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

impl SnapshotDraft {
    pub fn into_snapshot(self, fallback_created_at: DateTime<Utc>) -> Snapshot {
        let created_at = self.created_at.unwrap_or(fallback_created_at);
        match self.version_id.filter(|v| !v.trim().is_empty()) {
            Some(version_id) => Snapshot::new(version_id, created_at, self.items),
            None => Snapshot::with_hash(created_at, self.items),
        }
    }
}

/// First 12 hex chars of the SHA-256 of the canonical item listing.
pub fn content_version_id(items: &[MenuItem]) -> String {
    let canonical = serde_json::to_string(items).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LatestPointer {
    pub subject_version_id: String,
    pub snapshot_filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub subject: String,
    pub version_id: String,
    pub created_at: DateTime<Utc>,
    pub snapshot_filename: String,
    pub item_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelector {
    Latest,
    Version(String),
}

impl Display for VersionSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Version(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Error)]
#[error("empty version selector")]
pub struct VersionSelectorParseError;

impl FromStr for VersionSelector {
    type Err = VersionSelectorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionSelectorParseError);
        }
        if trimmed == "latest" {
            return Ok(Self::Latest);
        }
        Ok(Self::Version(trimmed.to_string()))
    }
}
