use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::scheduler::TierTimes;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct TierRunRecord {
    #[serde(default, alias = "completed_at")]
    completed_at: Option<DateTime<Utc>>,
}

/// Last successful run of a tier, from its persisted artifact.
///
/// The artifact's embedded `completedAt` wins; otherwise the file's
/// modification time is used. A missing artifact means the tier never ran.
pub fn resolve_last_run(artifact: &Path) -> Option<DateTime<Utc>> {
    let metadata = match fs::metadata(artifact) {
        Ok(metadata) => metadata,
        Err(_) => {
            debug!("no run artifact at {}", artifact.display());
            return None;
        }
    };

    match fs::read_to_string(artifact) {
        Ok(raw) => match serde_json::from_str::<TierRunRecord>(&raw) {
            Ok(TierRunRecord {
                completed_at: Some(at),
            }) => return Some(at),
            Ok(_) => {}
            Err(err) => warn!(
                "run artifact {} is not valid JSON ({err}); using modification time",
                artifact.display()
            ),
        },
        Err(err) => warn!("failed reading run artifact {}: {err}", artifact.display()),
    }

    metadata.modified().ok().map(DateTime::<Utc>::from)
}

pub fn resolve_last_runs(tier1_artifact: &Path, tier2_artifact: &Path) -> TierTimes {
    TierTimes::new(
        resolve_last_run(tier1_artifact),
        resolve_last_run(tier2_artifact),
    )
}
