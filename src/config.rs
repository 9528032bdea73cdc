use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::alert::AlertPolicy;
use crate::confidence::{ConfidenceScorer, DriftPolicy, ScoringPolicy};
use crate::scheduler::{RefreshScheduler, SchedulerPolicy};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scoring: ScoringPolicy,
    #[serde(default)]
    pub drift: DriftPolicy,
    #[serde(default)]
    pub scheduler: SchedulerPolicy,
    #[serde(default)]
    pub alerts: AlertPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_path: Option<PathBuf>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/menu-freshness/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        parsed
            .scheduler
            .validate()
            .with_context(|| format!("invalid [scheduler] section: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(db_path) = overrides.db_path {
            self.storage.db_path = db_path.to_string_lossy().into_owned();
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }

    pub fn scorer(&self) -> ConfidenceScorer {
        ConfidenceScorer::new(self.scoring, self.drift)
    }

    pub fn scheduler(&self) -> RefreshScheduler {
        RefreshScheduler::new(self.scheduler)
    }

    pub fn default_template() -> String {
        let template = r#"[storage]
db_path = "~/.local/share/menu-freshness/snapshots.db"

[scoring]
base = 0.5
merged_weight = 0.3
low_flag_weight = 0.2
imbalance_penalty = 0.1
imbalance_ratio = 0.5

[drift]
high_ratio = 0.30
medium_ratio = 0.15
low_ratio = 0.0
detail_limit = 10

[scheduler]
tier1_min_interval_days = 15
tier2_min_interval_days = 7
low_confidence = 0.40
high_confidence = 0.70

[alerts]
price_jump_pct = 50.0
mass_removal_ratio = 0.25
low_confidence = 0.40
enable_stdout = true
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "~/.local/share/menu-freshness/snapshots.db".to_string()
}
