pub mod policy;
pub mod runs;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::confidence::DriftSeverity;

pub use policy::RefreshScheduler;
pub use runs::{resolve_last_run, resolve_last_runs};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum RefreshDecision {
    ReuseCache,
    RunTier1Only,
    RunTier2Only,
    RunTier1AndTier2,
}

impl RefreshDecision {
    pub fn from_tiers(tier1: bool, tier2: bool) -> Self {
        match (tier1, tier2) {
            (true, true) => Self::RunTier1AndTier2,
            (true, false) => Self::RunTier1Only,
            (false, true) => Self::RunTier2Only,
            (false, false) => Self::ReuseCache,
        }
    }

    pub fn runs(&self, tier: Tier) -> bool {
        match (self, tier) {
            (Self::RunTier1AndTier2, _) => true,
            (Self::RunTier1Only, Tier::Tier1) => true,
            (Self::RunTier2Only, Tier::Tier2) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReuseCache => "reuseCache",
            Self::RunTier1Only => "runTier1Only",
            Self::RunTier2Only => "runTier2Only",
            Self::RunTier1AndTier2 => "runTier1AndTier2",
        }
    }
}

impl Display for RefreshDecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown refresh decision: {0}")]
pub struct RefreshDecisionParseError(pub String);

impl FromStr for RefreshDecision {
    type Err = RefreshDecisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        match normalized.as_str() {
            "reusecache" => Ok(Self::ReuseCache),
            "runtier1only" => Ok(Self::RunTier1Only),
            "runtier2only" => Ok(Self::RunTier2Only),
            "runtier1andtier2" => Ok(Self::RunTier1AndTier2),
            _ => Err(RefreshDecisionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Tier1,
    Tier2,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::Tier1, Tier::Tier2];
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tier1 => write!(f, "tier1"),
            Self::Tier2 => write!(f, "tier2"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TierTimes {
    pub tier1: Option<DateTime<Utc>>,
    pub tier2: Option<DateTime<Utc>>,
}

impl TierTimes {
    pub fn new(tier1: Option<DateTime<Utc>>, tier2: Option<DateTime<Utc>>) -> Self {
        Self { tier1, tier2 }
    }

    pub fn get(&self, tier: Tier) -> Option<DateTime<Utc>> {
        match tier {
            Tier::Tier1 => self.tier1,
            Tier::Tier2 => self.tier2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanMetrics {
    pub confidence: f64,
    pub drift_severity: DriftSeverity,
    pub critical_alerts: bool,
    pub diff_available: bool,
    pub total_items: usize,
    pub flagged_items: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerPlan {
    pub decision: RefreshDecision,
    pub reasons: Vec<String>,
    pub metrics: PlanMetrics,
    pub last_runs: TierTimes,
    pub next_eligible_runs: TierTimes,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SchedulerPolicy {
    #[serde(default = "default_tier1_interval_days")]
    pub tier1_min_interval_days: i64,
    #[serde(default = "default_tier2_interval_days")]
    pub tier2_min_interval_days: i64,
    #[serde(default = "default_low_confidence")]
    pub low_confidence: f64,
    #[serde(default = "default_high_confidence")]
    pub high_confidence: f64,
}

pub const MAX_INTERVAL_DAYS: i64 = 36_500;

#[derive(Debug, Error, PartialEq)]
#[error(
    "{tier} minimum interval must be between 0 and {} days, got {days}",
    MAX_INTERVAL_DAYS
)]
pub struct IntervalError {
    pub tier: Tier,
    pub days: i64,
}

impl SchedulerPolicy {
    pub fn validate(&self) -> Result<(), IntervalError> {
        for tier in Tier::ALL {
            let days = self.interval_days(tier);
            if !(0..=MAX_INTERVAL_DAYS).contains(&days) {
                return Err(IntervalError { tier, days });
            }
        }
        Ok(())
    }

    /// Saturates instead of failing for intervals `validate` would reject.
    pub fn min_interval(&self, tier: Tier) -> Duration {
        Duration::try_days(self.interval_days(tier)).unwrap_or(Duration::MAX)
    }

    pub fn interval_days(&self, tier: Tier) -> i64 {
        match tier {
            Tier::Tier1 => self.tier1_min_interval_days,
            Tier::Tier2 => self.tier2_min_interval_days,
        }
    }
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self {
            tier1_min_interval_days: default_tier1_interval_days(),
            tier2_min_interval_days: default_tier2_interval_days(),
            low_confidence: default_low_confidence(),
            high_confidence: default_high_confidence(),
        }
    }
}

fn default_tier1_interval_days() -> i64 {
    15
}

fn default_tier2_interval_days() -> i64 {
    7
}

fn default_low_confidence() -> f64 {
    0.40
}

fn default_high_confidence() -> f64 {
    0.70
}
