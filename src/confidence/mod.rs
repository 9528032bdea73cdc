pub mod drift;
pub mod metrics;
pub mod scorer;

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use drift::detect_drift;
pub use metrics::compute_metrics;
pub use scorer::{score_metrics, ConfidenceScorer};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_items: usize,
    pub merged_items: usize,
    pub source_a_only_items: usize,
    pub source_b_only_items: usize,
    pub flagged_items: usize,
    pub items_with_price: usize,
    pub items_with_image: usize,
    pub categories: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceReport {
    pub score: f64,
    pub metrics: Metrics,
    #[serde(default)]
    pub drift: DriftReport,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum DriftSeverity {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl DriftSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for DriftSeverity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown drift severity: {0}")]
pub struct DriftSeverityParseError(pub String);

impl FromStr for DriftSeverity {
    type Err = DriftSeverityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(DriftSeverityParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DriftReport {
    pub severity: DriftSeverity,
    pub added_count: usize,
    pub removed_count: usize,
    pub price_change_count: usize,
    #[serde(default)]
    pub details: DriftDetails,
}

impl DriftReport {
    pub fn change_count(&self) -> usize {
        self.added_count + self.removed_count + self.price_change_count
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DriftDetails {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub changed: Vec<DriftPriceChange>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriftPriceChange {
    pub name: String,
    pub old_price: i64,
    pub new_price: i64,
    pub delta_cents: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoringPolicy {
    #[serde(default = "default_base")]
    pub base: f64,
    #[serde(default = "default_merged_weight")]
    pub merged_weight: f64,
    #[serde(default = "default_low_flag_weight")]
    pub low_flag_weight: f64,
    #[serde(default = "default_imbalance_penalty")]
    pub imbalance_penalty: f64,
    #[serde(default = "default_imbalance_ratio")]
    pub imbalance_ratio: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            base: default_base(),
            merged_weight: default_merged_weight(),
            low_flag_weight: default_low_flag_weight(),
            imbalance_penalty: default_imbalance_penalty(),
            imbalance_ratio: default_imbalance_ratio(),
        }
    }
}

/// Change-ratio bands for drift severity; each band is a strict lower bound.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DriftPolicy {
    #[serde(default = "default_high_ratio")]
    pub high_ratio: f64,
    #[serde(default = "default_medium_ratio")]
    pub medium_ratio: f64,
    #[serde(default = "default_low_ratio")]
    pub low_ratio: f64,
    #[serde(default = "default_detail_limit")]
    pub detail_limit: usize,
}

impl Default for DriftPolicy {
    fn default() -> Self {
        Self {
            high_ratio: default_high_ratio(),
            medium_ratio: default_medium_ratio(),
            low_ratio: default_low_ratio(),
            detail_limit: default_detail_limit(),
        }
    }
}

impl DriftPolicy {
    pub fn classify(&self, ratio: f64) -> DriftSeverity {
        if ratio > self.high_ratio {
            DriftSeverity::High
        } else if ratio > self.medium_ratio {
            DriftSeverity::Medium
        } else if ratio > self.low_ratio {
            DriftSeverity::Low
        } else {
            DriftSeverity::None
        }
    }
}

fn default_base() -> f64 {
    0.5
}

fn default_merged_weight() -> f64 {
    0.3
}

fn default_low_flag_weight() -> f64 {
    0.2
}

fn default_imbalance_penalty() -> f64 {
    0.1
}

fn default_imbalance_ratio() -> f64 {
    0.5
}

fn default_high_ratio() -> f64 {
    0.30
}

fn default_medium_ratio() -> f64 {
    0.15
}

fn default_low_ratio() -> f64 {
    0.0
}

fn default_detail_limit() -> usize {
    10
}
