use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertEventKind {
    PriceJump,
    MassRemoval,
    ItemsAdded,
    ItemsRemoved,
    LowConfidence,
    DriftDetected,
}

impl AlertEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PriceJump => "price_jump",
            Self::MassRemoval => "mass_removal",
            Self::ItemsAdded => "items_added",
            Self::ItemsRemoved => "items_removed",
            Self::LowConfidence => "low_confidence",
            Self::DriftDetected => "drift_detected",
        }
    }
}

impl Display for AlertEventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl Display for AlertSeverity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AlertPolicy {
    /// Price moves larger than this percentage of the old price are critical.
    #[serde(default = "default_price_jump_pct")]
    pub price_jump_pct: f64,
    #[serde(default = "default_mass_removal_ratio")]
    pub mass_removal_ratio: f64,
    #[serde(default = "default_low_confidence")]
    pub low_confidence: f64,
    #[serde(default = "default_enable_stdout")]
    pub enable_stdout: bool,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            price_jump_pct: default_price_jump_pct(),
            mass_removal_ratio: default_mass_removal_ratio(),
            low_confidence: default_low_confidence(),
            enable_stdout: default_enable_stdout(),
        }
    }
}

fn default_price_jump_pct() -> f64 {
    50.0
}

fn default_mass_removal_ratio() -> f64 {
    0.25
}

fn default_low_confidence() -> f64 {
    0.40
}

fn default_enable_stdout() -> bool {
    true
}
