pub mod normalize;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use normalize::normalize_name;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum SourceDecision {
    Merged,
    SourceA,
    SourceB,
}

impl Display for SourceDecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Merged => "merged",
            Self::SourceA => "sourceA",
            Self::SourceB => "sourceB",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Error)]
#[error("unknown source decision: {0}")]
pub struct SourceDecisionParseError(pub String);

impl FromStr for SourceDecision {
    type Err = SourceDecisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        match normalized.as_str() {
            "merged" | "both" => Ok(Self::Merged),
            "sourcea" | "a" => Ok(Self::SourceA),
            "sourceb" | "b" => Ok(Self::SourceB),
            _ => Err(SourceDecisionParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_name: Option<String>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source_decision: Option<SourceDecision>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl MenuItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_price(mut self, price_cents: i64) -> Self {
        self.price_cents = Some(price_cents);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_source(mut self, decision: SourceDecision) -> Self {
        self.source_decision = Some(decision);
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Name-based identity key. A stored `normalizedName` is re-normalized so
    /// hand-edited records still match.
    pub fn normalized_name(&self) -> String {
        match &self.normalized_name {
            Some(stored) => normalize_name(stored),
            None => normalize_name(&self.name),
        }
    }

    pub fn display_name(&self) -> String {
        if !self.name.trim().is_empty() {
            return self.name.clone();
        }
        self.identifier.clone().unwrap_or_default()
    }

    pub fn is_flagged(&self) -> bool {
        !self.flags.is_empty()
    }

    pub fn has_image(&self) -> bool {
        self.image_url
            .as_deref()
            .map(|url| !url.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdjudicatedMenu {
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

impl AdjudicatedMenu {
    pub fn new(items: Vec<MenuItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_item() {
        let item: MenuItem = serde_json::from_str(
            r#"{
                "identifier": "sku-1",
                "name": "Pad Thai",
                "priceCents": 1295,
                "category": "Noodles",
                "sourceDecision": "sourceB",
                "flags": ["price_mismatch"],
                "imageUrl": "https://img/1.jpg"
            }"#,
        )
        .expect("valid item");
        assert_eq!(item.identifier.as_deref(), Some("sku-1"));
        assert_eq!(item.price_cents, Some(1295));
        assert_eq!(item.source_decision, Some(SourceDecision::SourceB));
        assert!(item.is_flagged());
        assert!(item.has_image());
        assert_eq!(item.normalized_name(), "pad thai");
    }

    #[test]
    fn missing_optional_fields_default_to_absent() {
        let item: MenuItem = serde_json::from_str(r#"{"name": "Water"}"#).expect("valid item");
        assert!(item.identifier.is_none());
        assert!(item.price_cents.is_none());
        assert!(item.source_decision.is_none());
        assert!(item.flags.is_empty());
        assert!(!item.has_image());
    }

    #[test]
    fn menu_without_items_is_empty() {
        let menu: AdjudicatedMenu = serde_json::from_str("{}").expect("valid menu");
        assert!(menu.is_empty());
    }

    #[test]
    fn stored_normalized_name_is_renormalized() {
        let mut item = MenuItem::new("ignored");
        item.normalized_name = Some("Spring  Rolls!".to_string());
        assert_eq!(item.normalized_name(), "spring rolls");
    }

    #[test]
    fn parses_source_decision_aliases() {
        assert_eq!("merged".parse::<SourceDecision>().ok(), Some(SourceDecision::Merged));
        assert_eq!("source_a".parse::<SourceDecision>().ok(), Some(SourceDecision::SourceA));
        assert_eq!("sourceB".parse::<SourceDecision>().ok(), Some(SourceDecision::SourceB));
        assert!("ghost".parse::<SourceDecision>().is_err());
    }
}
