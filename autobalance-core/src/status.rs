//! Cluster status values
//!
//! Values reported by the cluster manager for one invocation. They are
//! fetched fresh every run and never cached.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The only `search_factor_met` value that counts as met
const SEARCH_FACTOR_MET: &str = "1";

/// Cluster state gathered while checking preconditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterStatus {
    pub maintenance_mode: bool,
    pub search_factor_met: bool,
    /// `rebalance_threshold` currently stored in the cluster configuration
    pub configured_threshold: Option<NumberLike>,
}

/// Interpret the raw `search_factor_met` field.
///
/// Met only for the string `"1"`. Absent, `"0"`, numbers and booleans are
/// all "not met".
pub fn search_factor_is_met(raw: Option<&Value>) -> bool {
    matches!(raw, Some(Value::String(s)) if s == SEARCH_FACTOR_MET)
}

/// A numeric value the cluster manager may report as a number or a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberLike {
    Number(f64),
    Text(String),
}

impl NumberLike {
    /// Numeric value, if the text form parses
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NumberLike::Number(n) => Some(*n),
            NumberLike::Text(s) => s.trim().parse().ok(),
        }
    }

    /// True when both sides denote the same number, whatever their textual form
    pub fn equals(&self, other: f64) -> bool {
        self.as_f64().map(|n| n == other).unwrap_or(false)
    }
}

impl std::fmt::Display for NumberLike {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumberLike::Number(n) => write!(f, "{}", n),
            NumberLike::Text(s) => f.write_str(s),
        }
    }
}

/// Bucket distribution statistics from the usage-based rebalance endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    #[serde(deserialize_with = "number_like")]
    pub stddev_current: f64,
    #[serde(deserialize_with = "number_like")]
    pub stddev_before_usage_rebalance: f64,
    #[serde(deserialize_with = "number_like")]
    pub stddev_after_usage_rebalance: f64,
}

fn number_like<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = NumberLike::deserialize(deserializer)?;
    value
        .as_f64()
        .ok_or_else(|| serde::de::Error::custom(format!("expected a number, got {:?}", value)))
}
