//! Rebalance request validation
//!
//! The host hands over each configured input as a map of raw strings. This
//! module turns one such map into a validated [`RebalanceRequest`]:
//! - `threshold` and `max_runtime` must parse as strictly positive numbers
//! - boolean-like options are true only for `"1"`, `"True"` or `"true"`
//! - absent options take their defaults

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, ValidationError};

/// Rebalance threshold used when the input does not set one
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Raw values accepted as boolean true
const TRUTHY: [&str; 3] = ["1", "True", "true"];

/// Returns true iff `value` parses as a float strictly greater than zero.
///
/// Parse failures are not errors, they simply yield `false`.
pub fn is_positive_number(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .map(|number| number > 0.0)
        .unwrap_or(false)
}

/// Boolean coercion for host-supplied option values; absence is false.
pub fn is_truthy(value: Option<&str>) -> bool {
    value.map(|v| TRUTHY.contains(&v)).unwrap_or(false)
}

/// One configured input as delivered by the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInput {
    /// Input (stanza) name
    pub name: String,
    /// Raw option values keyed by option name
    pub values: BTreeMap<String, String>,
}

impl RawInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter, mostly useful for ad-hoc inputs and tests
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Which operation a request asks the cluster manager to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceMode {
    /// Remove excess bucket copies instead of rebalancing
    ExcessBuckets,
    /// Usage-weighted rebalance
    UsageBased,
    /// Uniform bucket-count rebalance
    Uniform,
}

impl fmt::Display for RebalanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RebalanceMode::ExcessBuckets => "excess-buckets",
            RebalanceMode::UsageBased => "usage-based",
            RebalanceMode::Uniform => "uniform",
        };
        f.write_str(name)
    }
}

/// Validated run parameters for one input
#[derive(Debug, Clone, PartialEq)]
pub struct RebalanceRequest {
    /// Desired `rebalance_threshold` cluster setting
    pub threshold: f64,
    /// Runtime limit forwarded to the cluster manager, in minutes. `None` is unlimited.
    pub max_runtime: Option<f64>,
    /// Index to act on. `None` means all indexes.
    pub target_index: Option<String>,
    pub searchable: bool,
    pub usage_based: bool,
    pub excess_buckets: bool,
    /// Raises log verbosity only
    pub debug: bool,
}

impl Default for RebalanceRequest {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_runtime: None,
            target_index: None,
            searchable: false,
            usage_based: false,
            excess_buckets: false,
            debug: false,
        }
    }
}

impl RebalanceRequest {
    /// Validate one raw input.
    ///
    /// `threshold` is checked before `max_runtime`; the first invalid field
    /// is reported.
    pub fn from_input(input: &RawInput) -> Result<Self> {
        let threshold = match input.get("threshold") {
            Some(raw) => parse_positive(raw).ok_or_else(|| ValidationError::InvalidThreshold {
                value: raw.to_string(),
            })?,
            None => DEFAULT_THRESHOLD,
        };

        let max_runtime = match input.get("max_runtime") {
            Some(raw) => Some(parse_positive(raw).ok_or_else(|| {
                ValidationError::InvalidMaxRuntime {
                    value: raw.to_string(),
                }
            })?),
            None => None,
        };

        let target_index = input
            .get("target_index")
            .filter(|index| !index.is_empty())
            .map(str::to_string);

        Ok(Self {
            threshold,
            max_runtime,
            target_index,
            searchable: is_truthy(input.get("searchable")),
            usage_based: is_truthy(input.get("usage_based")),
            excess_buckets: is_truthy(input.get("excess_buckets")),
            debug: is_truthy(input.get("debug")),
        })
    }

    /// Mode selection in priority order: excess buckets, usage based, uniform
    pub fn mode(&self) -> RebalanceMode {
        if self.excess_buckets {
            RebalanceMode::ExcessBuckets
        } else if self.usage_based {
            RebalanceMode::UsageBased
        } else {
            RebalanceMode::Uniform
        }
    }
}

fn parse_positive(raw: &str) -> Option<f64> {
    if is_positive_number(raw) {
        raw.trim().parse().ok()
    } else {
        None
    }
}
