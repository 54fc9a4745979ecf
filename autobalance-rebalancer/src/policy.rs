//! Usage-based rebalance policy
//!
//! The usage-based endpoint reports bucket distribution statistics before a
//! rebalance is started. A [`UsagePolicy`] looks at them and decides whether
//! to start. The default policy always proceeds.

use autobalance_core::UsageStats;

/// Decision taken on the usage statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageDecision {
    Proceed,
    Skip { reason: String },
}

/// Decides whether a usage-based rebalance should start
pub trait UsagePolicy: Send + Sync {
    fn evaluate(&self, stats: &UsageStats) -> UsageDecision;
}

/// Starts the rebalance regardless of the statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRebalance;

impl UsagePolicy for AlwaysRebalance {
    fn evaluate(&self, _stats: &UsageStats) -> UsageDecision {
        UsageDecision::Proceed
    }
}

impl<F> UsagePolicy for F
where
    F: Fn(&UsageStats) -> UsageDecision + Send + Sync,
{
    fn evaluate(&self, stats: &UsageStats) -> UsageDecision {
        self(stats)
    }
}
