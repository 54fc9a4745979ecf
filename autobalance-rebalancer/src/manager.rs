//! Cluster manager port
//!
//! The operations the rebalancer needs from the cluster manager. The HTTPS
//! implementation lives in [`crate::manager_client`]; tests substitute a
//! recording fake.

use autobalance_core::{NumberLike, UsageStats};

use crate::error::Result;

/// Parameters of a uniform rebalance start command
#[derive(Debug, Clone, PartialEq)]
pub struct UniformRebalance {
    pub searchable: bool,
    /// Restrict to one index; `None` rebalances all indexes
    pub index: Option<String>,
    /// Runtime limit in minutes, enforced by the cluster manager
    pub max_time_in_min: Option<f64>,
}

/// Control-plane operations on the cluster manager
#[async_trait::async_trait]
pub trait ClusterManager: Send + Sync {
    /// Whether the cluster is in maintenance mode
    async fn maintenance_mode(&self) -> Result<bool>;

    /// Whether the search factor is met
    async fn search_factor_met(&self) -> Result<bool>;

    /// Current `rebalance_threshold` setting, `None` when not set
    async fn rebalance_threshold(&self) -> Result<Option<NumberLike>>;

    /// Persist a new `rebalance_threshold` setting
    async fn set_rebalance_threshold(&self, threshold: f64) -> Result<()>;

    /// Remove excess bucket copies, optionally for a single index
    async fn prune_excess_buckets(&self, index: Option<&str>) -> Result<()>;

    /// Distribution statistics of the usage-based rebalance
    async fn usage_rebalance_status(&self) -> Result<UsageStats>;

    /// Start a usage-based rebalance, returning the manager's description
    async fn start_usage_rebalance(&self) -> Result<String>;

    /// Start a uniform rebalance, returning the manager's description
    async fn start_rebalance(&self, params: &UniformRebalance) -> Result<String>;
}
