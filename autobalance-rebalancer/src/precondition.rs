//! Precondition checks
//!
//! Rebalancing moves buckets between peers. Starting it while the cluster is
//! in maintenance mode, or before the search factor is met, risks data
//! unavailability. Both checks gate every mutating call.

use std::fmt;

use tracing::{debug, warn};

use crate::error::Result;
use crate::manager::ClusterManager;

/// Why an invocation ended without touching the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MaintenanceMode,
    SearchFactorNotMet,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MaintenanceMode => f.write_str("cluster is in maintenance mode"),
            SkipReason::SearchFactorNotMet => f.write_str("search factor is not met"),
        }
    }
}

/// Result of a single gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Open,
    Closed(SkipReason),
}

/// Maintenance mode gate. Returns the raw flag alongside the gate.
pub async fn check_maintenance(manager: &dyn ClusterManager) -> Result<(bool, Gate)> {
    let maintenance_mode = manager.maintenance_mode().await?;
    debug!(maintenance_mode, "Maintenance mode status");

    if maintenance_mode {
        warn!("Cluster appears to be in maintenance mode, not attempting a data rebalance");
        return Ok((true, Gate::Closed(SkipReason::MaintenanceMode)));
    }
    Ok((false, Gate::Open))
}

/// Search factor gate. Returns the raw flag alongside the gate.
pub async fn check_search_factor(manager: &dyn ClusterManager) -> Result<(bool, Gate)> {
    let met = manager.search_factor_met().await?;
    debug!(search_factor_met = met, "Search factor status");

    if !met {
        warn!("Cluster search factor is not met, not attempting a data rebalance");
        return Ok((false, Gate::Closed(SkipReason::SearchFactorNotMet)));
    }
    Ok((true, Gate::Open))
}
