//! Threshold reconciliation
//!
//! Makes sure the cluster's persisted `rebalance_threshold` equals the
//! requested value before any rebalance is started. Both sides are compared
//! as numbers, so `0.9` and `"0.90"` count as equal.

use autobalance_core::NumberLike;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::manager::ClusterManager;

/// Outcome of reconciling the threshold
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    /// Value found in the cluster configuration before reconciling
    pub configured: Option<NumberLike>,
    /// Whether an update call was issued
    pub updated: bool,
}

/// True when the configured value is absent or numerically different
pub fn needs_update(configured: Option<&NumberLike>, desired: f64) -> bool {
    match configured {
        None => true,
        Some(value) => !value.equals(desired),
    }
}

pub async fn reconcile(manager: &dyn ClusterManager, desired: f64) -> Result<Reconciliation> {
    let configured = manager.rebalance_threshold().await?;

    if let Some(ref value) = configured {
        if value.as_f64().is_none() {
            warn!(current_threshold = %value, "Configured rebalance_threshold is not numeric");
        }
    }

    if !needs_update(configured.as_ref(), desired) {
        debug!(threshold = desired, "rebalance_threshold already matches");
        return Ok(Reconciliation {
            configured,
            updated: false,
        });
    }

    info!(
        current_threshold = ?configured.as_ref().map(ToString::to_string),
        threshold = desired,
        "Current rebalance_threshold differs, updating server configuration"
    );
    manager.set_rebalance_threshold(desired).await?;

    Ok(Reconciliation {
        configured,
        updated: true,
    })
}
