//! Mode dispatch
//!
//! Runs exactly one of the three cluster operations for a validated request:
//! excess-bucket pruning, usage-based rebalance or uniform rebalance.

use autobalance_core::{RebalanceMode, RebalanceRequest};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::manager::{ClusterManager, UniformRebalance};
use crate::orchestrator::Outcome;
use crate::policy::{UsageDecision, UsagePolicy};

pub async fn dispatch(
    manager: &dyn ClusterManager,
    policy: &dyn UsagePolicy,
    request: &RebalanceRequest,
) -> Result<Outcome> {
    match request.mode() {
        RebalanceMode::ExcessBuckets => prune_excess_buckets(manager, request).await,
        RebalanceMode::UsageBased => usage_based_rebalance(manager, policy).await,
        RebalanceMode::Uniform => uniform_rebalance(manager, request).await,
    }
}

async fn prune_excess_buckets(
    manager: &dyn ClusterManager,
    request: &RebalanceRequest,
) -> Result<Outcome> {
    debug!(target_index = ?request.target_index, "Requesting excess bucket removal");
    manager
        .prune_excess_buckets(request.target_index.as_deref())
        .await?;

    info!("Excess bucket removal triggered");
    Ok(Outcome::Completed {
        mode: RebalanceMode::ExcessBuckets,
        description: None,
    })
}

async fn usage_based_rebalance(
    manager: &dyn ClusterManager,
    policy: &dyn UsagePolicy,
) -> Result<Outcome> {
    let stats = manager.usage_rebalance_status().await?;
    info!(
        stddev_after_usage_rebalance = stats.stddev_after_usage_rebalance,
        stddev_before_usage_rebalance = stats.stddev_before_usage_rebalance,
        stddev_current = stats.stddev_current,
        "Usage based rebalance status"
    );

    if let UsageDecision::Skip { reason } = policy.evaluate(&stats) {
        warn!(reason = %reason, "Usage policy declined the rebalance");
        return Ok(Outcome::SkippedByPolicy { reason });
    }

    let description = manager.start_usage_rebalance().await?;
    info!(desc = %description, "Description returned by usage based rebalance endpoint");

    Ok(Outcome::Completed {
        mode: RebalanceMode::UsageBased,
        description: Some(description),
    })
}

async fn uniform_rebalance(
    manager: &dyn ClusterManager,
    request: &RebalanceRequest,
) -> Result<Outcome> {
    let params = UniformRebalance {
        searchable: request.searchable,
        index: request.target_index.clone(),
        max_time_in_min: request.max_runtime,
    };
    debug!(
        index = ?params.index,
        searchable = params.searchable,
        max_time_in_min = ?params.max_time_in_min,
        "Starting rebalance"
    );

    let description = manager.start_rebalance(&params).await?;
    info!(desc = %description, "Description returned by rebalance endpoint");

    Ok(Outcome::Completed {
        mode: RebalanceMode::Uniform,
        description: Some(description),
    })
}
