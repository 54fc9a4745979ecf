//! Autobalance Rebalancer Library
//!
//! Checks indexer cluster health through the cluster manager and, when it is
//! safe, triggers one of:
//! - Uniform data rebalance
//! - Usage-based data rebalance
//! - Excess bucket removal
//!
//! A rebalance is only attempted when the cluster is out of maintenance mode
//! and its search factor is met.

pub mod config;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod logging;
pub mod manager;
pub mod manager_client;
pub mod orchestrator;
pub mod policy;
pub mod precondition;
pub mod threshold;

// Re-export main types
pub use config::{ConfigError, InputConfig, ManagerSettings, RebalancerConfig};
pub use error::RebalanceError;
pub use logging::{FixedVerbosity, LoggingConfig, VerbosityControl};
pub use manager::{ClusterManager, UniformRebalance};
pub use manager_client::{HttpClusterManager, ManagerClientConfig, TlsConfig};
pub use orchestrator::{InputReport, Orchestrator, Outcome, RunReport, Stage};
pub use policy::{AlwaysRebalance, UsageDecision, UsagePolicy};
pub use precondition::{Gate, SkipReason};
pub use threshold::Reconciliation;
