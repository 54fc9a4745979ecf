//! Autobalance Core Library
//!
//! Domain types for the automatic data rebalance trigger:
//! - Raw host-supplied input options and their validation
//! - The validated `RebalanceRequest` and its rebalance mode
//! - Cluster status values fetched from the cluster manager
//! - The input scheme declared to the host scheduler
//!
//! Nothing in this crate performs I/O.

pub mod error;
pub mod request;
pub mod scheme;
pub mod status;

pub use error::ValidationError;
pub use request::{
    is_positive_number, is_truthy, RawInput, RebalanceMode, RebalanceRequest, DEFAULT_THRESHOLD,
};
pub use scheme::{Argument, ArgumentType, InputScheme};
pub use status::{search_factor_is_met, ClusterStatus, NumberLike, UsageStats};
