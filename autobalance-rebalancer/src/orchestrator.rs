//! Rebalance Orchestrator
//!
//! Drives one input through a fixed sequence of stages:
//!
//! ```text
//! Validate -> CheckMaintenance -> CheckSearchFactor -> ReconcileThreshold -> Dispatch
//! ```
//!
//! Each stage either continues to the next one, finishes the input with an
//! [`Outcome`], or fails with a [`RebalanceError`]. Nothing is retried.
//!
//! Inputs are processed one at a time, in order. Only a completed input lets
//! the run move on to the next one; a skip or an error ends the run.

use std::sync::Arc;

use autobalance_core::{ClusterStatus, RawInput, RebalanceMode, RebalanceRequest};
use tracing::{debug, error, info};

use crate::dispatcher;
use crate::error::{RebalanceError, Result};
use crate::logging::{FixedVerbosity, VerbosityControl};
use crate::manager::ClusterManager;
use crate::policy::{AlwaysRebalance, UsagePolicy};
use crate::precondition::{self, Gate, SkipReason};
use crate::threshold;

/// How an input finished when no error occurred
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Maintenance mode was on; nothing was changed
    SkippedMaintenance,
    /// Search factor was not met; nothing was changed
    SkippedSearchFactor,
    /// The usage policy declined to start a usage-based rebalance
    SkippedByPolicy { reason: String },
    /// The selected operation was accepted by the cluster manager
    Completed {
        mode: RebalanceMode,
        description: Option<String>,
    },
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }
}

impl From<SkipReason> for Outcome {
    fn from(reason: SkipReason) -> Self {
        match reason {
            SkipReason::MaintenanceMode => Outcome::SkippedMaintenance,
            SkipReason::SearchFactorNotMet => Outcome::SkippedSearchFactor,
        }
    }
}

/// Stages of one input's processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    CheckMaintenance,
    CheckSearchFactor,
    ReconcileThreshold,
    Dispatch,
}

enum Step {
    Continue(Stage),
    Finish(Outcome),
}

/// Per-input state carried between stages
struct Invocation<'a> {
    input: &'a RawInput,
    request: RebalanceRequest,
    status: ClusterStatus,
}

/// Result of processing one input
#[derive(Debug)]
pub struct InputReport {
    pub name: String,
    pub result: Result<Outcome>,
}

/// Result of processing all configured inputs
#[derive(Debug, Default)]
pub struct RunReport {
    pub inputs: Vec<InputReport>,
    /// Inputs never started because an earlier one ended the run
    pub not_attempted: usize,
}

impl RunReport {
    /// The error that ended the run, if any
    pub fn error(&self) -> Option<&RebalanceError> {
        self.inputs.iter().find_map(|r| r.result.as_ref().err())
    }

    pub fn completed(&self) -> usize {
        self.inputs
            .iter()
            .filter(|r| matches!(r.result, Ok(ref o) if o.is_completed()))
            .count()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} inputs processed, {} completed, {} not attempted{}",
            self.inputs.len(),
            self.completed(),
            self.not_attempted,
            if self.error().is_some() {
                ", ended with an error"
            } else {
                ""
            }
        )
    }
}

/// Runs rebalance inputs against a cluster manager
pub struct Orchestrator {
    manager: Arc<dyn ClusterManager>,
    policy: Arc<dyn UsagePolicy>,
    verbosity: Arc<dyn VerbosityControl>,
}

impl Orchestrator {
    pub fn new(manager: Arc<dyn ClusterManager>) -> Self {
        Self {
            manager,
            policy: Arc::new(AlwaysRebalance),
            verbosity: Arc::new(FixedVerbosity),
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn UsagePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Arc<dyn VerbosityControl>) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Process inputs in order until one does not complete
    pub async fn run_all(&self, inputs: &[RawInput]) -> RunReport {
        let mut report = RunReport::default();

        for (i, input) in inputs.iter().enumerate() {
            let result = self.run_input(input).await;
            let carry_on = match result {
                Ok(ref outcome) => {
                    info!(input = %input.name, outcome = ?outcome, "Input finished");
                    outcome.is_completed()
                }
                Err(ref e) => {
                    error!(input = %input.name, kind = e.kind(), error = %e, "Input aborted");
                    false
                }
            };

            report.inputs.push(InputReport {
                name: input.name.clone(),
                result,
            });

            if !carry_on {
                report.not_attempted = inputs.len() - i - 1;
                break;
            }
        }

        report
    }

    /// Process one input through every stage
    pub async fn run_input(&self, input: &RawInput) -> Result<Outcome> {
        let mut invocation = Invocation {
            input,
            request: RebalanceRequest::default(),
            status: ClusterStatus::default(),
        };

        let mut stage = Stage::Validate;
        loop {
            debug!(input = %input.name, stage = ?stage, "Entering stage");
            match self.advance(stage, &mut invocation).await? {
                Step::Continue(next) => stage = next,
                Step::Finish(outcome) => return Ok(outcome),
            }
        }
    }

    async fn advance(&self, stage: Stage, invocation: &mut Invocation<'_>) -> Result<Step> {
        let manager = self.manager.as_ref();

        match stage {
            Stage::Validate => {
                self.verbosity.set_debug(false);
                let request = RebalanceRequest::from_input(invocation.input)?;
                if request.debug {
                    self.verbosity.set_debug(true);
                }
                debug!(
                    threshold = request.threshold,
                    max_runtime = ?request.max_runtime,
                    target_index = ?request.target_index,
                    searchable = request.searchable,
                    mode = %request.mode(),
                    "Validated input"
                );
                invocation.request = request;
                info!("Checking maintenance mode and search factor status");
                Ok(Step::Continue(Stage::CheckMaintenance))
            }

            Stage::CheckMaintenance => {
                let (maintenance_mode, gate) = precondition::check_maintenance(manager).await?;
                invocation.status.maintenance_mode = maintenance_mode;
                Ok(gate_step(gate, Stage::CheckSearchFactor))
            }

            Stage::CheckSearchFactor => {
                let (met, gate) = precondition::check_search_factor(manager).await?;
                invocation.status.search_factor_met = met;
                Ok(gate_step(gate, Stage::ReconcileThreshold))
            }

            Stage::ReconcileThreshold => {
                let reconciliation =
                    threshold::reconcile(manager, invocation.request.threshold).await?;
                invocation.status.configured_threshold = reconciliation.configured;
                Ok(Step::Continue(Stage::Dispatch))
            }

            Stage::Dispatch => {
                debug!(status = ?invocation.status, "Cluster status before dispatch");
                let outcome =
                    dispatcher::dispatch(manager, self.policy.as_ref(), &invocation.request)
                        .await?;
                Ok(Step::Finish(outcome))
            }
        }
    }
}

fn gate_step(gate: Gate, next: Stage) -> Step {
    match gate {
        Gate::Open => Step::Continue(next),
        Gate::Closed(reason) => Step::Finish(reason.into()),
    }
}
