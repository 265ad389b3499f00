//! Round observation hooks.
//!
//! An injectable callback interface in place of a process-wide event bus:
//! the pipeline stays a pure function plus explicit side-effect ports.

use crate::core::Error;
use crate::orchestrator::OrchestrationResult;

/// Pipeline stage of a consensus round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundStage {
    /// Validating the incoming round
    Validating,
    /// Building the decision graph
    GraphBuilding,
    /// Analyzing the graph
    Analyzing,
    /// Resolving consensus
    Resolving,
    /// Consulting the governance gate
    GovernanceCheck,
    /// Persisting the result
    Persisted,
}

impl std::fmt::Display for RoundStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundStage::Validating => write!(f, "validating"),
            RoundStage::GraphBuilding => write!(f, "graph-building"),
            RoundStage::Analyzing => write!(f, "analyzing"),
            RoundStage::Resolving => write!(f, "resolving"),
            RoundStage::GovernanceCheck => write!(f, "governance-check"),
            RoundStage::Persisted => write!(f, "persisted"),
        }
    }
}

/// Observer for round lifecycle events. All methods default to no-ops.
pub trait RoundObserver: Send + Sync {
    /// A stage was entered.
    fn on_stage(&self, _stage: RoundStage) {}

    /// A round finished and was persisted.
    fn on_round_complete(&self, _result: &OrchestrationResult) {}

    /// A round aborted at the given stage.
    fn on_round_failed(&self, _stage: RoundStage, _error: &Error) {}
}

/// Observer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl RoundObserver for NoopObserver {}
