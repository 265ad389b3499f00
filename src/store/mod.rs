//! Persistence Layer
//!
//! Trait-based storage for orchestrated rounds:
//! - `ConsensusStore` port consumed by the orchestrator
//! - In-memory backend
//! - Aggregate statistics over stored rounds

pub mod memory;

use crate::consensus::ConsensusStatus;
use crate::core::Result;
use crate::orchestrator::OrchestrationResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use memory::MemoryStore;

/// Partial update for a stored round's mutable status fields.
///
/// Append-only transitions: the original consensus numbers are never edited
/// and must remain reproducible from the round's inputs.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// New round status
    pub status: Option<ConsensusStatus>,
    /// Execution outcome reported after the round
    pub execution_results: Option<serde_json::Value>,
    /// Delivery outcome reported by the broadcast collaborator
    pub broadcast_status: Option<String>,
}

impl StatusUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the round status.
    pub fn with_status(mut self, status: ConsensusStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach execution results.
    pub fn with_execution_results(mut self, results: serde_json::Value) -> Self {
        self.execution_results = Some(results);
        self
    }

    /// Set the broadcast delivery status.
    pub fn with_broadcast_status(mut self, status: &str) -> Self {
        self.broadcast_status = Some(status.to_string());
        self
    }
}

/// Aggregate statistics over stored rounds.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreStatistics {
    /// Total rounds stored
    pub total_rounds: u64,
    /// Rounds currently approved
    pub approved: u64,
    /// Rounds currently awaiting review
    pub review_required: u64,
    /// Rounds currently rejected
    pub rejected: u64,
    /// Rounds that passed the governance gate
    pub governance_approved: u64,
    /// Mean agreement ratio across rounds
    pub average_agreement: f64,
    /// Mean final confidence across rounds
    pub average_confidence: f64,
}

/// Core trait for round storage backends.
#[async_trait]
pub trait ConsensusStore: Send + Sync {
    /// Persist a newly orchestrated round.
    async fn store(&self, result: &OrchestrationResult) -> Result<()>;

    /// Read a round by consensus id.
    ///
    /// Returns None if the round doesn't exist.
    async fn get(&self, consensus_id: &str) -> Result<Option<OrchestrationResult>>;

    /// Apply a status update to a stored round.
    ///
    /// Returns the updated record, or `ConsensusNotFound`.
    async fn update_status(
        &self,
        consensus_id: &str,
        update: StatusUpdate,
    ) -> Result<OrchestrationResult>;

    /// List the most recently stored rounds, newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<OrchestrationResult>>;

    /// Aggregate statistics over all stored rounds.
    async fn aggregate_statistics(&self) -> Result<StoreStatistics>;
}
