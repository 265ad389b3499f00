//! Orchestrator Module
//!
//! The coordinating state machine for one consensus round:
//! validating -> graph-building -> analyzing -> resolving ->
//! governance-check -> persisted. Failure at any stage aborts the round
//! with a typed error; no partial result is persisted.

pub mod observer;

use crate::consensus::{
    ConsensusConfig, ConsensusMethod, ConsensusResolver, ConsensusResult, ConsensusStatus,
};
use crate::core::{now, Error, Result, Timestamp};
use crate::governance::GovernanceGate;
use crate::graph::{analyze, GraphAnalysis, GraphBuilder, OpposingTypes};
use crate::proposal::{validate_decisions, NodeDecision};
use crate::store::{ConsensusStore, StatusUpdate, StoreStatistics};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use observer::{NoopObserver, RoundObserver, RoundStage};

/// One consensus round's input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundRequest {
    /// Node that initiated the round
    pub initiator_node: String,
    /// Logical decision type of the round
    pub decision_type: String,
    /// Proposals, one per participating node
    pub decisions: Vec<NodeDecision>,
    /// Voting method; defaults to the orchestrator's configured method
    #[serde(default)]
    pub method: Option<ConsensusMethod>,
    /// Force a governance review regardless of conflict level
    #[serde(default)]
    pub requires_governance: bool,
}

impl RoundRequest {
    /// Create a round request.
    pub fn new(initiator_node: &str, decision_type: &str, decisions: Vec<NodeDecision>) -> Self {
        Self {
            initiator_node: initiator_node.to_string(),
            decision_type: decision_type.to_string(),
            decisions,
            method: None,
            requires_governance: false,
        }
    }

    /// Select the voting method.
    pub fn with_method(mut self, method: ConsensusMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Require a governance review.
    pub fn with_governance_required(mut self) -> Self {
        self.requires_governance = true;
        self
    }
}

/// Orchestrator configuration.
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Agreement ratio required to auto-approve without governance
    pub auto_approve_agreement: f64,
    /// Conflict level that blocks auto-approval
    pub auto_approve_conflict: f64,
    /// Conflict level at which governance review becomes mandatory
    pub governance_conflict_threshold: f64,
    /// Voting method used when the request doesn't select one
    pub default_method: ConsensusMethod,
    /// Consensus configuration
    pub consensus: ConsensusConfig,
    /// Opposing decision-type table for graph construction
    pub opposing_types: OpposingTypes,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            auto_approve_agreement: 0.8,
            auto_approve_conflict: 0.3,
            governance_conflict_threshold: 0.5,
            default_method: ConsensusMethod::WeightedVote,
            consensus: ConsensusConfig::default(),
            opposing_types: OpposingTypes::with_defaults(),
        }
    }
}

/// The persisted record of one orchestrated round.
///
/// Created exclusively by the orchestrator. Downstream systems may update
/// the mutable status fields through [`StatusUpdate`], never the consensus
/// numbers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrchestrationResult {
    /// Unique round identifier
    pub consensus_id: String,
    /// Initiating node
    pub initiator: String,
    /// Logical decision type of the round
    pub decision_type: String,
    /// All nodes that submitted a proposal
    pub participating_nodes: Vec<String>,
    /// The resolved consensus
    pub consensus: ConsensusResult,
    /// Fraction of graph edges that were conflicts
    pub conflict_level: f64,
    /// Fraction of graph edges that were supports
    pub coherence_score: f64,
    /// Whether the governance gate (or auto-approval) passed
    pub governance_approved: bool,
    /// Advisory recommendations from graph analysis
    pub recommendations: Vec<String>,
    /// Final status after governance reconciliation
    pub status: ConsensusStatus,
    /// Execution outcome recorded after the round (mutable)
    pub execution_results: Option<serde_json::Value>,
    /// Broadcast delivery status recorded after the round (mutable)
    pub broadcast_status: Option<String>,
    /// Creation timestamp
    pub created_at: Timestamp,
}

/// Coordinates the full consensus pipeline for federation rounds.
pub struct Orchestrator {
    builder: GraphBuilder,
    resolver: ConsensusResolver,
    gate: Arc<dyn GovernanceGate>,
    store: Arc<dyn ConsensusStore>,
    observer: Arc<dyn RoundObserver>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create an orchestrator with default configuration.
    pub fn new(gate: Arc<dyn GovernanceGate>, store: Arc<dyn ConsensusStore>) -> Self {
        let config = OrchestratorConfig::default();
        Self {
            builder: GraphBuilder::new(config.opposing_types.clone()),
            resolver: ConsensusResolver::new(config.consensus.clone()),
            gate,
            store,
            observer: Arc::new(NoopObserver),
            config,
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.builder = GraphBuilder::new(config.opposing_types.clone());
        self.resolver = ConsensusResolver::new(config.consensus.clone());
        self.config = config;
        self
    }

    /// Attach a round observer.
    pub fn with_observer(mut self, observer: Arc<dyn RoundObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run one consensus round end to end.
    pub async fn orchestrate(&self, request: RoundRequest) -> Result<OrchestrationResult> {
        self.observer.on_stage(RoundStage::Validating);
        self.validate(&request)
            .map_err(|e| self.abort(RoundStage::Validating, e))?;

        self.observer.on_stage(RoundStage::GraphBuilding);
        let graph = self
            .builder
            .build(&request.decisions)
            .map_err(|e| self.abort(RoundStage::GraphBuilding, e))?;
        debug!(
            nodes = graph.nodes.len(),
            interconnections = graph.interconnections,
            conflicts = graph.conflict_count,
            "decision graph built"
        );

        self.observer.on_stage(RoundStage::Analyzing);
        let analysis = analyze(&graph);

        self.observer.on_stage(RoundStage::Resolving);
        let method = request.method.unwrap_or(self.config.default_method);
        let consensus = self
            .resolver
            .resolve(&request.decisions, &analysis, method)
            .map_err(|e| self.abort(RoundStage::Resolving, e))?;
        debug!(
            method = %method,
            agreement = consensus.agreement_ratio,
            status = %consensus.status,
            "consensus resolved"
        );

        self.observer.on_stage(RoundStage::GovernanceCheck);
        let governance_approved = self
            .governance_check(&request, &analysis, &consensus)
            .await
            .map_err(|e| self.abort(RoundStage::GovernanceCheck, e))?;

        // Governance approval upgrades review to approved; non-approval
        // downgrades approved to review. It never yields rejected.
        let status = if governance_approved {
            match consensus.status {
                ConsensusStatus::Rejected => ConsensusStatus::Rejected,
                _ => ConsensusStatus::Approved,
            }
        } else {
            match consensus.status {
                ConsensusStatus::Approved => ConsensusStatus::ReviewRequired,
                other => other,
            }
        };

        let participating_nodes: Vec<String> = request
            .decisions
            .iter()
            .map(|d| d.node_id.clone())
            .collect();

        let result = OrchestrationResult {
            consensus_id: uuid::Uuid::new_v4().to_string(),
            initiator: request.initiator_node.clone(),
            decision_type: request.decision_type.clone(),
            participating_nodes,
            consensus,
            conflict_level: analysis.conflict_level,
            coherence_score: analysis.coherence_score,
            governance_approved,
            recommendations: analysis.recommendations.clone(),
            status,
            execution_results: None,
            broadcast_status: None,
            created_at: now(),
        };

        self.store
            .store(&result)
            .await
            .map_err(|e| {
                self.abort(
                    RoundStage::Persisted,
                    Error::PersistenceFailure(e.to_string()),
                )
            })?;
        self.observer.on_stage(RoundStage::Persisted);
        self.observer.on_round_complete(&result);
        info!(
            consensus_id = %result.consensus_id,
            status = %result.status,
            governance_approved = result.governance_approved,
            "consensus round persisted"
        );

        Ok(result)
    }

    /// Read a stored round.
    pub async fn get_consensus(&self, consensus_id: &str) -> Result<Option<OrchestrationResult>> {
        self.store.get(consensus_id).await
    }

    /// Aggregate statistics over stored rounds.
    pub async fn get_statistics(&self) -> Result<StoreStatistics> {
        self.store.aggregate_statistics().await
    }

    /// Apply a status update to a stored round.
    pub async fn update_consensus_status(
        &self,
        consensus_id: &str,
        update: StatusUpdate,
    ) -> Result<OrchestrationResult> {
        self.store.update_status(consensus_id, update).await
    }

    fn validate(&self, request: &RoundRequest) -> Result<()> {
        if request.initiator_node.is_empty() {
            return Err(Error::MissingField("initiator_node"));
        }
        if request.decision_type.is_empty() {
            return Err(Error::MissingField("decision_type"));
        }
        validate_decisions(&request.decisions)
    }

    async fn governance_check(
        &self,
        request: &RoundRequest,
        analysis: &GraphAnalysis,
        consensus: &ConsensusResult,
    ) -> Result<bool> {
        let required = request.requires_governance
            || analysis.conflict_level >= self.config.governance_conflict_threshold
            || consensus.status == ConsensusStatus::ReviewRequired;

        if !required {
            let auto = consensus.agreement_ratio >= self.config.auto_approve_agreement
                && analysis.conflict_level < self.config.auto_approve_conflict;
            debug!(auto_approved = auto, "governance review not required");
            return Ok(auto);
        }

        let mut context: HashMap<String, serde_json::Value> = HashMap::new();
        context.insert(
            "decision_type".to_string(),
            serde_json::json!(request.decision_type),
        );
        context.insert(
            "agreement_ratio".to_string(),
            serde_json::json!(consensus.agreement_ratio),
        );
        context.insert(
            "conflict_level".to_string(),
            serde_json::json!(analysis.conflict_level),
        );
        context.insert(
            "coherence_score".to_string(),
            serde_json::json!(analysis.coherence_score),
        );
        context.insert(
            "final_confidence".to_string(),
            serde_json::json!(consensus.final_confidence),
        );
        context.insert(
            "checksum".to_string(),
            serde_json::json!(consensus.checksum),
        );

        let verdict = self
            .gate
            .submit_decision(&request.initiator_node, &request.decision_type, &context)
            .await
            .map_err(|e| Error::GovernanceUnavailable(e.to_string()))?;

        if !verdict.is_approved() {
            warn!(
                status = ?verdict.status,
                reason = verdict.reason.as_deref().unwrap_or(""),
                "governance gate did not approve"
            );
        }
        Ok(verdict.is_approved())
    }

    fn abort(&self, stage: RoundStage, error: Error) -> Error {
        warn!(stage = %stage, error = %error, "consensus round aborted");
        self.observer.on_round_failed(stage, &error);
        error
    }
}
