//! Consensus resolution.
//!
//! Consumes a graph analysis and a voting method, producing the agreement
//! ratio, a single merged decision payload, a final confidence score, and a
//! content checksum for tamper detection.

use crate::consensus::voting::{
    agreement_ratio, assign_vote, consensus_reached, vote_weight, ConsensusConfig,
    ConsensusMethod, NodeVote, VoteType,
};
use crate::core::{Hash256, Result};
use crate::graph::GraphAnalysis;
use crate::proposal::NodeDecision;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Final status of a resolved round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusStatus {
    /// Consensus reached with low conflict
    Approved,
    /// Needs manual review before execution
    ReviewRequired,
    /// Rejected outright
    Rejected,
}

impl std::fmt::Display for ConsensusStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsensusStatus::Approved => write!(f, "approved"),
            ConsensusStatus::ReviewRequired => write!(f, "review_required"),
            ConsensusStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// The single merged decision a round resolves to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FinalDecision {
    /// Resolved decision type; None when no proposal was approved
    pub decision_type: Option<String>,
    /// Merged payload
    pub payload: HashMap<String, serde_json::Value>,
    /// Nodes whose proposals were approved, in submission order
    pub participating_nodes: Vec<String>,
    /// Primary proposal's node when approved types differed
    pub primary_node: Option<String>,
    /// Remaining approved nodes when a primary was selected
    pub supporting_nodes: Vec<String>,
}

impl FinalDecision {
    /// Placeholder for a round with no approved proposals.
    pub fn none() -> Self {
        Self {
            decision_type: None,
            payload: HashMap::new(),
            participating_nodes: Vec::new(),
            primary_node: None,
            supporting_nodes: Vec::new(),
        }
    }

    /// Whether any proposal was approved.
    pub fn is_some(&self) -> bool {
        self.decision_type.is_some()
    }
}

/// Outcome of consensus resolution for one round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Whether consensus was reached
    pub consensus_reached: bool,
    /// Agreement ratio, in [0,1]
    pub agreement_ratio: f64,
    /// Voting method used
    pub method: ConsensusMethod,
    /// Merged decision with provenance
    pub final_decision: FinalDecision,
    /// Final confidence score, in [0,1]
    pub final_confidence: f64,
    /// SHA3-256 hex of the canonical final decision JSON
    pub checksum: String,
    /// Per-node derived votes
    pub voting_results: HashMap<String, NodeVote>,
    /// Resolution status
    pub status: ConsensusStatus,
    /// Why review is required, when it is
    pub review_reason: Option<String>,
}

impl ConsensusResult {
    /// Recompute the checksum and compare against the stored one.
    pub fn verify_checksum(&self) -> Result<bool> {
        Ok(checksum(&self.final_decision)? == self.checksum)
    }
}

/// Canonical JSON rendering: object keys sorted recursively.
fn canonicalize(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: BTreeMap<String, serde_json::Value> = map
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            serde_json::to_value(sorted).unwrap_or(serde_json::Value::Null)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(canonicalize).collect())
        }
        other => other,
    }
}

/// Content checksum of a final decision.
pub fn checksum(decision: &FinalDecision) -> Result<String> {
    let canonical = canonicalize(serde_json::to_value(decision)?);
    let serialized = serde_json::to_string(&canonical)?;
    Ok(Hash256::digest(serialized.as_bytes()).to_hex())
}

/// Resolves a round to a single consensus outcome.
pub struct ConsensusResolver {
    config: ConsensusConfig,
}

impl ConsensusResolver {
    /// Create a resolver with the given configuration.
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    /// Access the configuration.
    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Resolve a round.
    ///
    /// Votes are derived per proposal, tallied under `method`, and the
    /// approved payloads merged into one final decision.
    pub fn resolve(
        &self,
        decisions: &[NodeDecision],
        analysis: &GraphAnalysis,
        method: ConsensusMethod,
    ) -> Result<ConsensusResult> {
        // Derived votes, in submission order for deterministic tallies
        let votes: Vec<NodeVote> = decisions
            .iter()
            .map(|d| NodeVote {
                vote: assign_vote(d, analysis.conflict_level),
                weight: vote_weight(d, &self.config),
            })
            .collect();

        let ratio = agreement_ratio(&votes, method, &self.config);
        let reached = consensus_reached(ratio, method, &self.config);

        let approved: Vec<(&NodeDecision, f64)> = decisions
            .iter()
            .zip(votes.iter())
            .filter(|(_, v)| v.vote == VoteType::Approve)
            .map(|(d, v)| (d, v.weight))
            .collect();
        let final_decision = merge_approved(&approved);
        let checksum = checksum(&final_decision)?;

        let mean_confidence = if decisions.is_empty() {
            0.0
        } else {
            decisions.iter().map(|d| d.confidence).sum::<f64>() / decisions.len() as f64
        };
        let final_confidence =
            0.4 * mean_confidence + 0.4 * ratio + 0.2 * analysis.coherence_score;

        let (status, review_reason) = self.status_for(reached, ratio, method, &votes, analysis);

        let voting_results: HashMap<String, NodeVote> = decisions
            .iter()
            .zip(votes.iter())
            .map(|(d, v)| (d.node_id.clone(), *v))
            .collect();

        Ok(ConsensusResult {
            consensus_reached: reached,
            agreement_ratio: ratio,
            method,
            final_decision,
            final_confidence,
            checksum,
            voting_results,
            status,
            review_reason,
        })
    }

    fn status_for(
        &self,
        reached: bool,
        ratio: f64,
        method: ConsensusMethod,
        votes: &[NodeVote],
        analysis: &GraphAnalysis,
    ) -> (ConsensusStatus, Option<String>) {
        if reached {
            if analysis.conflict_level < 0.3 {
                return (ConsensusStatus::Approved, None);
            }
            return (
                ConsensusStatus::ReviewRequired,
                Some(format!(
                    "consensus reached but conflict level {:.2} requires review",
                    analysis.conflict_level
                )),
            );
        }

        // No-quorum is a legitimate review outcome, never an error
        if method == ConsensusMethod::Quorum {
            let participating = votes.iter().filter(|v| v.vote != VoteType::Abstain).count();
            let participation = if votes.is_empty() {
                0.0
            } else {
                participating as f64 / votes.len() as f64
            };
            if participation < self.config.quorum_threshold {
                return (
                    ConsensusStatus::ReviewRequired,
                    Some(format!(
                        "quorum not met: participation {:.2} below {:.2}",
                        participation, self.config.quorum_threshold
                    )),
                );
            }
        }

        (
            ConsensusStatus::ReviewRequired,
            Some(format!(
                "consensus not reached: agreement {:.2} below threshold",
                ratio
            )),
        )
    }
}

impl Default for ConsensusResolver {
    fn default() -> Self {
        Self::new(ConsensusConfig::default())
    }
}

/// Merge approved proposals into a single final decision.
///
/// One shared decision type merges payloads key-by-key (numbers averaged,
/// everything else first-seen). Mixed types select the heaviest proposal as
/// primary and list the rest as supporting.
fn merge_approved(approved: &[(&NodeDecision, f64)]) -> FinalDecision {
    if approved.is_empty() {
        return FinalDecision::none();
    }

    let participating: Vec<String> = approved.iter().map(|(d, _)| d.node_id.clone()).collect();
    let first_type = &approved[0].0.decision_type;
    let shared_type = approved.iter().all(|(d, _)| &d.decision_type == first_type);

    if shared_type {
        let mut payload = HashMap::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for (decision, _) in approved {
            for key in decision.payload.keys() {
                if !seen.insert(key.as_str()) {
                    continue;
                }
                payload.insert(key.clone(), merge_key(key, approved));
            }
        }

        return FinalDecision {
            decision_type: Some(first_type.clone()),
            payload,
            participating_nodes: participating,
            primary_node: None,
            supporting_nodes: Vec::new(),
        };
    }

    // Mixed types: heaviest vote wins, first submission breaks ties
    let mut primary = &approved[0];
    for candidate in &approved[1..] {
        if candidate.1 > primary.1 {
            primary = candidate;
        }
    }
    let primary_id = primary.0.node_id.clone();
    let supporting: Vec<String> = approved
        .iter()
        .map(|(d, _)| d.node_id.clone())
        .filter(|id| *id != primary_id)
        .collect();

    FinalDecision {
        decision_type: Some(primary.0.decision_type.clone()),
        payload: primary.0.payload.clone(),
        participating_nodes: participating,
        primary_node: Some(primary_id),
        supporting_nodes: supporting,
    }
}

/// Merge one payload key across approved proposals.
fn merge_key(key: &str, approved: &[(&NodeDecision, f64)]) -> serde_json::Value {
    let values: Vec<&serde_json::Value> = approved
        .iter()
        .filter_map(|(d, _)| d.payload.get(key))
        .collect();

    let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
    if !numbers.is_empty() && numbers.len() == values.len() {
        let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
        if mean.fract() == 0.0 && mean.abs() < i64::MAX as f64 {
            return serde_json::Value::from(mean as i64);
        }
        return serde_json::Value::from(mean);
    }

    // Non-numeric (or mixed): first-seen value wins
    values
        .first()
        .map(|v| (*v).clone())
        .unwrap_or(serde_json::Value::Null)
}
