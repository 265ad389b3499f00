//! Vote derivation and agreement tallying.
//!
//! Nodes do not cast votes directly: each proposal's vote is derived from
//! its confidence and the round's conflict level, then tallied under one of
//! four interchangeable methods.

use crate::proposal::NodeDecision;
use serde::{Deserialize, Serialize};

/// Type of vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    /// Approve the proposal
    Approve,
    /// Reject the proposal
    Reject,
    /// Abstain from voting
    Abstain,
}

/// A derived vote with its weight, keyed by node id in the results map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeVote {
    /// Vote type
    pub vote: VoteType,
    /// Vote weight
    pub weight: f64,
}

/// Voting method for resolving a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsensusMethod {
    /// Approve weight over total weight
    WeightedVote,
    /// Every vote must approve
    Unanimous,
    /// Approve count over total count, unweighted
    Majority,
    /// Participation gate, then approve count over participating count
    Quorum,
}

impl Default for ConsensusMethod {
    fn default() -> Self {
        Self::WeightedVote
    }
}

impl std::fmt::Display for ConsensusMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsensusMethod::WeightedVote => write!(f, "weighted-vote"),
            ConsensusMethod::Unanimous => write!(f, "unanimous"),
            ConsensusMethod::Majority => write!(f, "majority"),
            ConsensusMethod::Quorum => write!(f, "quorum"),
        }
    }
}

/// Consensus configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Agreement ratio required to reach consensus (default 0.7)
    pub approval_threshold: f64,
    /// Minimum participating fraction for the quorum method (default 0.6)
    pub quorum_threshold: f64,
    /// Multiply vote weight by confidence (default true)
    pub weight_by_confidence: bool,
    /// Multiply vote weight by expected impact (default true)
    pub weight_by_impact: bool,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            approval_threshold: 0.7,
            quorum_threshold: 0.6,
            weight_by_confidence: true,
            weight_by_impact: true,
        }
    }
}

/// Derive a proposal's vote.
///
/// Low certainty abstains; middling certainty in a contentious round
/// rejects; everything else approves.
pub fn assign_vote(decision: &NodeDecision, conflict_level: f64) -> VoteType {
    if decision.confidence < 0.3 {
        VoteType::Abstain
    } else if decision.confidence < 0.5 && conflict_level > 0.5 {
        VoteType::Reject
    } else {
        VoteType::Approve
    }
}

/// Derive a proposal's vote weight.
///
/// Confidence enters twice with the defaults: once as the base weight and
/// once more through the weight-by-confidence multiplier, giving
/// confidence^2 * impact. The compounding emphasis on high-certainty,
/// high-impact proposals is intentional and kept as-is.
pub fn vote_weight(decision: &NodeDecision, config: &ConsensusConfig) -> f64 {
    let mut weight = decision.confidence;
    if config.weight_by_confidence {
        weight *= decision.confidence;
    }
    if config.weight_by_impact {
        weight *= decision.expected_impact;
    }
    weight
}

/// Compute the agreement ratio for a slice of derived votes.
///
/// Votes are tallied in input order so identical rounds produce identical
/// floating-point results.
pub fn agreement_ratio(
    votes: &[NodeVote],
    method: ConsensusMethod,
    config: &ConsensusConfig,
) -> f64 {
    match method {
        ConsensusMethod::WeightedVote => {
            let mut approve_weight = 0.0;
            let mut total_weight = 0.0;
            for vote in votes {
                total_weight += vote.weight;
                if vote.vote == VoteType::Approve {
                    approve_weight += vote.weight;
                }
            }
            if total_weight == 0.0 {
                0.0
            } else {
                approve_weight / total_weight
            }
        }
        ConsensusMethod::Unanimous => {
            if !votes.is_empty() && votes.iter().all(|v| v.vote == VoteType::Approve) {
                1.0
            } else {
                0.0
            }
        }
        ConsensusMethod::Majority => {
            if votes.is_empty() {
                0.0
            } else {
                let approve = votes.iter().filter(|v| v.vote == VoteType::Approve).count();
                approve as f64 / votes.len() as f64
            }
        }
        ConsensusMethod::Quorum => {
            if votes.is_empty() {
                return 0.0;
            }
            let participating = votes.iter().filter(|v| v.vote != VoteType::Abstain).count();
            let participation = participating as f64 / votes.len() as f64;
            if participation < config.quorum_threshold {
                return 0.0;
            }
            let approve = votes.iter().filter(|v| v.vote == VoteType::Approve).count();
            approve as f64 / participating as f64
        }
    }
}

/// Whether consensus is reached for the given ratio and method.
pub fn consensus_reached(ratio: f64, method: ConsensusMethod, config: &ConsensusConfig) -> bool {
    match method {
        ConsensusMethod::Unanimous => ratio == 1.0,
        _ => ratio >= config.approval_threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(confidence: f64, impact: f64) -> NodeDecision {
        NodeDecision::new("node-1", "node-1", "scale-up")
            .with_confidence(confidence)
            .with_impact(impact)
    }

    fn approve(weight: f64) -> NodeVote {
        NodeVote {
            vote: VoteType::Approve,
            weight,
        }
    }

    fn reject(weight: f64) -> NodeVote {
        NodeVote {
            vote: VoteType::Reject,
            weight,
        }
    }

    fn abstain() -> NodeVote {
        NodeVote {
            vote: VoteType::Abstain,
            weight: 0.0,
        }
    }

    #[test]
    fn test_low_confidence_abstains() {
        let d = decision(0.2, 0.9);
        assert_eq!(assign_vote(&d, 0.0), VoteType::Abstain);
        assert_eq!(assign_vote(&d, 1.0), VoteType::Abstain);
    }

    #[test]
    fn test_middling_confidence_rejects_in_contentious_round() {
        let d = decision(0.45, 0.9);
        assert_eq!(assign_vote(&d, 0.6), VoteType::Reject);
        assert_eq!(assign_vote(&d, 0.4), VoteType::Approve);
    }

    #[test]
    fn test_vote_weight_compounds_confidence() {
        let config = ConsensusConfig::default();
        let d = decision(0.8, 0.5);
        // 0.8 * 0.8 * 0.5
        assert!((vote_weight(&d, &config) - 0.32).abs() < 1e-9);
    }

    #[test]
    fn test_vote_weight_toggles() {
        let d = decision(0.8, 0.5);

        let config = ConsensusConfig {
            weight_by_confidence: false,
            ..Default::default()
        };
        assert!((vote_weight(&d, &config) - 0.4).abs() < 1e-9);

        let config = ConsensusConfig {
            weight_by_confidence: false,
            weight_by_impact: false,
            ..Default::default()
        };
        assert!((vote_weight(&d, &config) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_ratio() {
        let config = ConsensusConfig::default();
        let votes = vec![approve(0.6), approve(0.2), reject(0.2)];
        let ratio = agreement_ratio(&votes, ConsensusMethod::WeightedVote, &config);
        assert!((ratio - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_weighted_ratio_zero_total() {
        let config = ConsensusConfig::default();
        let votes = vec![approve(0.0), reject(0.0)];
        let ratio = agreement_ratio(&votes, ConsensusMethod::WeightedVote, &config);
        assert_eq!(ratio, 0.0);
    }

    #[test]
    fn test_unanimous_strictness() {
        let config = ConsensusConfig::default();

        let all = vec![approve(0.5), approve(0.5)];
        assert_eq!(
            agreement_ratio(&all, ConsensusMethod::Unanimous, &config),
            1.0
        );
        assert!(consensus_reached(1.0, ConsensusMethod::Unanimous, &config));

        let one_reject = vec![approve(0.5), reject(0.5)];
        assert_eq!(
            agreement_ratio(&one_reject, ConsensusMethod::Unanimous, &config),
            0.0
        );

        let one_abstain = vec![approve(0.5), abstain()];
        assert_eq!(
            agreement_ratio(&one_abstain, ConsensusMethod::Unanimous, &config),
            0.0
        );
        assert!(!consensus_reached(0.0, ConsensusMethod::Unanimous, &config));
    }

    #[test]
    fn test_majority_is_unweighted() {
        let config = ConsensusConfig::default();
        // Heavy reject loses on count
        let votes = vec![approve(0.1), approve(0.1), reject(5.0)];
        let ratio = agreement_ratio(&votes, ConsensusMethod::Majority, &config);
        assert!((ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_quorum_exactly_at_threshold_passes() {
        let config = ConsensusConfig::default();
        // 5 votes, 2 abstain: participation 0.6 == threshold
        let votes = vec![approve(0.5), approve(0.5), reject(0.5), abstain(), abstain()];
        let ratio = agreement_ratio(&votes, ConsensusMethod::Quorum, &config);
        assert!((ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_quorum_not_met() {
        let config = ConsensusConfig::default();
        // 5 votes, 3 abstain: participation 0.4 < 0.6
        let votes = vec![approve(0.5), approve(0.5), abstain(), abstain(), abstain()];
        let ratio = agreement_ratio(&votes, ConsensusMethod::Quorum, &config);
        assert_eq!(ratio, 0.0);
        assert!(!consensus_reached(ratio, ConsensusMethod::Quorum, &config));
    }

    #[test]
    fn test_ratio_bounds() {
        let config = ConsensusConfig::default();
        let votes = vec![approve(0.9), reject(0.1), abstain()];
        for method in [
            ConsensusMethod::WeightedVote,
            ConsensusMethod::Unanimous,
            ConsensusMethod::Majority,
            ConsensusMethod::Quorum,
        ] {
            let ratio = agreement_ratio(&votes, method, &config);
            assert!((0.0..=1.0).contains(&ratio), "{method}: {ratio}");
        }
    }

    #[test]
    fn test_method_serialization() {
        let json = serde_json::to_string(&ConsensusMethod::WeightedVote).unwrap();
        assert_eq!(json, "\"weighted-vote\"");
        let parsed: ConsensusMethod = serde_json::from_str("\"quorum\"").unwrap();
        assert_eq!(parsed, ConsensusMethod::Quorum);
    }

    #[test]
    fn test_default_method() {
        assert_eq!(ConsensusMethod::default(), ConsensusMethod::WeightedVote);
        assert_eq!(ConsensusMethod::default().to_string(), "weighted-vote");
    }
}
