//! Node decision proposals.
//!
//! Input format for a consensus round: one proposal per participating node.

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

fn default_priority() -> f64 {
    1.0
}

/// A decision proposed by a single federation node for one round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeDecision {
    /// Proposing node identifier
    pub node_id: String,
    /// Human-readable node name
    pub node_name: String,
    /// Free-form decision category (e.g. "scale-up")
    pub decision_type: String,
    /// Arbitrary structured data specific to the decision type
    #[serde(default)]
    pub payload: HashMap<String, serde_json::Value>,
    /// The node's own certainty, in [0,1]
    pub confidence: f64,
    /// The node's own estimate of effect magnitude, in [0,1]
    pub expected_impact: f64,
    /// Weight multiplier (default 1.0)
    #[serde(default = "default_priority")]
    pub priority: f64,
    /// Node ids this proposal explicitly depends on
    #[serde(default)]
    pub dependencies: HashSet<String>,
    /// Node ids this proposal explicitly conflicts with
    #[serde(default)]
    pub conflicts: HashSet<String>,
}

impl NodeDecision {
    /// Create a new proposal.
    pub fn new(node_id: &str, node_name: &str, decision_type: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            node_name: node_name.to_string(),
            decision_type: decision_type.to_string(),
            payload: HashMap::new(),
            confidence: 0.0,
            expected_impact: 0.0,
            priority: 1.0,
            dependencies: HashSet::new(),
            conflicts: HashSet::new(),
        }
    }

    /// Set confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set expected impact.
    pub fn with_impact(mut self, expected_impact: f64) -> Self {
        self.expected_impact = expected_impact;
        self
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    /// Add a payload entry.
    pub fn with_payload(mut self, key: &str, value: serde_json::Value) -> Self {
        self.payload.insert(key.to_string(), value);
        self
    }

    /// Declare an explicit dependency on another node's proposal.
    pub fn depends_on(mut self, node_id: &str) -> Self {
        self.dependencies.insert(node_id.to_string());
        self
    }

    /// Declare an explicit conflict with another node's proposal.
    pub fn conflicts_with(mut self, node_id: &str) -> Self {
        self.conflicts.insert(node_id.to_string());
        self
    }

    /// Validate range invariants.
    ///
    /// Out-of-range values are a validation error, never a silent clamp.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::FieldOutOfRange {
                node: self.node_id.clone(),
                field: "confidence",
                value: self.confidence,
            });
        }
        if !(0.0..=1.0).contains(&self.expected_impact) {
            return Err(Error::FieldOutOfRange {
                node: self.node_id.clone(),
                field: "expected_impact",
                value: self.expected_impact,
            });
        }
        Ok(())
    }
}

/// Validate a full round's proposal list.
pub fn validate_decisions(decisions: &[NodeDecision]) -> Result<()> {
    if decisions.len() < 2 {
        return Err(Error::InsufficientDecisions(decisions.len()));
    }
    for decision in decisions {
        decision.validate()?;
    }
    Ok(())
}
