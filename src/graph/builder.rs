//! Decision graph construction.
//!
//! Turns a flat list of node proposals into a weighted, undirected
//! relationship graph (supports / conflicts / depends edges).

use crate::core::{now, Result, Timestamp};
use crate::proposal::{validate_decisions, NodeDecision};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Relationship between two proposals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Proposals reinforce each other
    Supports,
    /// Proposals are mutually exclusive
    Conflicts,
    /// One proposal requires the other
    Depends,
    /// No meaningful relationship (not recorded as an edge)
    Neutral,
}

/// One edge endpoint stored on a graph node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Connection {
    /// Neighbor node id
    pub target: String,
    /// Relationship type
    pub relation: RelationKind,
    /// Relationship strength, in [0,1]
    pub strength: f64,
}

/// A proposal wrapped with its derived weight and edges.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphNode {
    /// The underlying proposal
    pub decision: NodeDecision,
    /// Derived weight: (0.6 * confidence + 0.4 * expected_impact) * priority
    pub weight: f64,
    /// Edges to other nodes in this round
    pub connections: Vec<Connection>,
}

/// The full relationship graph for one round. Immutable after construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecisionGraph {
    /// All nodes in the round
    pub nodes: Vec<GraphNode>,
    /// Sum of node weights
    pub total_weight: f64,
    /// Number of related pairs (counted once per pair)
    pub interconnections: usize,
    /// Number of conflicting pairs
    pub conflict_count: usize,
    /// Number of supporting pairs
    pub support_count: usize,
    /// Construction timestamp
    pub built_at: Timestamp,
}

impl DecisionGraph {
    /// Look up a node by id.
    pub fn node(&self, node_id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.decision.node_id == node_id)
    }
}

/// Lookup table of mutually-opposing decision types.
///
/// Configurable at runtime so new antonym pairs can be added without code
/// changes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpposingTypes {
    pairs: HashSet<(String, String)>,
}

impl OpposingTypes {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            pairs: HashSet::new(),
        }
    }

    /// Create with the default antonym pairs.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.add_pair("scale-up", "scale-down");
        table.add_pair("increase-security", "reduce-restrictions");
        table.add_pair("optimize-speed", "optimize-security");
        table
    }

    /// Register an opposing pair (order-insensitive).
    pub fn add_pair(&mut self, a: &str, b: &str) {
        self.pairs.insert(Self::key(a, b));
    }

    /// Whether two decision types oppose each other.
    pub fn is_opposing(&self, a: &str, b: &str) -> bool {
        self.pairs.contains(&Self::key(a, b))
    }

    /// Number of registered pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn key(a: &str, b: &str) -> (String, String) {
        if a <= b {
            (a.to_string(), b.to_string())
        } else {
            (b.to_string(), a.to_string())
        }
    }
}

impl Default for OpposingTypes {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Shallow payload similarity, in [0,1].
///
/// 0.4 * key overlap ratio + 0.6 * equal value ratio over the union of
/// top-level keys. Values are compared as-is, one level deep. Two keyless
/// payloads sit in the neutral band.
pub fn payload_similarity(
    a: &HashMap<String, serde_json::Value>,
    b: &HashMap<String, serde_json::Value>,
) -> f64 {
    let larger = a.len().max(b.len());
    if larger == 0 {
        return 0.5;
    }

    let common: Vec<&String> = a.keys().filter(|k| b.contains_key(*k)).collect();
    let key_overlap = common.len() as f64 / larger as f64;

    let equal_value_ratio = if common.is_empty() {
        0.0
    } else {
        let equal = common.iter().filter(|k| a[**k] == b[**k]).count();
        equal as f64 / common.len() as f64
    };

    0.4 * key_overlap + 0.6 * equal_value_ratio
}

/// Builds a [`DecisionGraph`] from a round's proposals.
pub struct GraphBuilder {
    opposing: OpposingTypes,
}

impl GraphBuilder {
    /// Create a builder with the given opposing-types table.
    pub fn new(opposing: OpposingTypes) -> Self {
        Self { opposing }
    }

    /// Access the opposing-types table.
    pub fn opposing_types(&self) -> &OpposingTypes {
        &self.opposing
    }

    /// Build the graph for one round.
    ///
    /// Requires at least 2 proposals with in-range confidence and impact.
    pub fn build(&self, decisions: &[NodeDecision]) -> Result<DecisionGraph> {
        validate_decisions(decisions)?;

        let mut nodes: Vec<GraphNode> = decisions
            .iter()
            .map(|decision| GraphNode {
                weight: node_weight(decision),
                decision: decision.clone(),
                connections: Vec::new(),
            })
            .collect();

        let mut interconnections = 0;
        let mut conflict_count = 0;
        let mut support_count = 0;

        for i in 0..decisions.len() {
            for j in (i + 1)..decisions.len() {
                let (relation, strength) = self.classify(&decisions[i], &decisions[j]);
                if relation == RelationKind::Neutral {
                    continue;
                }

                interconnections += 1;
                match relation {
                    RelationKind::Conflicts => conflict_count += 1,
                    RelationKind::Supports => support_count += 1,
                    _ => {}
                }

                // Symmetric: both endpoints record the edge
                let id_i = decisions[i].node_id.clone();
                let id_j = decisions[j].node_id.clone();
                nodes[i].connections.push(Connection {
                    target: id_j,
                    relation,
                    strength,
                });
                nodes[j].connections.push(Connection {
                    target: id_i,
                    relation,
                    strength,
                });
            }
        }

        let total_weight = nodes.iter().map(|n| n.weight).sum();

        Ok(DecisionGraph {
            nodes,
            total_weight,
            interconnections,
            conflict_count,
            support_count,
            built_at: now(),
        })
    }

    /// Classify the relationship between two proposals.
    ///
    /// Strict precedence: explicit dependency, explicit conflict, same type,
    /// opposing-types table, payload similarity.
    fn classify(&self, a: &NodeDecision, b: &NodeDecision) -> (RelationKind, f64) {
        if a.dependencies.contains(&b.node_id) || b.dependencies.contains(&a.node_id) {
            return (RelationKind::Depends, 0.9);
        }

        if a.conflicts.contains(&b.node_id) || b.conflicts.contains(&a.node_id) {
            return (RelationKind::Conflicts, 0.9);
        }

        if a.decision_type == b.decision_type {
            return (RelationKind::Supports, 0.6);
        }

        if self.opposing.is_opposing(&a.decision_type, &b.decision_type) {
            return (RelationKind::Conflicts, 0.7);
        }

        let similarity = payload_similarity(&a.payload, &b.payload);
        if similarity > 0.7 {
            (RelationKind::Supports, similarity)
        } else if similarity < 0.3 {
            (RelationKind::Conflicts, 1.0 - similarity)
        } else {
            (RelationKind::Neutral, 0.0)
        }
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(OpposingTypes::with_defaults())
    }
}

/// Derived node weight: (0.6 * confidence + 0.4 * expected_impact) * priority.
pub fn node_weight(decision: &NodeDecision) -> f64 {
    (0.6 * decision.confidence + 0.4 * decision.expected_impact) * decision.priority
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(id: &str, decision_type: &str) -> NodeDecision {
        NodeDecision::new(id, id, decision_type)
            .with_confidence(0.8)
            .with_impact(0.6)
    }

    #[test]
    fn test_node_weight() {
        let decision = proposal("node-1", "scale-up");
        let weight = node_weight(&decision);
        assert!((weight - (0.6 * 0.8 + 0.4 * 0.6)).abs() < 1e-9);

        let boosted = proposal("node-2", "scale-up").with_priority(2.0);
        assert!((node_weight(&boosted) - 2.0 * weight).abs() < 1e-9);
    }

    #[test]
    fn test_same_type_supports() {
        let graph = GraphBuilder::default()
            .build(&[proposal("node-1", "scale-up"), proposal("node-2", "scale-up")])
            .unwrap();

        assert_eq!(graph.interconnections, 1);
        assert_eq!(graph.support_count, 1);
        assert_eq!(graph.conflict_count, 0);

        let edge = &graph.nodes[0].connections[0];
        assert_eq!(edge.relation, RelationKind::Supports);
        assert!((edge.strength - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_opposing_types_conflict() {
        let graph = GraphBuilder::default()
            .build(&[
                proposal("node-1", "scale-up"),
                proposal("node-2", "scale-down"),
            ])
            .unwrap();

        assert_eq!(graph.conflict_count, 1);
        let edge = &graph.nodes[1].connections[0];
        assert_eq!(edge.relation, RelationKind::Conflicts);
        assert!((edge.strength - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_dependency_beats_type_rules() {
        // Same type would normally be Supports; explicit dependency wins
        let a = proposal("node-1", "scale-up").depends_on("node-2");
        let b = proposal("node-2", "scale-up");
        let graph = GraphBuilder::default().build(&[a, b]).unwrap();

        let edge = &graph.nodes[0].connections[0];
        assert_eq!(edge.relation, RelationKind::Depends);
        assert!((edge.strength - 0.9).abs() < 1e-9);
        assert_eq!(graph.support_count, 0);
        assert_eq!(graph.conflict_count, 0);
        assert_eq!(graph.interconnections, 1);
    }

    #[test]
    fn test_explicit_conflict() {
        let a = proposal("node-1", "rebalance").conflicts_with("node-2");
        let b = proposal("node-2", "migrate");
        let graph = GraphBuilder::default().build(&[a, b]).unwrap();

        let edge = &graph.nodes[0].connections[0];
        assert_eq!(edge.relation, RelationKind::Conflicts);
        assert!((edge.strength - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_edges_are_symmetric() {
        let graph = GraphBuilder::default()
            .build(&[
                proposal("node-1", "scale-up"),
                proposal("node-2", "scale-down"),
            ])
            .unwrap();

        assert_eq!(graph.nodes[0].connections.len(), 1);
        assert_eq!(graph.nodes[1].connections.len(), 1);
        assert_eq!(graph.nodes[0].connections[0].target, "node-2");
        assert_eq!(graph.nodes[1].connections[0].target, "node-1");
    }

    #[test]
    fn test_payload_similarity_supports() {
        let a = proposal("node-1", "tune-cache")
            .with_payload("region", serde_json::json!("eu-west"))
            .with_payload("ttl", serde_json::json!(300));
        let b = proposal("node-2", "warm-cache")
            .with_payload("region", serde_json::json!("eu-west"))
            .with_payload("ttl", serde_json::json!(300));

        let similarity = payload_similarity(&a.payload, &b.payload);
        assert!(similarity > 0.7);

        let graph = GraphBuilder::default().build(&[a, b]).unwrap();
        let edge = &graph.nodes[0].connections[0];
        assert_eq!(edge.relation, RelationKind::Supports);
        assert!((edge.strength - similarity).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_payloads_conflict() {
        let a = proposal("node-1", "tune-cache").with_payload("ttl", serde_json::json!(300));
        let b = proposal("node-2", "warm-cache").with_payload("region", serde_json::json!("eu"));

        let similarity = payload_similarity(&a.payload, &b.payload);
        assert!(similarity < 0.3);

        let graph = GraphBuilder::default().build(&[a, b]).unwrap();
        let edge = &graph.nodes[0].connections[0];
        assert_eq!(edge.relation, RelationKind::Conflicts);
        assert!((edge.strength - (1.0 - similarity)).abs() < 1e-9);
    }

    #[test]
    fn test_empty_payloads_are_neutral() {
        let graph = GraphBuilder::default()
            .build(&[proposal("node-1", "tune-cache"), proposal("node-2", "warm-cache")])
            .unwrap();

        assert_eq!(graph.interconnections, 0);
        assert!(graph.nodes[0].connections.is_empty());
    }

    #[test]
    fn test_midband_similarity_is_neutral() {
        // Full key overlap, no equal values: 0.4 * 1.0 + 0.6 * 0.0 = 0.4
        let a = proposal("node-1", "tune-cache")
            .with_payload("region", serde_json::json!("eu"))
            .with_payload("ttl", serde_json::json!(300));
        let b = proposal("node-2", "warm-cache")
            .with_payload("region", serde_json::json!("us"))
            .with_payload("ttl", serde_json::json!(600));

        let similarity = payload_similarity(&a.payload, &b.payload);
        assert!((similarity - 0.4).abs() < 1e-9);

        let graph = GraphBuilder::default().build(&[a, b]).unwrap();
        assert_eq!(graph.interconnections, 0);
    }

    #[test]
    fn test_build_validates_inputs() {
        let bad = vec![
            proposal("node-1", "scale-up").with_confidence(2.0),
            proposal("node-2", "scale-up"),
        ];
        assert!(GraphBuilder::default().build(&bad).is_err());
    }

    #[test]
    fn test_opposing_table_is_configurable() {
        let mut opposing = OpposingTypes::with_defaults();
        opposing.add_pair("open-gate", "close-gate");
        assert!(opposing.is_opposing("close-gate", "open-gate"));

        let builder = GraphBuilder::new(opposing);
        let graph = builder
            .build(&[
                proposal("node-1", "open-gate"),
                proposal("node-2", "close-gate"),
            ])
            .unwrap();
        assert_eq!(graph.conflict_count, 1);
    }

    #[test]
    fn test_total_weight_accumulates() {
        let decisions = vec![proposal("node-1", "scale-up"), proposal("node-2", "scale-up")];
        let graph = GraphBuilder::default().build(&decisions).unwrap();
        let expected: f64 = decisions.iter().map(node_weight).sum();
        assert!((graph.total_weight - expected).abs() < 1e-9);
    }
}
