//! Graph analysis.
//!
//! Derives scalar signals from a built [`DecisionGraph`]: conflict level,
//! coherence, critical nodes, conflicting pairs, and advisory
//! recommendations. Pure and read-only.

use crate::graph::builder::{DecisionGraph, RelationKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A pair of conflicting proposals with a human-readable reason.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConflictingPair {
    /// First node id
    pub node_a: String,
    /// Second node id
    pub node_b: String,
    /// Why the pair conflicts
    pub reason: String,
}

/// Read-only signals derived from one round's graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphAnalysis {
    /// Fraction of edges that are conflicts, in [0,1]
    pub conflict_level: f64,
    /// Fraction of edges that are supports, in [0,1]
    pub coherence_score: f64,
    /// Node ids with weight > 0.7, descending by weight
    pub critical_nodes: Vec<String>,
    /// Conflicting pairs, one entry per unordered pair
    pub conflicting_pairs: Vec<ConflictingPair>,
    /// Advisory text. Informational only, never gates the numeric result.
    pub recommendations: Vec<String>,
}

/// Analyze a built graph.
pub fn analyze(graph: &DecisionGraph) -> GraphAnalysis {
    let (conflict_level, coherence_score) = if graph.interconnections == 0 {
        // Independent decisions are trivially coherent
        (0.0, 1.0)
    } else {
        (
            graph.conflict_count as f64 / graph.interconnections as f64,
            graph.support_count as f64 / graph.interconnections as f64,
        )
    };

    let critical_nodes = critical_nodes(graph);
    let conflicting_pairs = conflicting_pairs(graph);
    let recommendations = recommendations(
        graph,
        conflict_level,
        coherence_score,
        &critical_nodes,
        &conflicting_pairs,
    );

    GraphAnalysis {
        conflict_level,
        coherence_score,
        critical_nodes,
        conflicting_pairs,
        recommendations,
    }
}

fn critical_nodes(graph: &DecisionGraph) -> Vec<String> {
    let mut weighted: Vec<(&str, f64)> = graph
        .nodes
        .iter()
        .filter(|n| n.weight > 0.7)
        .map(|n| (n.decision.node_id.as_str(), n.weight))
        .collect();
    weighted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    weighted.into_iter().map(|(id, _)| id.to_string()).collect()
}

fn conflicting_pairs(graph: &DecisionGraph) -> Vec<ConflictingPair> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut pairs = Vec::new();

    for node in &graph.nodes {
        for conn in &node.connections {
            if conn.relation != RelationKind::Conflicts {
                continue;
            }
            let a = node.decision.node_id.clone();
            let b = conn.target.clone();
            let key = if a <= b {
                (a.clone(), b.clone())
            } else {
                (b.clone(), a.clone())
            };
            if !seen.insert(key) {
                continue;
            }

            let type_a = &node.decision.decision_type;
            let type_b = graph
                .node(&b)
                .map(|n| n.decision.decision_type.as_str())
                .unwrap_or_default();
            let reason = if type_a != type_b {
                format!("conflicting decision types: {} vs {}", type_a, type_b)
            } else {
                "incompatible configurations".to_string()
            };

            pairs.push(ConflictingPair {
                node_a: a,
                node_b: b,
                reason,
            });
        }
    }

    pairs
}

fn recommendations(
    graph: &DecisionGraph,
    conflict_level: f64,
    coherence_score: f64,
    critical_nodes: &[String],
    conflicting_pairs: &[ConflictingPair],
) -> Vec<String> {
    let mut out = Vec::new();

    if conflict_level > 0.5 {
        out.push("High conflict level detected; manual review recommended".to_string());
    } else if conflict_level >= 0.3 {
        out.push(format!(
            "Moderate conflicts; consider resolving {} conflicting pair(s)",
            conflicting_pairs.len()
        ));
    }

    if graph.interconnections > 0 {
        if coherence_score > 0.8 {
            out.push("Decisions are well-aligned".to_string());
        } else if coherence_score < 0.5 {
            out.push("Low coherence across decisions".to_string());
        }
    }

    if !critical_nodes.is_empty() {
        let top: Vec<&str> = critical_nodes.iter().take(3).map(String::as_str).collect();
        out.push(format!("Critical decisions from: {}", top.join(", ")));
    }

    if graph.interconnections == 0 {
        out.push("Decisions are independent and can execute in parallel".to_string());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::GraphBuilder;
    use crate::proposal::NodeDecision;

    fn proposal(id: &str, decision_type: &str, confidence: f64, impact: f64) -> NodeDecision {
        NodeDecision::new(id, id, decision_type)
            .with_confidence(confidence)
            .with_impact(impact)
    }

    fn build(decisions: &[NodeDecision]) -> DecisionGraph {
        GraphBuilder::default().build(decisions).unwrap()
    }

    #[test]
    fn test_pure_conflict_graph() {
        let graph = build(&[
            proposal("node-1", "scale-up", 0.9, 0.8),
            proposal("node-2", "scale-down", 0.9, 0.8),
        ]);
        let analysis = analyze(&graph);

        assert!((analysis.conflict_level - 1.0).abs() < 1e-9);
        assert!((analysis.coherence_score - 0.0).abs() < 1e-9);
        assert_eq!(analysis.conflicting_pairs.len(), 1);
        assert!(analysis.conflicting_pairs[0]
            .reason
            .contains("scale-up"));
    }

    #[test]
    fn test_no_interconnections_is_coherent() {
        let graph = build(&[
            proposal("node-1", "tune-cache", 0.5, 0.5),
            proposal("node-2", "warm-cache", 0.5, 0.5),
        ]);
        let analysis = analyze(&graph);

        assert_eq!(graph.interconnections, 0);
        assert!((analysis.conflict_level - 0.0).abs() < 1e-9);
        assert!((analysis.coherence_score - 1.0).abs() < 1e-9);
        assert!(analysis
            .recommendations
            .iter()
            .any(|r| r.contains("independent")));
    }

    #[test]
    fn test_conflicting_pairs_deduplicated() {
        // Edge is recorded on both endpoints; the pair must appear once
        let graph = build(&[
            proposal("node-1", "scale-up", 0.9, 0.8),
            proposal("node-2", "scale-down", 0.9, 0.8),
        ]);
        let analysis = analyze(&graph);
        assert_eq!(analysis.conflicting_pairs.len(), 1);
    }

    #[test]
    fn test_same_type_explicit_conflict_reason() {
        let a = proposal("node-1", "scale-up", 0.9, 0.8).conflicts_with("node-2");
        let b = proposal("node-2", "scale-up", 0.9, 0.8);
        let analysis = analyze(&build(&[a, b]));

        assert_eq!(analysis.conflicting_pairs.len(), 1);
        assert_eq!(
            analysis.conflicting_pairs[0].reason,
            "incompatible configurations"
        );
    }

    #[test]
    fn test_critical_nodes_sorted_descending() {
        let graph = build(&[
            proposal("node-low", "scale-up", 0.5, 0.5),  // weight 0.5
            proposal("node-mid", "scale-up", 0.9, 0.7),  // weight 0.82
            proposal("node-top", "scale-up", 1.0, 0.9),  // weight 0.96
        ]);
        let analysis = analyze(&graph);

        assert_eq!(analysis.critical_nodes, vec!["node-top", "node-mid"]);
    }

    #[test]
    fn test_well_aligned_recommendation() {
        let analysis = analyze(&build(&[
            proposal("node-1", "scale-up", 0.6, 0.5),
            proposal("node-2", "scale-up", 0.6, 0.5),
        ]));
        assert!(analysis
            .recommendations
            .iter()
            .any(|r| r.contains("well-aligned")));
    }

    #[test]
    fn test_high_conflict_recommendation() {
        let analysis = analyze(&build(&[
            proposal("node-1", "scale-up", 0.6, 0.5),
            proposal("node-2", "scale-down", 0.6, 0.5),
        ]));
        assert!(analysis
            .recommendations
            .iter()
            .any(|r| r.contains("manual review")));
    }

    #[test]
    fn test_moderate_conflict_recommendation() {
        // 3 supports between the scale-ups, 3 conflicts from node-4:
        // conflict level 0.5, inside the moderate band
        let decisions = vec![
            proposal("node-1", "scale-up", 0.6, 0.5),
            proposal("node-2", "scale-up", 0.6, 0.5),
            proposal("node-3", "scale-up", 0.6, 0.5),
            proposal("node-4", "scale-down", 0.6, 0.5).conflicts_with("node-1"),
        ];
        let graph = build(&decisions);
        let analysis = analyze(&graph);
        assert_eq!(graph.support_count, 3);
        assert_eq!(graph.conflict_count, 3);
        assert!(analysis.conflict_level >= 0.3 && analysis.conflict_level <= 0.5);
        assert!(analysis
            .recommendations
            .iter()
            .any(|r| r.contains("Moderate conflicts")));
    }

    #[test]
    fn test_recommendations_never_gate_numbers() {
        let graph = build(&[
            proposal("node-1", "scale-up", 0.9, 0.8),
            proposal("node-2", "scale-down", 0.9, 0.8),
        ]);
        let with_recs = analyze(&graph);
        assert!((with_recs.conflict_level - 1.0).abs() < 1e-9);
        assert!(!with_recs.recommendations.is_empty());
    }
}
