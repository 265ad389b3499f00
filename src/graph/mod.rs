//! Decision Graph Module
//!
//! Builds and analyzes the weighted relationship graph for a round:
//! - Graph construction from node proposals
//! - Conflict / coherence analysis and recommendations

pub mod analyzer;
pub mod builder;

pub use analyzer::{analyze, ConflictingPair, GraphAnalysis};
pub use builder::{
    node_weight, payload_similarity, Connection, DecisionGraph, GraphBuilder, GraphNode,
    OpposingTypes, RelationKind,
};
