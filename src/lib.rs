//! # FEDRA - Federated Decision Resolution & Arbitration
//!
//! A multi-node decision consensus and governance pipeline:
//! - **Graph**: weighted relationship graph over node proposals
//! - **Consensus**: interchangeable voting methods with deterministic
//!   payload merging and content checksums
//! - **Orchestrator**: round state machine with governance reconciliation
//!   and pluggable persistence
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fedra::governance::StaticGate;
//! use fedra::orchestrator::{Orchestrator, RoundRequest};
//! use fedra::proposal::NodeDecision;
//! use fedra::store::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let orchestrator = Orchestrator::new(
//!         Arc::new(StaticGate::approving()),
//!         Arc::new(MemoryStore::new()),
//!     );
//!
//!     let round = RoundRequest::new(
//!         "node-1",
//!         "scale-up",
//!         vec![
//!             NodeDecision::new("node-1", "edge-alpha", "scale-up")
//!                 .with_confidence(0.9)
//!                 .with_impact(0.8),
//!             NodeDecision::new("node-2", "edge-beta", "scale-up")
//!                 .with_confidence(0.85)
//!                 .with_impact(0.7),
//!         ],
//!     );
//!
//!     let result = orchestrator.orchestrate(round).await.unwrap();
//!     println!("{}: {}", result.consensus_id, result.status);
//! }
//! ```

pub mod consensus;
pub mod core;
pub mod governance;
pub mod graph;
pub mod orchestrator;
pub mod proposal;
pub mod store;

pub use crate::core::error::{Error, Result};
