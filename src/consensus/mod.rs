//! Consensus Module
//!
//! Resolves a round to a single outcome:
//! - Vote derivation from proposal confidence
//! - Four interchangeable voting methods
//! - Deterministic payload merging with a content checksum

pub mod resolver;
pub mod voting;

pub use resolver::{checksum, ConsensusResolver, ConsensusResult, ConsensusStatus, FinalDecision};
pub use voting::{ConsensusConfig, ConsensusMethod, NodeVote, VoteType};
