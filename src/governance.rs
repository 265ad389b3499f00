//! Governance gate boundary.
//!
//! The policy kernel behind this interface is an external collaborator; the
//! pipeline only consumes its verdict.

use crate::core::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Verdict status returned by the governance collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceStatus {
    /// Policy check passed
    Approved,
    /// Policy check failed
    Rejected,
    /// Decision deferred; treated as non-approval
    Pending,
}

/// A governance verdict with an optional reason.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GovernanceVerdict {
    /// Verdict status
    pub status: GovernanceStatus,
    /// Optional explanation
    pub reason: Option<String>,
}

impl GovernanceVerdict {
    /// Create an approved verdict.
    pub fn approved() -> Self {
        Self {
            status: GovernanceStatus::Approved,
            reason: None,
        }
    }

    /// Create a rejected verdict with a reason.
    pub fn rejected(reason: &str) -> Self {
        Self {
            status: GovernanceStatus::Rejected,
            reason: Some(reason.to_string()),
        }
    }

    /// Whether the verdict approves the decision. Pending is non-approval.
    pub fn is_approved(&self) -> bool {
        self.status == GovernanceStatus::Approved
    }
}

/// Policy gate consulted before a round's outcome is persisted.
#[async_trait]
pub trait GovernanceGate: Send + Sync {
    /// Submit a decision for policy review.
    async fn submit_decision(
        &self,
        initiator: &str,
        action_key: &str,
        context: &HashMap<String, serde_json::Value>,
    ) -> Result<GovernanceVerdict>;
}

/// Gate returning a fixed verdict. Useful for wiring and tests.
pub struct StaticGate {
    verdict: GovernanceVerdict,
}

impl StaticGate {
    /// Create a gate with a fixed verdict.
    pub fn new(verdict: GovernanceVerdict) -> Self {
        Self { verdict }
    }

    /// Gate that approves everything.
    pub fn approving() -> Self {
        Self::new(GovernanceVerdict::approved())
    }

    /// Gate that rejects everything.
    pub fn rejecting(reason: &str) -> Self {
        Self::new(GovernanceVerdict::rejected(reason))
    }
}

#[async_trait]
impl GovernanceGate for StaticGate {
    async fn submit_decision(
        &self,
        _initiator: &str,
        _action_key: &str,
        _context: &HashMap<String, serde_json::Value>,
    ) -> Result<GovernanceVerdict> {
        Ok(self.verdict.clone())
    }
}
