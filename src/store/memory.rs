//! In-memory store backend.
//!
//! Keeps rounds in process memory. Suitable for tests and single-process
//! deployments; durable backends implement the same trait.

use crate::core::{Error, Result};
use crate::orchestrator::OrchestrationResult;
use crate::store::{ConsensusStore, StatusUpdate, StoreStatistics};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    records: HashMap<String, OrchestrationResult>,
    order: Vec<String>,
}

/// In-memory [`ConsensusStore`] backend.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rounds.
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}

#[async_trait]
impl ConsensusStore for MemoryStore {
    async fn store(&self, result: &OrchestrationResult) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.records.contains_key(&result.consensus_id) {
            return Err(Error::PersistenceFailure(format!(
                "duplicate consensus id: {}",
                result.consensus_id
            )));
        }
        inner.order.push(result.consensus_id.clone());
        inner
            .records
            .insert(result.consensus_id.clone(), result.clone());
        Ok(())
    }

    async fn get(&self, consensus_id: &str) -> Result<Option<OrchestrationResult>> {
        Ok(self.inner.read().await.records.get(consensus_id).cloned())
    }

    async fn update_status(
        &self,
        consensus_id: &str,
        update: StatusUpdate,
    ) -> Result<OrchestrationResult> {
        let mut inner = self.inner.write().await;
        let record = inner
            .records
            .get_mut(consensus_id)
            .ok_or_else(|| Error::ConsensusNotFound(consensus_id.to_string()))?;

        // Only the mutable status fields; consensus numbers stay untouched
        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(results) = update.execution_results {
            record.execution_results = Some(results);
        }
        if let Some(broadcast) = update.broadcast_status {
            record.broadcast_status = Some(broadcast);
        }

        Ok(record.clone())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<OrchestrationResult>> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .rev()
            .take(limit)
            .filter_map(|id| inner.records.get(id).cloned())
            .collect())
    }

    async fn aggregate_statistics(&self) -> Result<StoreStatistics> {
        let inner = self.inner.read().await;
        let mut stats = StoreStatistics::default();

        for record in inner.records.values() {
            stats.total_rounds += 1;
            match record.status {
                crate::consensus::ConsensusStatus::Approved => stats.approved += 1,
                crate::consensus::ConsensusStatus::ReviewRequired => stats.review_required += 1,
                crate::consensus::ConsensusStatus::Rejected => stats.rejected += 1,
            }
            if record.governance_approved {
                stats.governance_approved += 1;
            }
            stats.average_agreement += record.consensus.agreement_ratio;
            stats.average_confidence += record.consensus.final_confidence;
        }

        if stats.total_rounds > 0 {
            stats.average_agreement /= stats.total_rounds as f64;
            stats.average_confidence /= stats.total_rounds as f64;
        }

        Ok(stats)
    }
}
