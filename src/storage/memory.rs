//! In-memory opportunity store.
//!
//! Used when no database is configured and as the default collaborator in
//! tests. Records are kept in insertion order and de-duplicated by content
//! hash, matching the unique constraint of the SQLite store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::types::{
    BotRunStats, DonorOpportunity, NewDonorOpportunity, OpportunityFilter, StorageError,
    StorageResult,
};
use super::OpportunityStore;

/// Opportunity store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryOpportunityStore {
    opportunities: RwLock<Vec<DonorOpportunity>>,
    bot_runs: RwLock<Vec<BotRunStats>>,
}

impl InMemoryOpportunityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored opportunities.
    pub async fn len(&self) -> usize {
        self.opportunities.read().await.len()
    }

    /// Returns true if no opportunities are stored.
    pub async fn is_empty(&self) -> bool {
        self.opportunities.read().await.is_empty()
    }

    /// Returns all recorded bot runs in order.
    pub async fn bot_runs(&self) -> Vec<BotRunStats> {
        self.bot_runs.read().await.clone()
    }
}

#[async_trait]
impl OpportunityStore for InMemoryOpportunityStore {
    async fn create_donor_opportunity(
        &self,
        record: NewDonorOpportunity,
    ) -> StorageResult<DonorOpportunity> {
        record.validate()?;

        let mut opportunities = self.opportunities.write().await;
        if opportunities
            .iter()
            .any(|existing| existing.content_hash == record.content_hash)
        {
            return Err(StorageError::Duplicate(record.content_hash));
        }

        let persisted = record.into_persisted();
        opportunities.push(persisted.clone());
        Ok(persisted)
    }

    async fn update_bot_stats(&self, stats: &BotRunStats) -> StorageResult<()> {
        self.bot_runs.write().await.push(stats.clone());
        Ok(())
    }

    async fn list_opportunities(
        &self,
        filter: &OpportunityFilter,
    ) -> StorageResult<Vec<DonorOpportunity>> {
        let opportunities = self.opportunities.read().await;
        Ok(opportunities
            .iter()
            .filter(|record| filter.matches(record))
            .skip(filter.offset)
            .take(filter.limit)
            .cloned()
            .collect())
    }
}
