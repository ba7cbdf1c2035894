//! Opportunity storage collaborators.
//!
//! The bot runner hands every synthetic opportunity to an
//! [`OpportunityStore`]. Two implementations are provided:
//!
//! - **InMemoryOpportunityStore**: process-local, used by default and in tests
//! - **SqliteOpportunityStore**: persistent store backed by SQLite via sqlx
//!
//! Both treat the content hash as a unique key and reject duplicates.
//!
//! # Usage
//!
//! ```rust,ignore
//! use intellibot::storage::{OpportunityFilter, OpportunityStore, SqliteOpportunityStore};
//!
//! let store = SqliteOpportunityStore::open("opportunities.db").await?;
//! let health = store
//!     .list_opportunities(&OpportunityFilter::new().with_sector("Health"))
//!     .await?;
//! ```

pub mod memory;
pub mod sqlite;
pub mod types;

use async_trait::async_trait;

pub use memory::InMemoryOpportunityStore;
pub use sqlite::{BotTotals, SqliteOpportunityStore};
pub use types::{
    content_hash, BotRunStats, DonorOpportunity, NewDonorOpportunity, OpportunityFilter,
    StorageError, StorageResult,
};

/// Persistence collaborator for discovered opportunities.
///
/// Implementations serialize their own writes; callers await one call at a
/// time.
#[async_trait]
pub trait OpportunityStore: Send + Sync {
    /// Persists a new opportunity and returns the stored record.
    ///
    /// Fails with [`StorageError::Duplicate`] if a record with the same
    /// content hash already exists.
    async fn create_donor_opportunity(
        &self,
        record: NewDonorOpportunity,
    ) -> StorageResult<DonorOpportunity>;

    /// Records the statistics of one bot run.
    async fn update_bot_stats(&self, stats: &BotRunStats) -> StorageResult<()>;

    /// Lists stored opportunities in insertion order.
    async fn list_opportunities(
        &self,
        filter: &OpportunityFilter,
    ) -> StorageResult<Vec<DonorOpportunity>>;
}
