//! intellibot: simulated funding-opportunity discovery bots.
//!
//! This library builds a prioritized queue of funding websites, runs
//! simulated bot visits over it one at a time, and saves the discovered
//! opportunities to a pluggable store.

pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod scheduler;
pub mod storage;

pub use config::{BotConfig, ConfigError};
pub use error::BotError;
pub use runner::{BotController, BotResult, RunSummary};
pub use scheduler::{BotTask, QueueError, QueueStatus, TargetSite, TaskQueue};
pub use storage::{
    DonorOpportunity, InMemoryOpportunityStore, NewDonorOpportunity, OpportunityStore,
    SqliteOpportunityStore, StorageError,
};
