//! Error types for bot runs.
//!
//! Subsystem errors live next to their code:
//! - `scheduler::QueueError` for target catalog loading
//! - `storage::StorageError` for the opportunity store
//! - `config::ConfigError` for configuration
//!
//! [`BotError`] is the per-task error the runner catches and logs. Storage
//! failures during a task are logged where they happen and never abort it.

use thiserror::Error;

/// Errors that can occur while processing a single bot task.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("Invalid task '{id}': {reason}")]
    InvalidTask { id: String, reason: String },
}
