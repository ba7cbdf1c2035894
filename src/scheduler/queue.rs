//! Prioritized task queue.
//!
//! The queue is built once from a target catalog and sorted by
//! `priority × expected_reward` in descending order. Equal weights keep
//! their catalog order. The queue is never re-sorted afterwards.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use super::task::{default_targets, BotTask, TargetSite};

/// Errors that can occur while building the queue.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The targets file could not be read.
    #[error("Failed to read targets file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The targets file is not valid YAML.
    #[error("Failed to parse targets file '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The targets file is not valid JSON.
    #[error("Failed to parse targets file '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A target entry is unusable.
    #[error("Invalid target #{index}: {reason}")]
    InvalidTarget { index: usize, reason: String },

    /// The catalog contained no targets.
    #[error("Target catalog is empty")]
    EmptyCatalog,
}

/// Snapshot of queue progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    /// Number of tasks in the queue.
    pub total: usize,
    /// Tasks completed. Not tracked; always 0.
    pub completed: usize,
    /// Tasks pending.
    pub pending: usize,
}

/// Immutable, priority-ordered list of bot tasks.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    tasks: Vec<BotTask>,
}

impl TaskQueue {
    /// Builds a queue from the given targets.
    ///
    /// Task ids follow catalog order; the resulting queue is ordered by
    /// descending weight with a stable sort.
    pub fn build(targets: &[TargetSite]) -> Self {
        let mut tasks: Vec<BotTask> = targets
            .iter()
            .enumerate()
            .map(|(index, target)| BotTask::from_target(index, target))
            .collect();

        tasks.sort_by(|a, b| b.weight().cmp(&a.weight()));

        info!(count = tasks.len(), "Initialized task queue");
        Self { tasks }
    }

    /// Builds a queue from the compiled-in catalog.
    pub fn from_catalog() -> Self {
        Self::build(&default_targets())
    }

    /// Builds a queue from a YAML or JSON targets file.
    ///
    /// Files ending in `.json` are parsed as JSON; anything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the file cannot be read or parsed, if it
    /// holds no targets, or if a target has an empty URL.
    pub fn from_targets_file(path: impl AsRef<Path>) -> Result<Self, QueueError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| QueueError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let targets: Vec<TargetSite> = if is_json {
            serde_json::from_str(&content).map_err(|source| QueueError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|source| QueueError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };

        validate_targets(&targets)?;
        Ok(Self::build(&targets))
    }

    /// Returns a copy of the ordered tasks.
    pub fn get_task_queue(&self) -> Vec<BotTask> {
        self.tasks.clone()
    }

    /// Returns the ordered tasks without copying.
    pub fn tasks(&self) -> &[BotTask] {
        &self.tasks
    }

    /// Returns the queue status.
    pub fn get_queue_status(&self) -> QueueStatus {
        QueueStatus {
            total: self.tasks.len(),
            completed: 0,
            pending: self.tasks.len(),
        }
    }

    /// Number of tasks in the queue.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if the queue holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

fn validate_targets(targets: &[TargetSite]) -> Result<(), QueueError> {
    if targets.is_empty() {
        return Err(QueueError::EmptyCatalog);
    }

    for (index, target) in targets.iter().enumerate() {
        if target.url.trim().is_empty() {
            return Err(QueueError::InvalidTarget {
                index: index + 1,
                reason: "url cannot be empty".to_string(),
            });
        }
    }

    Ok(())
}
