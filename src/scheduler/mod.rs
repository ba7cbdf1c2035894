//! Task queue construction for the funding bot.
//!
//! This module turns a catalog of funding websites into a prioritized,
//! immutable queue of bot tasks:
//!
//! - **TargetSite**: A catalog entry (URL, priority, name)
//! - **BotTask**: A scheduled visit with a precomputed expected reward
//! - **TaskQueue**: The ordered queue, sorted once by `priority × expected_reward`
//!
//! # Example
//!
//! ```rust,ignore
//! use intellibot::scheduler::TaskQueue;
//!
//! let queue = TaskQueue::from_catalog();
//! for task in queue.tasks() {
//!     println!("{} {} ({})", task.id, task.url, task.weight());
//! }
//! ```

pub mod queue;
pub mod task;

pub use queue::{QueueError, QueueStatus, TaskQueue};
pub use task::{calculate_expected_reward, default_targets, BotTask, TargetSite};
