//! Sequential bot runner for funding-opportunity discovery.
//!
//! The runner visits each task of a [`TaskQueue`](crate::scheduler::TaskQueue)
//! in priority order and simulates a human-paced visit. Visits are simulations:
//! scores are randomized and opportunities are synthetic records keyed by
//! URL substring.
//!
//! # Architecture
//!
//! ```text
//! TaskQueue → BotController → BotSimulator → GeneratedOpportunity → OpportunityStore
//!                  │                │
//!                  └── Delay ◄──────┘
//! ```
//!
//! Collaborators are injected:
//! 1. The opportunity store persists records and per-bot statistics
//! 2. The delay effect paces the run (`TokioDelay`) or skips pacing (`InstantDelay`)
//! 3. The random source is a seedable `ChaCha8Rng`
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use intellibot::config::BotConfig;
//! use intellibot::runner::BotController;
//! use intellibot::storage::InMemoryOpportunityStore;
//!
//! let config = BotConfig::default().with_seed(42).without_pacing();
//! let store = Arc::new(InMemoryOpportunityStore::new());
//! let mut controller = BotController::from_config(config, store)?;
//!
//! let summary = controller.run_bot_system().await;
//! println!("Average score: {:.1}", summary.average_score());
//! ```

pub mod controller;
pub mod delay;
pub mod opportunities;
pub mod result;
pub mod simulator;

pub use controller::BotController;
pub use delay::{Delay, DelayProfile, DelayRange, InstantDelay, TokioDelay};
pub use opportunities::{generate_realistic_opportunities, GeneratedOpportunity};
pub use result::{BotResult, RunSummary, ScoreBreakdown};
pub use simulator::{ai_analysis_score, qualifies_for_screenshot, BotSimulator};
