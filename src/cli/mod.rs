//! Command-line interface for intellibot.
//!
//! Provides commands for running the bot system, inspecting the task queue,
//! and listing saved opportunities.

mod commands;

pub use commands::{parse_cli, run, run_with_cli, Cli, Commands};
