//! CLI command definitions for intellibot.
//!
//! This module exposes the bot system from the command line: running the
//! simulated bots, inspecting the prioritized queue, and listing stored
//! opportunities.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::info;

use crate::config::BotConfig;
use crate::runner::{BotController, RunSummary};
use crate::scheduler::{BotTask, TaskQueue};
use crate::storage::{
    DonorOpportunity, InMemoryOpportunityStore, OpportunityFilter, OpportunityStore,
    SqliteOpportunityStore,
};

/// Simulated funding-opportunity discovery bots.
#[derive(Parser)]
#[command(name = "intellibot")]
#[command(about = "Run simulated funding-opportunity discovery bots")]
#[command(version)]
#[command(
    long_about = "intellibot builds a prioritized queue of funding websites and runs simulated discovery bots over it.\n\nDiscovered opportunities are synthetic and are saved to an in-memory or SQLite store.\n\nExample usage:\n  intellibot run --seed 42 --no-delay --database ./opportunities.db"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the bot system over the prioritized queue.
    Run(RunArgs),

    /// Print the prioritized task queue.
    Queue(QueueArgs),

    /// Print the queue status.
    Status(QueueArgs),

    /// List opportunities stored in a database.
    #[command(alias = "ls")]
    List(ListArgs),
}

/// Arguments for `intellibot run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Seed for the random source (reproducible runs).
    #[arg(long)]
    pub seed: Option<u64>,

    /// YAML or JSON file of targets replacing the built-in catalog.
    #[arg(short = 't', long)]
    pub targets: Option<PathBuf>,

    /// SQLite database to save opportunities to (default: in-memory).
    #[arg(short = 'd', long)]
    pub database: Option<String>,

    /// Skip all pacing delays.
    #[arg(long)]
    pub no_delay: bool,

    /// Score at or above which a screenshot is awarded.
    #[arg(long)]
    pub screenshot_threshold: Option<u32>,

    /// Output the run summary as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `intellibot queue` and `intellibot status`.
#[derive(Parser, Debug)]
pub struct QueueArgs {
    /// YAML or JSON file of targets replacing the built-in catalog.
    #[arg(short = 't', long)]
    pub targets: Option<PathBuf>,

    /// Output as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `intellibot list`.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// SQLite database to read from.
    #[arg(short = 'd', long, env = "INTELLIBOT_DATABASE_URL")]
    pub database: String,

    /// Only show this sector.
    #[arg(long)]
    pub sector: Option<String>,

    /// Only show this country.
    #[arg(long)]
    pub country: Option<String>,

    /// Only show verified opportunities.
    #[arg(long)]
    pub verified_only: bool,

    /// Maximum number of records.
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: usize,

    /// Number of records to skip.
    #[arg(long, default_value = "0")]
    pub offset: usize,

    /// Output as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_bot_command(args).await,
        Commands::Queue(args) => run_queue_command(args),
        Commands::Status(args) => run_status_command(args),
        Commands::List(args) => run_list_command(args).await,
    }
}

// ============================================================================
// Command Implementation
// ============================================================================

/// Merges `run` flags over environment configuration.
fn build_run_config(args: &RunArgs) -> anyhow::Result<BotConfig> {
    let mut config = BotConfig::from_env().context("Invalid environment configuration")?;

    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(ref targets) = args.targets {
        config.targets_file = Some(targets.clone());
    }
    if let Some(ref database) = args.database {
        config.database_path = Some(database.clone());
    }
    if args.no_delay {
        config.pacing = false;
    }
    if let Some(threshold) = args.screenshot_threshold {
        config.screenshot_threshold = threshold;
    }

    config.validate()?;
    Ok(config)
}

async fn open_store(database: Option<&str>) -> anyhow::Result<Arc<dyn OpportunityStore>> {
    match database {
        Some(path) => {
            let store = SqliteOpportunityStore::open(path)
                .await
                .with_context(|| format!("Failed to open database '{}'", path))?;
            Ok(Arc::new(store))
        }
        None => {
            info!("No database configured, using in-memory store");
            Ok(Arc::new(InMemoryOpportunityStore::new()))
        }
    }
}

fn load_queue(targets: Option<&PathBuf>) -> anyhow::Result<TaskQueue> {
    match targets {
        Some(path) => Ok(TaskQueue::from_targets_file(path)?),
        None => Ok(TaskQueue::from_catalog()),
    }
}

async fn run_bot_command(args: RunArgs) -> anyhow::Result<()> {
    let config = build_run_config(&args)?;
    let store = open_store(config.database_path.as_deref()).await?;
    let mut controller = BotController::from_config(config, store)?;

    let summary = controller.run_bot_system().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Bot System Results");
    println!("  Tasks processed:     {}", summary.tasks_processed);
    println!("  Failed tasks:        {}", summary.failed_tasks);
    println!("  Total score:         {}", summary.total_score);
    println!("  Total opportunities: {}", summary.total_opportunities);
    println!("  Opportunities saved: {}", summary.opportunities_saved);
    println!("  Screenshots earned:  {}", summary.screenshots_earned);
    println!("  Average score:       {:.1}", summary.average_score());
    println!();
    for result in &summary.results {
        println!(
            "  {:<22} score {:>4}  opportunities {}  clicks {}  {}",
            result.bot_id,
            result.score,
            result.opportunities.len(),
            result.clicks_performed,
            result.url
        );
    }
}

#[derive(Debug, Serialize)]
struct QueueEntry<'a> {
    #[serde(flatten)]
    task: &'a BotTask,
    weight: i64,
}

fn run_queue_command(args: QueueArgs) -> anyhow::Result<()> {
    let queue = load_queue(args.targets.as_ref())?;

    if args.json {
        let entries: Vec<QueueEntry<'_>> = queue
            .tasks()
            .iter()
            .map(|task| QueueEntry {
                task,
                weight: task.weight(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!(
        "{:<4} {:<8} {:>8} {:>7} {:>7}  URL",
        "#", "ID", "PRIORITY", "REWARD", "WEIGHT"
    );
    for (position, task) in queue.tasks().iter().enumerate() {
        println!(
            "{:<4} {:<8} {:>8} {:>7} {:>7}  {}",
            position + 1,
            task.id,
            task.priority,
            task.expected_reward,
            task.weight(),
            task.url
        );
    }
    Ok(())
}

fn run_status_command(args: QueueArgs) -> anyhow::Result<()> {
    let queue = load_queue(args.targets.as_ref())?;
    let status = queue.get_queue_status();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!(
            "total: {}  completed: {}  pending: {}",
            status.total, status.completed, status.pending
        );
    }
    Ok(())
}

fn build_filter(args: &ListArgs) -> OpportunityFilter {
    let mut filter = OpportunityFilter::new()
        .with_limit(args.limit)
        .with_offset(args.offset);
    if let Some(ref sector) = args.sector {
        filter = filter.with_sector(sector);
    }
    if let Some(ref country) = args.country {
        filter = filter.with_country(country);
    }
    if args.verified_only {
        filter = filter.verified_only();
    }
    filter
}

async fn run_list_command(args: ListArgs) -> anyhow::Result<()> {
    let store = SqliteOpportunityStore::open(&args.database)
        .await
        .with_context(|| format!("Failed to open database '{}'", args.database))?;
    let opportunities = store.list_opportunities(&build_filter(&args)).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&opportunities)?);
        return Ok(());
    }

    if opportunities.is_empty() {
        println!("No opportunities found");
        return Ok(());
    }
    for opportunity in &opportunities {
        print_opportunity(opportunity);
    }
    Ok(())
}

fn print_opportunity(opportunity: &DonorOpportunity) {
    println!(
        "{}  {} [{}] {}-{} {}  ({})",
        opportunity.id,
        opportunity.title,
        opportunity.sector,
        opportunity.amount_min,
        opportunity.amount_max,
        opportunity.currency,
        opportunity.source_name
    );
}
