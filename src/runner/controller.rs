//! Sequential bot runner.
//!
//! Visits every task of the queue exactly once, in queue order, and hands the
//! discovered opportunities to the opportunity store. Failures are contained
//! per task: a failed task scores zero and the run moves on.

use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info, warn};

use crate::config::BotConfig;
use crate::error::BotError;
use crate::scheduler::{BotTask, QueueError, QueueStatus, TaskQueue};
use crate::storage::{BotRunStats, OpportunityStore};

use super::delay::{Delay, InstantDelay, TokioDelay};
use super::opportunities::GeneratedOpportunity;
use super::result::{BotResult, RunSummary};
use super::simulator::BotSimulator;

/// Drives the bot system over a prioritized task queue.
pub struct BotController {
    queue: TaskQueue,
    store: Arc<dyn OpportunityStore>,
    delay: Arc<dyn Delay>,
    config: BotConfig,
    rng: ChaCha8Rng,
}

impl BotController {
    /// Creates a controller from explicit collaborators.
    ///
    /// The random source is seeded from `config.seed`, or from entropy when
    /// no seed is set.
    pub fn new(
        queue: TaskQueue,
        store: Arc<dyn OpportunityStore>,
        delay: Arc<dyn Delay>,
        config: BotConfig,
    ) -> Self {
        let rng = create_rng(config.seed);
        Self {
            queue,
            store,
            delay,
            config,
            rng,
        }
    }

    /// Creates a controller whose queue and delay effect follow `config`.
    ///
    /// # Errors
    ///
    /// Returns `QueueError` if the configured targets file cannot be loaded.
    pub fn from_config(
        config: BotConfig,
        store: Arc<dyn OpportunityStore>,
    ) -> Result<Self, QueueError> {
        let queue = match config.targets_file {
            Some(ref path) => TaskQueue::from_targets_file(path)?,
            None => TaskQueue::from_catalog(),
        };
        let delay: Arc<dyn Delay> = if config.pacing {
            Arc::new(TokioDelay)
        } else {
            Arc::new(InstantDelay)
        };
        Ok(Self::new(queue, store, delay, config))
    }

    /// Replaces the random source.
    pub fn with_rng(mut self, rng: ChaCha8Rng) -> Self {
        self.rng = rng;
        self
    }

    /// Returns a copy of the ordered tasks.
    pub fn get_task_queue(&self) -> Vec<BotTask> {
        self.queue.get_task_queue()
    }

    /// Returns the queue status.
    pub fn get_queue_status(&self) -> QueueStatus {
        self.queue.get_queue_status()
    }

    /// Runs every queued task once and logs the aggregate results.
    ///
    /// Never fails: per-task errors are logged and scored as zero.
    pub async fn run_bot_system(&mut self) -> RunSummary {
        let tasks = self.queue.get_task_queue();
        info!("Starting Intelligent Bot System");
        info!(count = tasks.len(), "Processing prioritized URLs");

        let mut summary = RunSummary::new();

        for task in &tasks {
            let bot_id = task.bot_id();
            info!(bot_id = %bot_id, url = %task.url, "Bot processing");

            match self.process_task(task, &mut summary).await {
                Ok(result) => {
                    info!(
                        bot_id = %bot_id,
                        score = result.score,
                        opportunities = result.opportunities.len(),
                        clicks = result.clicks_performed,
                        "Bot finished"
                    );
                    summary.record(result);
                }
                Err(e) => {
                    error!(bot_id = %bot_id, error = %e, "Bot error");
                    let stats = BotRunStats::new(bot_id.clone(), 0, 0, 0, false);
                    self.record_stats(&stats).await;
                    summary.record_failure(BotResult::failed(bot_id, task.url.clone()));
                }
            }

            let pause = self.config.delays.cooldown.sample(&mut self.rng);
            self.delay.delay(pause).await;
        }

        let average = format!("{:.1}", summary.average_score());
        info!(
            total_score = summary.total_score,
            total_opportunities = summary.total_opportunities,
            opportunities_saved = summary.opportunities_saved,
            screenshots_earned = summary.screenshots_earned,
            failed_tasks = summary.failed_tasks,
            average_score = %average,
            "Bot System Results"
        );

        summary
    }

    async fn process_task(
        &mut self,
        task: &BotTask,
        summary: &mut RunSummary,
    ) -> Result<BotResult, BotError> {
        let simulator = BotSimulator::new(self.delay.as_ref(), &self.config);
        let result = simulator.simulate(task, &mut self.rng).await?;

        if result.opportunities.is_empty() {
            info!(bot_id = %result.bot_id, url = %task.url, "Bot found no opportunities");
        } else {
            info!(
                bot_id = %result.bot_id,
                count = result.opportunities.len(),
                "Bot found opportunities, saving"
            );
            summary.opportunities_saved += self
                .save_opportunities(&result.opportunities, &task.url, &result.bot_id)
                .await;
        }

        let stats = BotRunStats::new(
            result.bot_id.clone(),
            result.score,
            result.opportunities.len() as u32,
            u32::from(result.has_screenshot()),
            true,
        );
        self.record_stats(&stats).await;

        Ok(result)
    }

    /// Records one bot run. A store failure is logged and does not affect the task.
    async fn record_stats(&self, stats: &BotRunStats) {
        match self.store.update_bot_stats(stats).await {
            Ok(()) => info!(
                bot_id = %stats.bot_id,
                score = stats.score,
                screenshots = stats.screenshots,
                reward_points = stats.reward_points,
                success = stats.success,
                "Stats updated"
            ),
            Err(e) => warn!(bot_id = %stats.bot_id, error = %e, "Failed to update bot stats"),
        }
    }

    /// Saves each opportunity, skipping the ones the store rejects.
    ///
    /// Returns the number saved.
    async fn save_opportunities(
        &self,
        opportunities: &[GeneratedOpportunity],
        source_url: &str,
        bot_id: &str,
    ) -> usize {
        let mut saved = 0;
        for opportunity in opportunities {
            let record = opportunity.to_record(source_url, bot_id);
            match self.store.create_donor_opportunity(record).await {
                Ok(stored) => {
                    info!(title = %stored.title, id = %stored.id, "Saved opportunity");
                    saved += 1;
                }
                Err(e) => {
                    warn!(title = %opportunity.title, error = %e, "Failed to save opportunity");
                }
            }
        }
        saved
    }
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_rng(&mut rand::rng()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::delay::DelayRange;
    use crate::scheduler::TargetSite;
    use crate::storage::{
        DonorOpportunity, InMemoryOpportunityStore, NewDonorOpportunity, OpportunityFilter,
        StorageError, StorageResult,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Delay that records requested durations instead of sleeping.
    #[derive(Default)]
    struct RecordingDelay {
        calls: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Delay for RecordingDelay {
        async fn delay(&self, duration: Duration) {
            self.calls.lock().expect("lock poisoned").push(duration);
        }
    }

    /// Store that fails on configured operations.
    struct FlakyStore {
        inner: InMemoryOpportunityStore,
        fail_titles: Vec<String>,
        fail_stats_for: Option<String>,
    }

    #[async_trait]
    impl OpportunityStore for FlakyStore {
        async fn create_donor_opportunity(
            &self,
            record: NewDonorOpportunity,
        ) -> StorageResult<DonorOpportunity> {
            if self.fail_titles.contains(&record.title) {
                return Err(StorageError::ConnectionFailed("store offline".to_string()));
            }
            self.inner.create_donor_opportunity(record).await
        }

        async fn update_bot_stats(&self, stats: &BotRunStats) -> StorageResult<()> {
            if self.fail_stats_for.as_deref() == Some(stats.bot_id.as_str()) {
                return Err(StorageError::ConnectionFailed(
                    "stats table locked".to_string(),
                ));
            }
            self.inner.update_bot_stats(stats).await
        }

        async fn list_opportunities(
            &self,
            filter: &OpportunityFilter,
        ) -> StorageResult<Vec<DonorOpportunity>> {
            self.inner.list_opportunities(filter).await
        }
    }

    fn controller_with(
        targets: &[TargetSite],
        store: Arc<dyn OpportunityStore>,
        delay: Arc<dyn Delay>,
        seed: u64,
    ) -> BotController {
        let config = BotConfig::default().with_seed(seed);
        BotController::new(TaskQueue::build(targets), store, delay, config)
    }

    #[tokio::test]
    async fn test_run_visits_every_task_in_order() {
        let store = Arc::new(InMemoryOpportunityStore::new());
        let mut controller = BotController::new(
            TaskQueue::from_catalog(),
            store.clone(),
            Arc::new(InstantDelay),
            BotConfig::default().with_seed(42),
        );

        let expected: Vec<String> = controller
            .get_task_queue()
            .iter()
            .map(|t| t.bot_id())
            .collect();
        let summary = controller.run_bot_system().await;
        let visited: Vec<String> = summary.results.iter().map(|r| r.bot_id.clone()).collect();

        assert_eq!(visited, expected);
        assert_eq!(summary.tasks_processed, 7);
        assert_eq!(summary.failed_tasks, 0);
        assert_eq!(store.bot_runs().await.len(), 7);
        assert_eq!(store.len().await, summary.opportunities_saved);
        assert!(summary.opportunities_saved <= summary.total_opportunities);
    }

    #[tokio::test]
    async fn test_cooldown_after_each_task() {
        let delay = Arc::new(RecordingDelay::default());
        let targets = vec![
            TargetSite::new("https://www.grants.gov/", 10, "Grants.gov"),
            TargetSite::new("https://www.undp.org/funding", 7, "UNDP"),
        ];
        let config = BotConfig::default()
            .with_seed(1)
            .with_cooldown(DelayRange::new(2000, 5000));
        let mut controller = BotController::new(
            TaskQueue::build(&targets),
            Arc::new(InMemoryOpportunityStore::new()),
            delay.clone(),
            config,
        );

        let summary = controller.run_bot_system().await;
        let calls = delay.calls.lock().expect("lock poisoned").clone();

        // navigation + scrolls + analysis + cooldown, per task
        let scrolls: u32 = summary
            .results
            .iter()
            .map(|r| r.human_behavior_score / 5)
            .sum();
        assert_eq!(calls.len(), (2 * 3) + scrolls as usize);

        let cooldowns = calls
            .iter()
            .filter(|d| **d >= Duration::from_millis(2000) && **d < Duration::from_millis(5000))
            .count();
        assert!(cooldowns >= 2);
    }

    #[tokio::test]
    async fn test_failed_save_does_not_abort_task() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryOpportunityStore::new(),
            fail_titles: vec!["Federal Research and Development Grant Program".to_string()],
            fail_stats_for: None,
        });
        let mut controller = controller_with(
            &[TargetSite::new("https://www.grants.gov/", 10, "Grants.gov")],
            store.clone(),
            Arc::new(InstantDelay),
            3,
        );

        let summary = controller.run_bot_system().await;

        assert_eq!(summary.failed_tasks, 0);
        assert!(summary.results[0].score > 0);
        assert_eq!(
            summary.opportunities_saved,
            summary.total_opportunities - 1
        );
        assert_eq!(store.inner.len().await, summary.opportunities_saved);
    }

    #[tokio::test]
    async fn test_failed_stats_update_keeps_score() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryOpportunityStore::new(),
            fail_titles: Vec::new(),
            fail_stats_for: Some("intellibot-task-1".to_string()),
        });
        let mut controller = controller_with(
            &[TargetSite::new("https://www.grants.gov/", 10, "Grants.gov")],
            store.clone(),
            Arc::new(InstantDelay),
            4,
        );

        let summary = controller.run_bot_system().await;

        assert_eq!(summary.failed_tasks, 0);
        assert!(summary.results[0].score > 0);
        assert!(store.inner.bot_runs().await.is_empty());
        assert_eq!(store.inner.len().await, summary.opportunities_saved);
    }

    #[tokio::test]
    async fn test_task_error_scores_zero_and_continues() {
        let targets = vec![
            TargetSite::new(" ", 100, "Broken"),
            TargetSite::new("https://www.grantspace.org/", 9, "GrantSpace"),
        ];
        let store = Arc::new(InMemoryOpportunityStore::new());
        let mut controller = controller_with(&targets, store.clone(), Arc::new(InstantDelay), 9);

        let summary = controller.run_bot_system().await;

        assert_eq!(summary.tasks_processed, 2);
        assert_eq!(summary.failed_tasks, 1);
        assert_eq!(summary.results[0].bot_id, "intellibot-task-1");
        assert_eq!(summary.results[0].score, 0);
        assert!(summary.results[0].screenshot.is_none());
        assert!(summary.results[1].score > 0);

        let runs = store.bot_runs().await;
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].bot_id, "intellibot-task-1");
        assert!(!runs[0].success);
        assert_eq!(runs[0].reward_points, 0);
        assert!(runs[1].success);
    }

    #[tokio::test]
    async fn test_same_seed_same_scores() {
        let run = |seed| async move {
            let mut controller = controller_with(
                &crate::scheduler::default_targets(),
                Arc::new(InMemoryOpportunityStore::new()),
                Arc::new(InstantDelay),
                seed,
            );
            controller
                .run_bot_system()
                .await
                .results
                .into_iter()
                .map(|r| (r.score, r.opportunities.len(), r.clicks_performed))
                .collect::<Vec<_>>()
        };

        assert_eq!(run(77).await, run(77).await);
    }

    #[test]
    fn test_queue_accessors() {
        let controller = controller_with(
            &crate::scheduler::default_targets(),
            Arc::new(InMemoryOpportunityStore::new()),
            Arc::new(InstantDelay),
            0,
        );
        assert_eq!(controller.get_task_queue().len(), 7);
        assert_eq!(controller.get_queue_status().pending, 7);
    }

    #[test]
    fn test_from_config_missing_targets_file() {
        let mut config = BotConfig::default();
        config.targets_file = Some("/nonexistent/targets.yaml".into());
        let result = BotController::from_config(config, Arc::new(InMemoryOpportunityStore::new()));
        assert!(matches!(result, Err(QueueError::Io { .. })));
    }
}
