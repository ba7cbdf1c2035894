//! Simulated visit to a single funding website.
//!
//! A visit walks through navigation, scrolling, clicking, content analysis,
//! and opportunity discovery, adding fixed or randomized points at each
//! stage. A screenshot is awarded once the running score reaches the
//! threshold.

use chrono::Utc;
use rand::RngExt;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::BotConfig;
use crate::error::BotError;
use crate::scheduler::BotTask;

use super::delay::{Delay, DelayProfile};
use super::opportunities::generate_realistic_opportunities;
use super::result::{BotResult, ScoreBreakdown};

pub const NAVIGATION_SCORE: u32 = 15;
pub const SCROLL_SCORE: u32 = 5;
pub const CLICK_SCORE: u32 = 25;
pub const OPPORTUNITY_SCORE: u32 = 30;
pub const SCREENSHOT_BONUS: u32 = 35;
pub const DEFAULT_ANALYSIS_SCORE: u32 = 50;

/// Inclusive bounds on scroll actions per visit.
pub const SCROLL_ACTIONS: (u32, u32) = (3, 7);
/// Inclusive bounds on clicks per visit.
pub const CLICK_ACTIONS: (u32, u32) = (1, 4);

/// Content analysis bonus, keyed by case-sensitive URL substring.
const ANALYSIS_RULES: &[(&str, u32)] = &[
    ("grants.gov", 85),
    ("grantspace", 80),
    ("europa.eu", 75),
    ("usaid", 70),
    ("reliefweb", 65),
];

const TOKEN_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const TOKEN_SUFFIX_LEN: usize = 9;

/// Scores the "AI analysis" of a page by its URL.
pub fn ai_analysis_score(url: &str) -> u32 {
    ANALYSIS_RULES
        .iter()
        .find(|(key, _)| url.contains(key))
        .map(|(_, score)| *score)
        .unwrap_or(DEFAULT_ANALYSIS_SCORE)
}

/// Returns true if `score` earns a screenshot at `threshold`.
pub fn qualifies_for_screenshot(score: u32, threshold: u32) -> bool {
    score >= threshold
}

/// Creates a placeholder screenshot token: `screenshot_{millis}_{suffix}`.
pub fn screenshot_token(rng: &mut ChaCha8Rng) -> String {
    let suffix: String = (0..TOKEN_SUFFIX_LEN)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect();
    format!("screenshot_{}_{}", Utc::now().timestamp_millis(), suffix)
}

/// Runs the visit simulation for one task at a time.
pub struct BotSimulator<'a> {
    delay: &'a dyn Delay,
    delays: DelayProfile,
    screenshot_threshold: u32,
}

impl<'a> BotSimulator<'a> {
    /// Creates a simulator using the delay effect and settings from `config`.
    pub fn new(delay: &'a dyn Delay, config: &BotConfig) -> Self {
        Self {
            delay,
            delays: config.delays,
            screenshot_threshold: config.screenshot_threshold,
        }
    }

    /// Simulates a visit to `task.url`.
    ///
    /// # Errors
    ///
    /// Returns `BotError::InvalidTask` if the task has no URL.
    pub async fn simulate(
        &self,
        task: &BotTask,
        rng: &mut ChaCha8Rng,
    ) -> Result<BotResult, BotError> {
        let bot_id = task.bot_id();
        if task.url.trim().is_empty() {
            return Err(BotError::InvalidTask {
                id: task.id.clone(),
                reason: "url is empty".to_string(),
            });
        }

        let mut breakdown = ScoreBreakdown {
            navigation: NAVIGATION_SCORE,
            ..ScoreBreakdown::default()
        };
        self.delay.delay(self.delays.navigation.sample(rng)).await;

        let scroll_actions = rng.random_range(SCROLL_ACTIONS.0..=SCROLL_ACTIONS.1);
        for _ in 0..scroll_actions {
            self.delay.delay(self.delays.scroll.sample(rng)).await;
            breakdown.human_behavior += SCROLL_SCORE;
        }

        let clicks_performed = rng.random_range(CLICK_ACTIONS.0..=CLICK_ACTIONS.1);
        breakdown.clicks = clicks_performed * CLICK_SCORE;

        self.delay.delay(self.delays.analysis.sample(rng)).await;
        breakdown.analysis = ai_analysis_score(&task.url);

        let opportunities = generate_realistic_opportunities(&task.url, rng);
        breakdown.opportunities = opportunities.len() as u32 * OPPORTUNITY_SCORE;

        let mut screenshot = None;
        if qualifies_for_screenshot(breakdown.total(), self.screenshot_threshold) {
            screenshot = Some(screenshot_token(rng));
            breakdown.screenshot_bonus = SCREENSHOT_BONUS;
            info!(
                bot_id = %bot_id,
                score = breakdown.total(),
                "Bot earned screenshot reward"
            );
        }

        debug!(bot_id = %bot_id, ?breakdown, "Visit simulated");

        Ok(BotResult {
            bot_id,
            score: breakdown.total(),
            opportunities,
            screenshot,
            clicks_performed,
            url: task.url.clone(),
            human_behavior_score: breakdown.human_behavior,
            breakdown,
        })
    }
}
