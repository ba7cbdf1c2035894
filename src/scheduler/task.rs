//! Task definitions for the bot scheduler.
//!
//! This module defines the data the queue is built from:
//!
//! - `TargetSite`: A funding website listed in the target catalog
//! - `BotTask`: A prioritized visit to one target URL
//! - `calculate_expected_reward`: URL-based reward scoring

use serde::{Deserialize, Serialize};

/// Priority assigned to catalog entries that do not specify one.
pub const DEFAULT_PRIORITY: i32 = 5;

/// Expected reward for URLs that match no scoring rule.
pub const DEFAULT_EXPECTED_REWARD: i32 = 50;

/// Reward scoring table, checked in order against the lowercased URL.
///
/// The first matching substring wins.
const REWARD_RULES: &[(&str, i32)] = &[
    ("grants.gov", 100),
    ("grantspace", 90),
    ("europa.eu", 85),
    ("usaid.gov", 80),
    ("reliefweb", 75),
    ("worldbank", 95),
    ("foundation", 70),
];

/// A funding website listed in the target catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetSite {
    /// URL the bot will visit.
    pub url: String,
    /// Priority weight (higher values are visited sooner).
    #[serde(default = "default_priority")]
    pub priority: i32,
    /// Human-readable name of the site.
    #[serde(default)]
    pub name: String,
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl TargetSite {
    /// Creates a new target with an explicit priority.
    pub fn new(url: impl Into<String>, priority: i32, name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            priority,
            name: name.into(),
        }
    }
}

/// Built-in catalog of funding websites.
pub fn default_targets() -> Vec<TargetSite> {
    vec![
        TargetSite::new("https://www.grants.gov/", 10, "Grants.gov"),
        TargetSite::new("https://www.grantspace.org/", 9, "GrantSpace"),
        TargetSite::new(
            "https://ec.europa.eu/info/funding-tenders_en",
            8,
            "EU Funding",
        ),
        TargetSite::new("https://reliefweb.int/", 7, "ReliefWeb"),
        TargetSite::new(
            "https://www.usaid.gov/partnership-opportunities",
            6,
            "USAID",
        ),
        TargetSite::new(
            "https://www.who.int/emergencies/funding",
            8,
            "WHO Emergency Funding",
        ),
        TargetSite::new("https://www.undp.org/funding", 7, "UNDP Funding"),
    ]
}

/// Scores a URL by its funding potential.
///
/// Matching is case-insensitive; URLs matching no rule get
/// [`DEFAULT_EXPECTED_REWARD`].
pub fn calculate_expected_reward(url: &str) -> i32 {
    let url = url.to_lowercase();
    REWARD_RULES
        .iter()
        .find(|(key, _)| url.contains(key))
        .map(|(_, score)| *score)
        .unwrap_or(DEFAULT_EXPECTED_REWARD)
}

/// A single prioritized visit to a target URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotTask {
    /// Identifier of the form `task-{n}`, where n is the 1-based catalog index.
    pub id: String,
    /// URL to visit.
    pub url: String,
    /// Priority weight copied from the catalog.
    pub priority: i32,
    /// Reward derived from the URL.
    pub expected_reward: i32,
}

impl BotTask {
    /// Creates a task for the catalog entry at `index` (0-based).
    ///
    /// A priority of 0 counts as unset and becomes [`DEFAULT_PRIORITY`].
    pub fn from_target(index: usize, target: &TargetSite) -> Self {
        let priority = if target.priority == 0 {
            DEFAULT_PRIORITY
        } else {
            target.priority
        };
        Self {
            id: format!("task-{}", index + 1),
            url: target.url.clone(),
            priority,
            expected_reward: calculate_expected_reward(&target.url),
        }
    }

    /// Sort key used to order the queue.
    pub fn weight(&self) -> i64 {
        i64::from(self.priority) * i64::from(self.expected_reward)
    }

    /// Identifier of the bot that processes this task.
    pub fn bot_id(&self) -> String {
        format!("intellibot-{}", self.id)
    }
}
