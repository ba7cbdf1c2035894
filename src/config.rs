//! Runtime configuration for the bot system.
//!
//! Settings come from defaults, then `INTELLIBOT_*` environment variables,
//! then CLI flags (applied by the caller).

use std::path::PathBuf;

use thiserror::Error;

use crate::runner::delay::{DelayProfile, DelayRange};

/// Default score a bot must reach to earn a screenshot.
pub const DEFAULT_SCREENSHOT_THRESHOLD: u32 = 70;

/// Environment variables read by [`BotConfig::from_env`].
pub const ENV_VARS: &[&str] = &[
    "INTELLIBOT_SCREENSHOT_THRESHOLD",
    "INTELLIBOT_SEED",
    "INTELLIBOT_PACING",
    "INTELLIBOT_NAVIGATION_DELAY_MS",
    "INTELLIBOT_SCROLL_DELAY_MS",
    "INTELLIBOT_ANALYSIS_DELAY_MS",
    "INTELLIBOT_COOLDOWN_DELAY_MS",
    "INTELLIBOT_TARGETS_FILE",
    "INTELLIBOT_DATABASE_URL",
];

/// Serializes tests that read or write the process environment.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration for a bot system run.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Score at or above which a screenshot is awarded.
    pub screenshot_threshold: u32,
    /// Seed for the random source. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Whether delays actually sleep.
    pub pacing: bool,
    /// Delay ranges for each simulated pause.
    pub delays: DelayProfile,
    /// Optional YAML/JSON targets file replacing the built-in catalog.
    pub targets_file: Option<PathBuf>,
    /// Optional SQLite database path. `None` uses the in-memory store.
    pub database_path: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            screenshot_threshold: DEFAULT_SCREENSHOT_THRESHOLD,
            seed: None,
            pacing: true,
            delays: DelayProfile::default(),
            targets_file: None,
            database_path: None,
        }
    }
}

impl BotConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `INTELLIBOT_SCREENSHOT_THRESHOLD`: Screenshot score threshold (default: 70)
    /// - `INTELLIBOT_SEED`: Random seed (default: entropy)
    /// - `INTELLIBOT_PACING`: Sleep between actions (default: true)
    /// - `INTELLIBOT_NAVIGATION_DELAY_MS`: Navigation delay `min-max` (default: 1000-3000)
    /// - `INTELLIBOT_SCROLL_DELAY_MS`: Per-scroll delay `min-max` (default: 500-1500)
    /// - `INTELLIBOT_ANALYSIS_DELAY_MS`: Analysis delay `min-max` (default: 1000-3000)
    /// - `INTELLIBOT_COOLDOWN_DELAY_MS`: Delay between tasks `min-max` (default: 2000-5000)
    /// - `INTELLIBOT_TARGETS_FILE`: Targets file (default: built-in catalog)
    /// - `INTELLIBOT_DATABASE_URL`: SQLite database path (default: in-memory)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("INTELLIBOT_SCREENSHOT_THRESHOLD") {
            config.screenshot_threshold = parse_env_value(&val, "INTELLIBOT_SCREENSHOT_THRESHOLD")?;
        }

        if let Ok(val) = std::env::var("INTELLIBOT_SEED") {
            config.seed = Some(parse_env_value(&val, "INTELLIBOT_SEED")?);
        }

        if let Ok(val) = std::env::var("INTELLIBOT_PACING") {
            config.pacing = parse_env_bool(&val, "INTELLIBOT_PACING")?;
        }

        // Delay ranges
        if let Ok(val) = std::env::var("INTELLIBOT_NAVIGATION_DELAY_MS") {
            config.delays.navigation = parse_env_value(&val, "INTELLIBOT_NAVIGATION_DELAY_MS")?;
        }

        if let Ok(val) = std::env::var("INTELLIBOT_SCROLL_DELAY_MS") {
            config.delays.scroll = parse_env_value(&val, "INTELLIBOT_SCROLL_DELAY_MS")?;
        }

        if let Ok(val) = std::env::var("INTELLIBOT_ANALYSIS_DELAY_MS") {
            config.delays.analysis = parse_env_value(&val, "INTELLIBOT_ANALYSIS_DELAY_MS")?;
        }

        if let Ok(val) = std::env::var("INTELLIBOT_COOLDOWN_DELAY_MS") {
            config.delays.cooldown = parse_env_value(&val, "INTELLIBOT_COOLDOWN_DELAY_MS")?;
        }

        // Collaborators
        if let Ok(val) = std::env::var("INTELLIBOT_TARGETS_FILE") {
            config.targets_file = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("INTELLIBOT_DATABASE_URL") {
            config.database_path = Some(val);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("navigation", self.delays.navigation),
            ("scroll", self.delays.scroll),
            ("analysis", self.delays.analysis),
            ("cooldown", self.delays.cooldown),
        ];
        for (name, range) in ranges {
            if !range.is_valid() {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} delay range {} has min greater than max",
                    name, range
                )));
            }
        }

        if let Some(ref path) = self.database_path {
            if path.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "database path cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Disables real sleeping.
    pub fn without_pacing(mut self) -> Self {
        self.pacing = false;
        self
    }

    /// Sets the screenshot threshold.
    pub fn with_screenshot_threshold(mut self, threshold: u32) -> Self {
        self.screenshot_threshold = threshold;
        self
    }

    /// Sets the cooldown between tasks.
    pub fn with_cooldown(mut self, cooldown: DelayRange) -> Self {
        self.delays.cooldown = cooldown;
        self
    }
}

fn parse_env_value<T>(val: &str, key: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let val = val.trim();
    val.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn parse_env_bool(val: &str, key: &str) -> Result<bool, ConfigError> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean, got '{}'", val),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BotConfig::default();
        assert_eq!(config.screenshot_threshold, 70);
        assert!(config.pacing);
        assert!(config.seed.is_none());
        assert_eq!(config.delays.cooldown, DelayRange::new(2000, 5000));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let config = BotConfig::default().with_cooldown(DelayRange::new(10, 1));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_validate_rejects_blank_database() {
        let mut config = BotConfig::default();
        config.database_path = Some("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builders() {
        let config = BotConfig::new()
            .with_seed(42)
            .without_pacing()
            .with_screenshot_threshold(100);
        assert_eq!(config.seed, Some(42));
        assert!(!config.pacing);
        assert_eq!(config.screenshot_threshold, 100);
    }

    fn clear_env() {
        for key in ENV_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_from_env() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = BotConfig::from_env().expect("defaults should load");
        assert_eq!(config.screenshot_threshold, DEFAULT_SCREENSHOT_THRESHOLD);
        assert!(config.seed.is_none());
        assert!(config.pacing);
        assert!(config.targets_file.is_none());
        assert!(config.database_path.is_none());

        std::env::set_var("INTELLIBOT_SCREENSHOT_THRESHOLD", "120");
        std::env::set_var("INTELLIBOT_SEED", "42");
        std::env::set_var("INTELLIBOT_PACING", "false");
        std::env::set_var("INTELLIBOT_NAVIGATION_DELAY_MS", "10-20");
        std::env::set_var("INTELLIBOT_SCROLL_DELAY_MS", "5");
        std::env::set_var("INTELLIBOT_ANALYSIS_DELAY_MS", "30-40");
        std::env::set_var("INTELLIBOT_COOLDOWN_DELAY_MS", "0-100");
        std::env::set_var("INTELLIBOT_TARGETS_FILE", "/etc/intellibot/targets.yaml");
        std::env::set_var("INTELLIBOT_DATABASE_URL", "bots.db");

        let config = BotConfig::from_env();

        std::env::set_var("INTELLIBOT_COOLDOWN_DELAY_MS", "500-100");
        let inverted = BotConfig::from_env();

        std::env::set_var("INTELLIBOT_COOLDOWN_DELAY_MS", "0-100");
        std::env::set_var("INTELLIBOT_SEED", "forty-two");
        let bad_seed = BotConfig::from_env();

        clear_env();

        let config = config.expect("env config should load");
        assert_eq!(config.screenshot_threshold, 120);
        assert_eq!(config.seed, Some(42));
        assert!(!config.pacing);
        assert_eq!(config.delays.navigation, DelayRange::new(10, 20));
        assert_eq!(config.delays.scroll, DelayRange::new(5, 5));
        assert_eq!(config.delays.analysis, DelayRange::new(30, 40));
        assert_eq!(config.delays.cooldown, DelayRange::new(0, 100));
        assert_eq!(
            config.targets_file,
            Some(PathBuf::from("/etc/intellibot/targets.yaml"))
        );
        assert_eq!(config.database_path.as_deref(), Some("bots.db"));

        assert!(matches!(inverted, Err(ConfigError::ValidationFailed(_))));
        assert!(matches!(
            bad_seed,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "INTELLIBOT_SEED"
        ));
    }

    #[test]
    fn test_parse_env_helpers() {
        assert_eq!(parse_env_value::<u32>(" 80 ", "K").ok(), Some(80));
        assert!(parse_env_value::<u32>("eighty", "K").is_err());
        assert_eq!(
            parse_env_value::<DelayRange>("1-2", "K").ok(),
            Some(DelayRange::new(1, 2))
        );
        assert!(parse_env_bool("yes", "K").unwrap_or(false));
        assert!(!parse_env_bool("off", "K").unwrap_or(true));
        assert!(parse_env_bool("maybe", "K").is_err());
    }
}
