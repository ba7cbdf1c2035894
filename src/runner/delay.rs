//! Pacing delays for the simulated bot.
//!
//! Every pause in a bot run goes through the [`Delay`] trait so that tests and
//! `--no-delay` runs can skip real sleeping.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use rand::RngExt;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Effect that suspends the runner for a duration.
#[async_trait]
pub trait Delay: Send + Sync {
    /// Waits for `duration`.
    async fn delay(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantDelay;

#[async_trait]
impl Delay for InstantDelay {
    async fn delay(&self, _duration: Duration) {}
}

/// A half-open range of milliseconds, `[min_ms, max_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    /// Creates a range. `min_ms == max_ms` yields a fixed delay.
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Returns true if `min_ms <= max_ms`.
    pub fn is_valid(&self) -> bool {
        self.min_ms <= self.max_ms
    }

    /// Draws a duration from the range.
    pub fn sample(&self, rng: &mut ChaCha8Rng) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rng.random_range(self.min_ms..self.max_ms))
    }
}

impl fmt::Display for DelayRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.min_ms, self.max_ms)
    }
}

impl FromStr for DelayRange {
    type Err = String;

    /// Parses `"min-max"` or a single fixed value such as `"0"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u64>()
                .map_err(|e| format!("invalid milliseconds '{}': {}", part.trim(), e))
        };

        match s.split_once('-') {
            Some((min, max)) => Ok(Self::new(parse(min)?, parse(max)?)),
            None => {
                let fixed = parse(s)?;
                Ok(Self::new(fixed, fixed))
            }
        }
    }
}

/// Delay ranges for each pause in a bot run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayProfile {
    /// Page navigation.
    pub navigation: DelayRange,
    /// Each scroll action.
    pub scroll: DelayRange,
    /// Content analysis.
    pub analysis: DelayRange,
    /// Pause between tasks.
    pub cooldown: DelayRange,
}

impl Default for DelayProfile {
    fn default() -> Self {
        Self {
            navigation: DelayRange::new(1000, 3000),
            scroll: DelayRange::new(500, 1500),
            analysis: DelayRange::new(1000, 3000),
            cooldown: DelayRange::new(2000, 5000),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_sample_within_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let range = DelayRange::new(2000, 5000);
        for _ in 0..200 {
            let d = range.sample(&mut rng);
            assert!(d >= Duration::from_millis(2000));
            assert!(d < Duration::from_millis(5000));
        }
    }

    #[test]
    fn test_sample_fixed() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        assert_eq!(
            DelayRange::new(0, 0).sample(&mut rng),
            Duration::from_millis(0)
        );
    }

    #[test]
    fn test_parse_range() {
        assert_eq!("1000-3000".parse::<DelayRange>(), Ok(DelayRange::new(1000, 3000)));
        assert_eq!(" 5 - 10 ".parse::<DelayRange>(), Ok(DelayRange::new(5, 10)));
        assert_eq!("250".parse::<DelayRange>(), Ok(DelayRange::new(250, 250)));
        assert!("abc-10".parse::<DelayRange>().is_err());
        assert_eq!(DelayRange::new(1, 2).to_string(), "1-2");
    }

    #[test]
    fn test_inverted_range_invalid() {
        assert!(!DelayRange::new(10, 5).is_valid());
        assert!(DelayRange::new(5, 5).is_valid());
    }

    #[tokio::test]
    async fn test_instant_delay_returns() {
        InstantDelay.delay(Duration::from_secs(3600)).await;
    }
}
