//! Results of simulated bot visits and whole runs.

use serde::Serialize;

use super::opportunities::GeneratedOpportunity;

/// Points contributed by each stage of a visit.
///
/// Every component is non-negative; the visit score is their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub navigation: u32,
    pub human_behavior: u32,
    pub clicks: u32,
    pub analysis: u32,
    pub opportunities: u32,
    pub screenshot_bonus: u32,
}

impl ScoreBreakdown {
    /// Sum of all components.
    pub fn total(&self) -> u32 {
        self.navigation
            + self.human_behavior
            + self.clicks
            + self.analysis
            + self.opportunities
            + self.screenshot_bonus
    }
}

/// Outcome of simulating one task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BotResult {
    pub bot_id: String,
    pub score: u32,
    pub opportunities: Vec<GeneratedOpportunity>,
    /// Placeholder proof-of-visit token, present when the score threshold was met.
    pub screenshot: Option<String>,
    pub clicks_performed: u32,
    pub url: String,
    pub human_behavior_score: u32,
    pub breakdown: ScoreBreakdown,
}

impl BotResult {
    /// Zero-score result recorded when a task fails.
    pub fn failed(bot_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            score: 0,
            opportunities: Vec::new(),
            screenshot: None,
            clicks_performed: 0,
            url: url.into(),
            human_behavior_score: 0,
            breakdown: ScoreBreakdown::default(),
        }
    }

    /// Returns true if a screenshot was awarded.
    pub fn has_screenshot(&self) -> bool {
        self.screenshot.is_some()
    }
}

/// Aggregate totals of a bot system run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub tasks_processed: usize,
    pub failed_tasks: usize,
    pub total_score: u64,
    pub total_opportunities: usize,
    pub opportunities_saved: usize,
    pub screenshots_earned: usize,
    pub results: Vec<BotResult>,
}

impl RunSummary {
    /// Creates an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task result to the totals.
    pub fn record(&mut self, result: BotResult) {
        self.tasks_processed += 1;
        self.total_score += u64::from(result.score);
        self.total_opportunities += result.opportunities.len();
        if result.has_screenshot() {
            self.screenshots_earned += 1;
        }
        self.results.push(result);
    }

    /// Records a task that failed and scored zero.
    pub fn record_failure(&mut self, result: BotResult) {
        self.failed_tasks += 1;
        self.record(result);
    }

    /// Mean score per processed task, or 0 for an empty run.
    pub fn average_score(&self) -> f64 {
        if self.tasks_processed == 0 {
            0.0
        } else {
            self.total_score as f64 / self.tasks_processed as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: u32, screenshot: bool, opportunities: usize) -> BotResult {
        let mut r = BotResult::failed("intellibot-task-1", "https://example.org/");
        r.score = score;
        r.screenshot = screenshot.then(|| "screenshot_1_abc".to_string());
        r.opportunities = (0..opportunities)
            .map(|i| GeneratedOpportunity {
                title: format!("Opportunity {}", i),
                description: String::new(),
                amount_min: 1,
                amount_max: 2,
                currency: "USD".to_string(),
                sector: "Health".to_string(),
                eligibility_criteria: String::new(),
                application_process: String::new(),
                confidence_score: 80,
            })
            .collect();
        r
    }

    #[test]
    fn test_breakdown_total() {
        let breakdown = ScoreBreakdown {
            navigation: 15,
            human_behavior: 20,
            clicks: 50,
            analysis: 85,
            opportunities: 30,
            screenshot_bonus: 35,
        };
        assert_eq!(breakdown.total(), 235);
    }

    #[test]
    fn test_failed_result_is_zero() {
        let r = BotResult::failed("intellibot-task-9", "https://x.org/");
        assert_eq!(r.score, 0);
        assert!(r.opportunities.is_empty());
        assert!(!r.has_screenshot());
        assert_eq!(r.breakdown.total(), 0);
    }

    #[test]
    fn test_summary_totals() {
        let mut summary = RunSummary::new();
        summary.record(result(200, true, 2));
        summary.record(result(100, false, 0));
        summary.record_failure(BotResult::failed("b", "u"));

        assert_eq!(summary.tasks_processed, 3);
        assert_eq!(summary.failed_tasks, 1);
        assert_eq!(summary.total_score, 300);
        assert_eq!(summary.total_opportunities, 2);
        assert_eq!(summary.screenshots_earned, 1);
        assert!((summary.average_score() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_summary_average() {
        assert_eq!(RunSummary::new().average_score(), 0.0);
    }
}
