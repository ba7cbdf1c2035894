//! Records exchanged with the opportunity store.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Length of the content hash used for de-duplication.
pub const CONTENT_HASH_LEN: usize = 32;

/// Points awarded per opportunity found by a successful bot run.
pub const REWARD_POINTS_PER_OPPORTUNITY: u32 = 10;

/// Default page size for opportunity listings.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Connection to the backing store failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),

    /// A record with the same content hash already exists.
    #[error("Opportunity with content hash '{0}' already exists")]
    Duplicate(String),

    /// The record is missing a required field.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Computes the de-duplication hash for a piece of content.
///
/// This is the first 32 characters of its standard base64 encoding.
pub fn content_hash(content: &str) -> String {
    let mut encoded = STANDARD.encode(content.as_bytes());
    encoded.truncate(CONTENT_HASH_LEN);
    encoded
}

/// An opportunity record submitted to the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDonorOpportunity {
    pub title: String,
    pub description: String,
    pub amount_min: i64,
    pub amount_max: i64,
    pub currency: String,
    pub source_url: String,
    pub source_name: String,
    pub country: String,
    pub sector: String,
    pub eligibility_criteria: String,
    pub application_process: String,
    pub keywords: Vec<String>,
    pub focus_areas: Vec<String>,
    /// De-duplication key, see [`content_hash`].
    pub content_hash: String,
}

impl NewDonorOpportunity {
    /// Checks the fields the store requires.
    pub fn validate(&self) -> StorageResult<()> {
        if self.title.trim().is_empty() {
            return Err(StorageError::InvalidRecord(
                "title cannot be empty".to_string(),
            ));
        }
        if self.content_hash.is_empty() {
            return Err(StorageError::InvalidRecord(
                "content_hash cannot be empty".to_string(),
            ));
        }
        if self.amount_min > self.amount_max {
            return Err(StorageError::InvalidRecord(format!(
                "amount_min ({}) exceeds amount_max ({})",
                self.amount_min, self.amount_max
            )));
        }
        Ok(())
    }

    /// Converts into a persisted record with a fresh identifier.
    pub fn into_persisted(self) -> DonorOpportunity {
        DonorOpportunity {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            amount_min: self.amount_min,
            amount_max: self.amount_max,
            currency: self.currency,
            source_url: self.source_url,
            source_name: self.source_name,
            country: self.country,
            sector: self.sector,
            eligibility_criteria: self.eligibility_criteria,
            application_process: self.application_process,
            keywords: self.keywords,
            focus_areas: self.focus_areas,
            content_hash: self.content_hash,
            is_verified: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// An opportunity record as persisted by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DonorOpportunity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub amount_min: i64,
    pub amount_max: i64,
    pub currency: String,
    pub source_url: String,
    pub source_name: String,
    pub country: String,
    pub sector: String,
    pub eligibility_criteria: String,
    pub application_process: String,
    pub keywords: Vec<String>,
    pub focus_areas: Vec<String>,
    pub content_hash: String,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-bot statistics recorded after each task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotRunStats {
    pub bot_id: String,
    pub score: u32,
    pub opportunities_found: u32,
    pub screenshots: u32,
    pub success: bool,
    pub reward_points: u32,
}

impl BotRunStats {
    /// Creates stats for a bot run, deriving reward points.
    ///
    /// Only successful runs that found something earn points.
    pub fn new(
        bot_id: impl Into<String>,
        score: u32,
        opportunities_found: u32,
        screenshots: u32,
        success: bool,
    ) -> Self {
        let reward_points = if success {
            opportunities_found * REWARD_POINTS_PER_OPPORTUNITY
        } else {
            0
        };
        Self {
            bot_id: bot_id.into(),
            score,
            opportunities_found,
            screenshots,
            success,
            reward_points,
        }
    }
}

/// Filter for listing stored opportunities.
#[derive(Debug, Clone)]
pub struct OpportunityFilter {
    /// Sector to match (case-insensitive).
    pub sector: Option<String>,
    /// Country to match exactly.
    pub country: Option<String>,
    /// Only return verified records.
    pub verified_only: bool,
    /// Maximum number of records to return.
    pub limit: usize,
    /// Number of records to skip.
    pub offset: usize,
}

impl Default for OpportunityFilter {
    fn default() -> Self {
        Self {
            sector: None,
            country: None,
            verified_only: false,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl OpportunityFilter {
    /// Creates a filter with default paging.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by sector.
    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    /// Filter by country.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Only return verified records.
    pub fn verified_only(mut self) -> Self {
        self.verified_only = true;
        self
    }

    /// Set the page size.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the page offset.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Returns true if the record passes every filter condition.
    pub fn matches(&self, record: &DonorOpportunity) -> bool {
        if let Some(ref sector) = self.sector {
            if !record.sector.eq_ignore_ascii_case(sector) {
                return false;
            }
        }
        if let Some(ref country) = self.country {
            if &record.country != country {
                return false;
            }
        }
        !self.verified_only || record.is_verified
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewDonorOpportunity {
        let title = "Horizon Europe Innovation Fund";
        let url = "https://ec.europa.eu/info/funding-tenders_en";
        NewDonorOpportunity {
            title: title.to_string(),
            description: "EU funding".to_string(),
            amount_min: 500_000,
            amount_max: 5_000_000,
            currency: "EUR".to_string(),
            source_url: url.to_string(),
            source_name: "IntelliBot-intellibot-task-3".to_string(),
            country: "Global".to_string(),
            sector: "Innovation".to_string(),
            eligibility_criteria: "EU-based organizations".to_string(),
            application_process: "Portal".to_string(),
            keywords: vec!["innovation".to_string()],
            focus_areas: vec!["Innovation".to_string()],
            content_hash: content_hash(&format!("{}{}", title, url)),
        }
    }

    #[test]
    fn test_content_hash_prefix() {
        // base64("hello world") = "aGVsbG8gd29ybGQ="
        assert_eq!(content_hash("hello world"), "aGVsbG8gd29ybGQ=");

        let long =
            content_hash("Federal Research and Development Grant Programhttps://www.grants.gov/");
        assert_eq!(long.len(), CONTENT_HASH_LEN);
        assert!(long.starts_with("RmVkZXJhbCBSZXNlYXJjaCBhbmQgRGV2"));
    }

    #[test]
    fn test_validate_rejects_inverted_amounts() {
        let mut record = sample();
        record.amount_min = 10;
        record.amount_max = 5;
        assert!(matches!(
            record.validate(),
            Err(StorageError::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_into_persisted_defaults() {
        let persisted = sample().into_persisted();
        assert!(!persisted.id.is_nil());
        assert!(!persisted.is_verified);
        assert!(persisted.is_active);
        assert_eq!(persisted.currency, "EUR");
    }

    #[test]
    fn test_bot_run_stats_reward_points() {
        assert_eq!(BotRunStats::new("b", 100, 2, 1, true).reward_points, 20);
        assert_eq!(BotRunStats::new("b", 0, 2, 0, false).reward_points, 0);
        assert_eq!(BotRunStats::new("b", 90, 0, 1, true).reward_points, 0);
    }

    #[test]
    fn test_filter_matches() {
        let record = sample().into_persisted();

        assert!(OpportunityFilter::new().matches(&record));
        assert!(OpportunityFilter::new()
            .with_sector("innovation")
            .matches(&record));
        assert!(!OpportunityFilter::new()
            .with_sector("Health")
            .matches(&record));
        assert!(!OpportunityFilter::new()
            .with_country("Kenya")
            .matches(&record));
        assert!(!OpportunityFilter::new().verified_only().matches(&record));
    }
}
