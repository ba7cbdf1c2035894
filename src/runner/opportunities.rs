//! Synthetic funding opportunities.
//!
//! Known funding domains always yield their hardcoded program; any URL may
//! additionally yield a randomized generic initiative.

use rand::RngExt;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::storage::{content_hash, NewDonorOpportunity};

/// Sectors used for generic opportunities.
pub const SECTORS: &[&str] = &[
    "Health",
    "Education",
    "Environment",
    "Technology",
    "Agriculture",
    "Energy",
];

/// Probability that a visit also yields a generic opportunity.
pub const GENERIC_OPPORTUNITY_PROBABILITY: f64 = 0.7;

/// Country recorded for every bot-discovered opportunity.
pub const DEFAULT_COUNTRY: &str = "Global";

/// A funding opportunity produced by a simulated visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedOpportunity {
    pub title: String,
    pub description: String,
    pub amount_min: i64,
    pub amount_max: i64,
    pub currency: String,
    pub sector: String,
    pub eligibility_criteria: String,
    pub application_process: String,
    /// Confidence in the extraction, 0-100.
    pub confidence_score: u32,
}

impl GeneratedOpportunity {
    /// Builds the storage record for this opportunity.
    ///
    /// The content hash covers `title + source_url`.
    pub fn to_record(&self, source_url: &str, bot_id: &str) -> NewDonorOpportunity {
        NewDonorOpportunity {
            title: self.title.clone(),
            description: self.description.clone(),
            amount_min: self.amount_min,
            amount_max: self.amount_max,
            currency: self.currency.clone(),
            source_url: source_url.to_string(),
            source_name: format!("IntelliBot-{}", bot_id),
            country: DEFAULT_COUNTRY.to_string(),
            sector: self.sector.clone(),
            eligibility_criteria: self.eligibility_criteria.clone(),
            application_process: self.application_process.clone(),
            keywords: vec![
                self.sector.to_lowercase(),
                "funding".to_string(),
                "intelligent".to_string(),
            ],
            focus_areas: vec![self.sector.clone()],
            content_hash: content_hash(&format!("{}{}", self.title, source_url)),
        }
    }
}

fn federal_research_grant() -> GeneratedOpportunity {
    GeneratedOpportunity {
        title: "Federal Research and Development Grant Program".to_string(),
        description: "Multi-year funding for research institutions and universities conducting innovative research in science, technology, and development sectors.".to_string(),
        amount_min: 250_000,
        amount_max: 2_000_000,
        currency: "USD".to_string(),
        sector: "Research".to_string(),
        eligibility_criteria: "Accredited research institutions and universities".to_string(),
        application_process: "Submit through Grants.gov portal with detailed research proposal".to_string(),
        confidence_score: 88,
    }
}

fn foundation_directory_grants() -> GeneratedOpportunity {
    GeneratedOpportunity {
        title: "Foundation Directory Grant Opportunities".to_string(),
        description: "Curated funding opportunities from private foundations supporting education, health, environment, and social justice initiatives.".to_string(),
        amount_min: 50_000,
        amount_max: 500_000,
        currency: "USD".to_string(),
        sector: "Foundation".to_string(),
        eligibility_criteria: "Registered nonprofits with 501(c)(3) status".to_string(),
        application_process: "Contact foundations directly through GrantSpace directory".to_string(),
        confidence_score: 82,
    }
}

fn horizon_europe_fund() -> GeneratedOpportunity {
    GeneratedOpportunity {
        title: "Horizon Europe Innovation Fund".to_string(),
        description: "European Union funding for breakthrough innovations in digital transformation, green technologies, and health research across member states.".to_string(),
        amount_min: 500_000,
        amount_max: 5_000_000,
        currency: "EUR".to_string(),
        sector: "Innovation".to_string(),
        eligibility_criteria: "EU-based organizations and international consortiums".to_string(),
        application_process: "Submit through EU Funding & Tenders Portal".to_string(),
        confidence_score: 90,
    }
}

/// Domain-specific programs, keyed by URL substring.
const KNOWN_PROGRAMS: &[(&str, fn() -> GeneratedOpportunity)] = &[
    ("grants.gov", federal_research_grant),
    ("grantspace", foundation_directory_grants),
    ("europa.eu", horizon_europe_fund),
];

/// Returns the hardcoded programs for every known domain contained in `url`.
pub fn known_opportunities(url: &str) -> Vec<GeneratedOpportunity> {
    KNOWN_PROGRAMS
        .iter()
        .filter(|(key, _)| url.contains(key))
        .map(|(_, build)| build())
        .collect()
}

/// Draws a random sector.
pub fn random_sector(rng: &mut ChaCha8Rng) -> &'static str {
    SECTORS[rng.random_range(0..SECTORS.len())]
}

/// Builds a randomized generic development initiative.
///
/// One sector draw feeds both the title and `sector`, so the two always agree.
pub fn generic_opportunity(rng: &mut ChaCha8Rng) -> GeneratedOpportunity {
    let sector = random_sector(rng);
    GeneratedOpportunity {
        title: format!("{} Development Initiative", sector),
        description: "Supporting innovative approaches to address global development challenges through collaborative partnerships and evidence-based solutions.".to_string(),
        amount_min: rng.random_range(100_000..300_000),
        amount_max: rng.random_range(500_000..1_500_000),
        currency: "USD".to_string(),
        sector: sector.to_string(),
        eligibility_criteria: "Development organizations with proven track record".to_string(),
        application_process: "Submit detailed proposal with implementation plan".to_string(),
        confidence_score: rng.random_range(70..100),
    }
}

/// Generates the opportunities a visit to `url` turns up.
///
/// Known programs come first, followed by an optional generic initiative.
pub fn generate_realistic_opportunities(
    url: &str,
    rng: &mut ChaCha8Rng,
) -> Vec<GeneratedOpportunity> {
    let mut opportunities = known_opportunities(url);
    if rng.random_bool(GENERIC_OPPORTUNITY_PROBABILITY) {
        opportunities.push(generic_opportunity(rng));
    }
    opportunities
}
