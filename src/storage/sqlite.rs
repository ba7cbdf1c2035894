//! SQLite-backed opportunity store.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::types::{
    BotRunStats, DonorOpportunity, NewDonorOpportunity, OpportunityFilter, StorageError,
    StorageResult,
};
use super::OpportunityStore;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS donor_opportunities (
    id                   TEXT    PRIMARY KEY,
    title                TEXT    NOT NULL,
    description          TEXT    NOT NULL,
    amount_min           INTEGER NOT NULL,
    amount_max           INTEGER NOT NULL,
    currency             TEXT    NOT NULL,
    source_url           TEXT    NOT NULL,
    source_name          TEXT    NOT NULL,
    country              TEXT    NOT NULL,
    sector               TEXT    NOT NULL,
    eligibility_criteria TEXT,
    application_process  TEXT,
    keywords             TEXT    NOT NULL DEFAULT '[]',
    focus_areas          TEXT    NOT NULL DEFAULT '[]',
    content_hash         TEXT    NOT NULL UNIQUE,
    is_verified          INTEGER NOT NULL DEFAULT 0,
    is_active            INTEGER NOT NULL DEFAULT 1,
    created_at           TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_donor_opportunities_sector ON donor_opportunities(sector);

CREATE TABLE IF NOT EXISTS bot_runs (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    bot_id              TEXT    NOT NULL,
    score               INTEGER NOT NULL,
    opportunities_found INTEGER NOT NULL,
    screenshots         INTEGER NOT NULL,
    success             INTEGER NOT NULL,
    reward_points       INTEGER NOT NULL,
    recorded_at         TEXT    NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_bot_runs_bot_id ON bot_runs(bot_id);
"#;

/// Aggregated statistics for one bot across all recorded runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BotTotals {
    pub runs: u64,
    pub errors: u64,
    pub opportunities_found: u64,
    pub screenshots: u64,
    pub reward_points: u64,
}

/// Opportunity store persisted in a SQLite database.
#[derive(Clone)]
pub struct SqliteOpportunityStore {
    pool: SqlitePool,
}

impl SqliteOpportunityStore {
    /// Opens (creating if missing) the database at `path` and applies the schema.
    pub async fn open(path: &str) -> StorageResult<Self> {
        let opts = SqliteConnectOptions::from_str(&format!("sqlite://{}", path))
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        let store = Self::from_pool(pool).await?;
        tracing::info!(path = path, "Opportunity store opened");
        Ok(store)
    }

    /// Opens a private in-memory database.
    pub async fn open_in_memory() -> StorageResult<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        // Every connection to :memory: is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        Self::from_pool(pool).await
    }

    /// Wraps an existing pool, applying the schema.
    pub async fn from_pool(pool: SqlitePool) -> StorageResult<Self> {
        sqlx::query(SCHEMA_SQL).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns aggregated statistics for `bot_id`.
    pub async fn bot_totals(&self, bot_id: &str) -> StorageResult<BotTotals> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS runs,
                    COALESCE(SUM(CASE WHEN success = 0 THEN 1 ELSE 0 END), 0) AS errors,
                    COALESCE(SUM(opportunities_found), 0) AS opportunities_found,
                    COALESCE(SUM(screenshots), 0) AS screenshots,
                    COALESCE(SUM(reward_points), 0) AS reward_points
             FROM bot_runs WHERE bot_id = ?1",
        )
        .bind(bot_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(BotTotals {
            runs: row.get::<i64, _>("runs") as u64,
            errors: row.get::<i64, _>("errors") as u64,
            opportunities_found: row.get::<i64, _>("opportunities_found") as u64,
            screenshots: row.get::<i64, _>("screenshots") as u64,
            reward_points: row.get::<i64, _>("reward_points") as u64,
        })
    }

    async fn hash_exists(&self, hash: &str) -> StorageResult<bool> {
        let row = sqlx::query("SELECT 1 FROM donor_opportunities WHERE content_hash = ?1")
            .bind(hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

fn row_to_opportunity(row: &SqliteRow) -> StorageResult<DonorOpportunity> {
    let id: String = row.get("id");
    let created_at: String = row.get("created_at");
    let keywords: String = row.get("keywords");
    let focus_areas: String = row.get("focus_areas");

    Ok(DonorOpportunity {
        id: Uuid::parse_str(&id)
            .map_err(|e| StorageError::InvalidRecord(format!("bad id '{}': {}", id, e)))?,
        title: row.get("title"),
        description: row.get("description"),
        amount_min: row.get("amount_min"),
        amount_max: row.get("amount_max"),
        currency: row.get("currency"),
        source_url: row.get("source_url"),
        source_name: row.get("source_name"),
        country: row.get("country"),
        sector: row.get("sector"),
        eligibility_criteria: row
            .get::<Option<String>, _>("eligibility_criteria")
            .unwrap_or_default(),
        application_process: row
            .get::<Option<String>, _>("application_process")
            .unwrap_or_default(),
        keywords: serde_json::from_str(&keywords)?,
        focus_areas: serde_json::from_str(&focus_areas)?,
        content_hash: row.get("content_hash"),
        is_verified: row.get::<i64, _>("is_verified") != 0,
        is_active: row.get::<i64, _>("is_active") != 0,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                StorageError::InvalidRecord(format!("bad created_at '{}': {}", created_at, e))
            })?,
    })
}

#[async_trait]
impl OpportunityStore for SqliteOpportunityStore {
    async fn create_donor_opportunity(
        &self,
        record: NewDonorOpportunity,
    ) -> StorageResult<DonorOpportunity> {
        record.validate()?;

        if self.hash_exists(&record.content_hash).await? {
            return Err(StorageError::Duplicate(record.content_hash));
        }

        let persisted = record.into_persisted();
        let keywords = serde_json::to_string(&persisted.keywords)?;
        let focus_areas = serde_json::to_string(&persisted.focus_areas)?;

        let result = sqlx::query(
            "INSERT INTO donor_opportunities (
                id, title, description, amount_min, amount_max, currency,
                source_url, source_name, country, sector, eligibility_criteria,
                application_process, keywords, focus_areas, content_hash,
                is_verified, is_active, created_at
            ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18)",
        )
        .bind(persisted.id.to_string())
        .bind(&persisted.title)
        .bind(&persisted.description)
        .bind(persisted.amount_min)
        .bind(persisted.amount_max)
        .bind(&persisted.currency)
        .bind(&persisted.source_url)
        .bind(&persisted.source_name)
        .bind(&persisted.country)
        .bind(&persisted.sector)
        .bind(&persisted.eligibility_criteria)
        .bind(&persisted.application_process)
        .bind(&keywords)
        .bind(&focus_areas)
        .bind(&persisted.content_hash)
        .bind(persisted.is_verified as i64)
        .bind(persisted.is_active as i64)
        .bind(persisted.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(persisted),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StorageError::Duplicate(persisted.content_hash))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_bot_stats(&self, stats: &BotRunStats) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO bot_runs (
                bot_id, score, opportunities_found, screenshots, success, reward_points
            ) VALUES (?1,?2,?3,?4,?5,?6)",
        )
        .bind(&stats.bot_id)
        .bind(i64::from(stats.score))
        .bind(i64::from(stats.opportunities_found))
        .bind(i64::from(stats.screenshots))
        .bind(stats.success as i64)
        .bind(i64::from(stats.reward_points))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_opportunities(
        &self,
        filter: &OpportunityFilter,
    ) -> StorageResult<Vec<DonorOpportunity>> {
        let rows = sqlx::query(
            "SELECT * FROM donor_opportunities
             WHERE (?1 IS NULL OR lower(sector) = lower(?1))
               AND (?2 IS NULL OR country = ?2)
               AND (?3 = 0 OR is_verified = 1)
             ORDER BY rowid
             LIMIT ?4 OFFSET ?5",
        )
        .bind(filter.sector.as_deref())
        .bind(filter.country.as_deref())
        .bind(filter.verified_only as i64)
        .bind(filter.limit as i64)
        .bind(filter.offset as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_opportunity).collect()
    }
}
