use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use super::{HistoryStats, QueryOutcome, QuerySummary, Storage, StoredOutcome};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.init_schema().await?;

        Ok(storage)
    }

    /// Create an in-memory storage instance (tests, ephemeral runs)
    pub async fn new_in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").map_err(|e| {
            StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            }
        })?;

        // a single connection keeps every query on the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.init_schema().await?;

        Ok(storage)
    }

    /// Create the schema if it does not exist yet
    async fn init_schema(&self) -> StorageResult<()> {
        info!("Initializing database schema...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS queries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                query_text TEXT NOT NULL,
                response TEXT NOT NULL,
                quality_score REAL NOT NULL,
                claims_count INTEGER NOT NULL DEFAULT 0,
                evidence_count INTEGER NOT NULL DEFAULT 0,
                sources_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Schema {
            message: format!("Failed to create queries table: {}", e),
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                metadata TEXT,
                embedding TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Schema {
            message: format!("Failed to create documents table: {}", e),
        })?;

        info!("Database schema ready");
        Ok(())
    }

    /// Get the underlying pool for advanced queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn store_outcome(&self, outcome: &QueryOutcome) -> StorageResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO queries
            (query_text, response, quality_score, claims_count, evidence_count, sources_count, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&outcome.query)
        .bind(&outcome.report)
        .bind(outcome.quality_score)
        .bind(outcome.claims_count as i64)
        .bind(outcome.evidence_count as i64)
        .bind(outcome.sources_count as i64)
        .bind(outcome.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn fetch_recent(&self, limit: u32) -> StorageResult<Vec<QuerySummary>> {
        let rows: Vec<SummaryRow> = sqlx::query_as(
            r#"
            SELECT id, query_text, created_at, quality_score
            FROM queries
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn search_by_text(&self, substring: &str, limit: u32) -> StorageResult<Vec<StoredOutcome>> {
        let pattern = format!("%{}%", substring);

        let rows: Vec<OutcomeRow> = sqlx::query_as(
            r#"
            SELECT id, query_text, response, quality_score, created_at
            FROM queries
            WHERE query_text LIKE ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(&pattern)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn history_stats(&self) -> StorageResult<HistoryStats> {
        let row: (i64, Option<f64>) =
            sqlx::query_as("SELECT COUNT(*), AVG(quality_score) FROM queries")
                .fetch_one(&self.pool)
                .await?;

        Ok(HistoryStats {
            total_queries: row.0,
            average_quality: row.1.unwrap_or(0.0),
        })
    }
}

// Internal row types for SQLx mapping
#[derive(sqlx::FromRow)]
struct SummaryRow {
    id: i64,
    query_text: String,
    created_at: String,
    quality_score: f64,
}

impl From<SummaryRow> for QuerySummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: row.id,
            query: row.query_text,
            timestamp: parse_timestamp(&row.created_at),
            quality_score: row.quality_score,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OutcomeRow {
    id: i64,
    query_text: String,
    response: String,
    quality_score: f64,
    created_at: String,
}

impl From<OutcomeRow> for StoredOutcome {
    fn from(row: OutcomeRow) -> Self {
        Self {
            id: row.id,
            query: row.query_text,
            report: row.response,
            quality_score: row.quality_score,
            timestamp: parse_timestamp(&row.created_at),
        }
    }
}

fn parse_timestamp(raw: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(|_| chrono::Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(query: &str, quality: f64) -> QueryOutcome {
        QueryOutcome::new(query, format!("report for {query}"), quality, 2, 2, 3)
    }

    #[tokio::test]
    async fn test_store_and_fetch_recent() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();

        let first = storage.store_outcome(&outcome("rust history", 0.8)).await.unwrap();
        let second = storage.store_outcome(&outcome("ocean currents", 0.9)).await.unwrap();
        assert!(second > first);

        let recent = storage.fetch_recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        // newest first
        assert_eq!(recent[0].query, "ocean currents");
        assert_eq!(recent[1].query, "rust history");
    }

    #[tokio::test]
    async fn test_fetch_recent_respects_limit() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        for i in 0..5 {
            storage.store_outcome(&outcome(&format!("q{i}"), 0.5)).await.unwrap();
        }

        let recent = storage.fetch_recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
    }

    #[tokio::test]
    async fn test_search_by_text() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        storage.store_outcome(&outcome("rust borrow checker", 0.8)).await.unwrap();
        storage.store_outcome(&outcome("python gil", 0.7)).await.unwrap();

        let hits = storage.search_by_text("rust", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].query, "rust borrow checker");
        assert!(hits[0].report.contains("rust borrow checker"));

        let none = storage.search_by_text("golang", 10).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_history_stats() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();

        let empty = storage.history_stats().await.unwrap();
        assert_eq!(empty.total_queries, 0);
        assert_eq!(empty.average_quality, 0.0);

        storage.store_outcome(&outcome("a", 0.6)).await.unwrap();
        storage.store_outcome(&outcome("b", 0.8)).await.unwrap();

        let stats = storage.history_stats().await.unwrap();
        assert_eq!(stats.total_queries, 2);
        assert!((stats.average_quality - 0.7).abs() < 1e-9);
    }
}
