//! Persistence layer for query history and semantic search.
//!
//! Relational history lives in SQLite (`queries` table); the semantic index
//! stores report embeddings alongside it (`documents` table) and is searched
//! by cosine distance. The pipeline core only constructs outcomes and hands
//! them off through the [`Storage`] and [`VectorStore`] traits.

mod sqlite;
mod vector;

pub use sqlite::SqliteStorage;
pub use vector::{cosine_distance, Embedder, SqliteVectorStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;

/// The persisted unit of one completed research run.
///
/// Created once per `run` call, after the retry loop terminates. The raw
/// per-attempt metrics are never stored; only the final overall score is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryOutcome {
    /// The user query.
    pub query: String,
    /// The final report text.
    pub report: String,
    /// Final overall quality score.
    pub quality_score: f64,
    /// Claims counted in the final report.
    pub claims_count: u32,
    /// Evidence count stored alongside the claims count.
    pub evidence_count: u32,
    /// Sources counted in the final report.
    pub sources_count: u32,
    /// When the run completed.
    pub timestamp: DateTime<Utc>,
}

/// Summary row for history listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySummary {
    pub id: i64,
    pub query: String,
    pub timestamp: DateTime<Utc>,
    pub quality_score: f64,
}

/// Full stored outcome with its row id, as returned by text search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredOutcome {
    pub id: i64,
    pub query: String,
    pub report: String,
    pub quality_score: f64,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate counts over the relational history.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct HistoryStats {
    pub total_queries: i64,
    pub average_quality: f64,
}

/// A semantic search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SemanticHit {
    pub text: String,
    pub metadata: serde_json::Value,
    pub distance: f64,
}

/// Relational history operations.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store one outcome, returning its row id.
    async fn store_outcome(&self, outcome: &QueryOutcome) -> StorageResult<i64>;
    /// Most recent outcomes, newest first.
    async fn fetch_recent(&self, limit: u32) -> StorageResult<Vec<QuerySummary>>;
    /// Outcomes whose query text contains the given substring, newest first.
    async fn search_by_text(&self, substring: &str, limit: u32) -> StorageResult<Vec<StoredOutcome>>;
    /// Aggregate history counts.
    async fn history_stats(&self) -> StorageResult<HistoryStats>;
}

/// Semantic index operations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Embed and index one document.
    async fn index(&self, text: &str, metadata: serde_json::Value) -> StorageResult<()>;
    /// Top-k nearest documents to the query text, closest first.
    async fn search(&self, query_text: &str, top_k: usize) -> StorageResult<Vec<SemanticHit>>;
    /// Number of indexed documents.
    async fn document_count(&self) -> StorageResult<i64>;
}

impl QueryOutcome {
    /// Build an outcome stamped with the current time.
    pub fn new(
        query: impl Into<String>,
        report: impl Into<String>,
        quality_score: f64,
        claims_count: u32,
        evidence_count: u32,
        sources_count: u32,
    ) -> Self {
        Self {
            query: query.into(),
            report: report.into(),
            quality_score,
            claims_count,
            evidence_count,
            sources_count,
            timestamp: Utc::now(),
        }
    }
}
