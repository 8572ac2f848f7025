//! The research service facade.
//!
//! Ties the retry controller to persistence and performance tracking, and
//! exposes the operations the transport layer serves. Everything downstream
//! of a successful final attempt (metric extraction, persistence, tracking)
//! degrades gracefully: a lost history write never turns a successful
//! research run into a failure.

use std::time::Instant;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::agents::AgentClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::memory::{
    HistoryStats, QueryOutcome, QuerySummary, SemanticHit, SqliteStorage, SqliteVectorStore,
    Storage, StoredOutcome, VectorStore,
};
use crate::pipeline::{
    extract_counts, ImprovementStep, PerformanceRecord, PerformanceStats, PerformanceTracker,
    QualityMetrics, RetryController,
};

/// Metadata attached to a successful research result.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchMetadata {
    pub query: String,
    /// Row id of the stored outcome; `None` when the history write failed.
    pub query_id: Option<i64>,
    /// Wall-clock seconds for the whole retry loop.
    pub execution_time: f64,
    pub quality_score: f64,
    pub quality_metrics: QualityMetrics,
    pub claims_count: u32,
    pub sources_count: u32,
    pub retry_count: u32,
    pub improved: bool,
    pub improvements: Vec<ImprovementStep>,
}

/// Successful result of one research run.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchResult {
    pub success: bool,
    pub report: String,
    pub metadata: ResearchMetadata,
}

/// Combined persistence statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub total_queries: i64,
    pub average_quality: f64,
    pub documents: i64,
}

/// Facade over the retry controller, persistence, and performance tracking.
pub struct ResearchService {
    controller: RetryController<AgentClient>,
    storage: SqliteStorage,
    vector: SqliteVectorStore<AgentClient>,
    tracker: PerformanceTracker,
}

impl ResearchService {
    /// Create the service from its collaborators.
    ///
    /// The tracker starts empty and lives for the process lifetime; it is
    /// never persisted.
    pub fn new(config: &Config, storage: SqliteStorage, client: AgentClient) -> Self {
        let vector = SqliteVectorStore::new(&storage, client.clone());
        let controller = RetryController::new(client, config.quality.clone());

        Self {
            controller,
            storage,
            vector,
            tracker: PerformanceTracker::new(),
        }
    }

    /// Run the full research pipeline for one query.
    ///
    /// Only a pipeline stage failure fails the run. Persistence and indexing
    /// failures are logged as warnings and reflected as `query_id: None`.
    pub async fn run(&self, query: &str) -> AppResult<ResearchResult> {
        let start = Instant::now();
        info!(query, "Starting research run");

        let outcome = self.controller.run(query).await?;
        let counts = extract_counts(&outcome.report);

        let record = QueryOutcome::new(
            query,
            &outcome.report,
            outcome.metrics.overall,
            counts.claims_count,
            counts.claims_count,
            counts.sources_count,
        );
        let query_id = match self.storage.store_outcome(&record).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(error = %e, "Failed to store query outcome, continuing");
                None
            }
        };

        let metadata = json!({
            "query": query,
            "query_id": query_id,
            "timestamp": record.timestamp.to_rfc3339(),
        });
        if let Err(e) = self.vector.index(&outcome.report, metadata).await {
            warn!(error = %e, "Failed to index report, continuing");
        }

        self.tracker.record(query, &outcome).await;

        let execution_time = start.elapsed().as_secs_f64();
        info!(
            quality = outcome.metrics.overall,
            retries = outcome.retry_count,
            claims = counts.claims_count,
            sources = counts.sources_count,
            execution_time,
            "Research run completed"
        );

        Ok(ResearchResult {
            success: true,
            metadata: ResearchMetadata {
                query: query.to_string(),
                query_id,
                execution_time,
                quality_score: outcome.metrics.overall,
                quality_metrics: outcome.metrics,
                claims_count: counts.claims_count,
                sources_count: counts.sources_count,
                retry_count: outcome.retry_count,
                improved: outcome.improved(),
                improvements: outcome.improvements.clone(),
            },
            report: outcome.report,
        })
    }

    /// Most recent stored outcomes, newest first.
    pub async fn history(&self, limit: u32) -> AppResult<Vec<QuerySummary>> {
        Ok(self.storage.fetch_recent(limit).await?)
    }

    /// Substring search over stored queries.
    pub async fn search(&self, term: &str, limit: u32) -> AppResult<Vec<StoredOutcome>> {
        Ok(self.storage.search_by_text(term, limit).await?)
    }

    /// Semantic search over indexed reports.
    pub async fn semantic_search(&self, query: &str, top_k: usize) -> AppResult<Vec<SemanticHit>> {
        Ok(self.vector.search(query, top_k).await?)
    }

    /// Quality-loop statistics across this process's queries.
    pub async fn performance_stats(&self) -> PerformanceStats {
        self.tracker.stats().await
    }

    /// Full per-query improvement history for this process.
    pub async fn performance_history(&self) -> Vec<PerformanceRecord> {
        self.tracker.history().await
    }

    /// Persistence statistics across relational history and the index.
    pub async fn memory_stats(&self) -> AppResult<MemoryStats> {
        let HistoryStats {
            total_queries,
            average_quality,
        } = self.storage.history_stats().await?;
        let documents = self.vector.document_count().await?;

        Ok(MemoryStats {
            total_queries,
            average_quality,
            documents,
        })
    }
}
