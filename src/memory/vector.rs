//! Semantic index over stored reports.
//!
//! Embeddings come from the agent API's embed endpoint and are kept as JSON
//! vectors in the `documents` table; search is a cosine-distance scan. The
//! index is small (one document per completed query), so a linear scan is
//! adequate.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use super::{SemanticHit, SqliteStorage, VectorStore};
use crate::agents::AgentClient;
use crate::error::{AgentResult, StorageError, StorageResult};

/// Capability interface for turning text into embedding vectors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed the given chunks, one vector per chunk.
    async fn embed(&self, chunks: Vec<String>) -> AgentResult<Vec<Vec<f64>>>;
}

#[async_trait]
impl Embedder for AgentClient {
    async fn embed(&self, chunks: Vec<String>) -> AgentResult<Vec<Vec<f64>>> {
        AgentClient::embed(self, chunks).await
    }
}

/// Cosine distance between two vectors (`1 - cosine similarity`).
///
/// Mismatched lengths or zero-norm vectors yield the maximum distance
/// instead of an error.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 1.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a * norm_b)
}

/// SQLite-backed vector store using an injected [`Embedder`].
#[derive(Clone)]
pub struct SqliteVectorStore<E> {
    pool: SqlitePool,
    embedder: E,
}

impl<E: Embedder> SqliteVectorStore<E> {
    /// Create a vector store sharing the relational storage's pool.
    pub fn new(storage: &SqliteStorage, embedder: E) -> Self {
        Self {
            pool: storage.pool().clone(),
            embedder,
        }
    }
}

#[async_trait]
impl<E: Embedder> VectorStore for SqliteVectorStore<E> {
    async fn index(&self, text: &str, metadata: serde_json::Value) -> StorageResult<()> {
        let vectors = self
            .embedder
            .embed(vec![text.to_string()])
            .await
            .map_err(|e| StorageError::Query {
                message: format!("Embedding failed: {}", e),
            })?;

        let embedding = vectors.first().ok_or_else(|| StorageError::Query {
            message: "Embed endpoint returned no vectors".to_string(),
        })?;

        let id = Uuid::new_v4().to_string();
        let embedding_json =
            serde_json::to_string(embedding).map_err(|e| StorageError::Query {
                message: format!("Failed to encode embedding: {}", e),
            })?;
        let metadata_json =
            serde_json::to_string(&metadata).map_err(|e| StorageError::Query {
                message: format!("Failed to encode metadata: {}", e),
            })?;

        sqlx::query(
            r#"
            INSERT INTO documents (id, content, metadata, embedding, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(text)
        .bind(&metadata_json)
        .bind(&embedding_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(document_id = %id, "Document indexed");
        Ok(())
    }

    async fn search(&self, query_text: &str, top_k: usize) -> StorageResult<Vec<SemanticHit>> {
        let vectors = self
            .embedder
            .embed(vec![query_text.to_string()])
            .await
            .map_err(|e| StorageError::Query {
                message: format!("Embedding failed: {}", e),
            })?;

        let query_vector = vectors.first().ok_or_else(|| StorageError::Query {
            message: "Embed endpoint returned no vectors".to_string(),
        })?;

        let rows: Vec<(String, Option<String>, String)> =
            sqlx::query_as("SELECT content, metadata, embedding FROM documents")
                .fetch_all(&self.pool)
                .await?;

        let mut hits: Vec<SemanticHit> = rows
            .into_iter()
            .filter_map(|(content, metadata, embedding)| {
                let vector: Vec<f64> = serde_json::from_str(&embedding).ok()?;
                let metadata = metadata
                    .and_then(|m| serde_json::from_str(&m).ok())
                    .unwrap_or(serde_json::Value::Null);
                Some(SemanticHit {
                    text: content,
                    metadata,
                    distance: cosine_distance(query_vector, &vector),
                })
            })
            .collect();

        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);

        Ok(hits)
    }

    async fn document_count(&self) -> StorageResult<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cosine_distance_identity() {
        let v = [0.5, 0.5, 0.7];
        assert!(cosine_distance(&v, &v).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_distance_orthogonal() {
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_distance_degenerate_inputs() {
        assert_eq!(cosine_distance(&[], &[]), 1.0);
        assert_eq!(cosine_distance(&[1.0], &[1.0, 2.0]), 1.0);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 1.0]), 1.0);
    }

    /// Embedder double mapping known texts to fixed vectors.
    fn stub_embedder() -> MockEmbedder {
        let mut mock = MockEmbedder::new();
        mock.expect_embed().returning(|chunks| {
            let vectors = chunks
                .iter()
                .map(|chunk| {
                    if chunk.contains("ocean") {
                        vec![1.0, 0.0, 0.0]
                    } else if chunk.contains("space") {
                        vec![0.0, 1.0, 0.0]
                    } else {
                        vec![0.0, 0.0, 1.0]
                    }
                })
                .collect();
            Ok(vectors)
        });
        mock
    }

    #[tokio::test]
    async fn test_index_and_search_orders_by_distance() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let store = SqliteVectorStore::new(&storage, stub_embedder());

        store
            .index("report about ocean currents", json!({"query_id": 1}))
            .await
            .unwrap();
        store
            .index("report about space travel", json!({"query_id": 2}))
            .await
            .unwrap();

        let hits = store.search("deep ocean research", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].text.contains("ocean"));
        assert!(hits[0].distance < hits[1].distance);
        assert_eq!(hits[0].metadata["query_id"], 1);
    }

    #[tokio::test]
    async fn test_search_respects_top_k() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let store = SqliteVectorStore::new(&storage, stub_embedder());

        for i in 0..4 {
            store.index(&format!("space doc {i}"), json!({})).await.unwrap();
        }

        let hits = store.search("space", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_document_count() {
        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let store = SqliteVectorStore::new(&storage, stub_embedder());

        assert_eq!(store.document_count().await.unwrap(), 0);
        store.index("a doc", json!({})).await.unwrap();
        assert_eq!(store.document_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_index_surfaces_embedder_failure() {
        use crate::error::AgentError;

        let mut mock = MockEmbedder::new();
        mock.expect_embed().returning(|_| {
            Err(AgentError::Api {
                status: 500,
                message: "embed down".to_string(),
            })
        });

        let storage = SqliteStorage::new_in_memory().await.unwrap();
        let store = SqliteVectorStore::new(&storage, mock);

        let err = store.index("doc", json!({})).await.unwrap_err();
        assert!(err.to_string().contains("Embedding failed"));
    }
}
