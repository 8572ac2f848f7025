//! Process-wide record of quality improvement across queries.
//!
//! The tracker is page-1 diagnostic data, not a store of record: it starts
//! empty at process start, grows for the process lifetime, and is never
//! persisted. It is owned by the hosting service and injected where needed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::controller::{ImprovementStep, RunOutcome};

/// How many records each end of the trend comparison looks at.
const TREND_WINDOW: usize = 5;

/// One completed query's quality trajectory.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceRecord {
    pub query: String,
    pub initial_quality: f64,
    pub final_quality: f64,
    pub retry_count: u32,
    pub improved: bool,
    pub improvements: Vec<ImprovementStep>,
    pub timestamp: DateTime<Utc>,
}

/// Coarse quality trend across the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTrend {
    Improving,
    Stable,
    InsufficientData,
}

impl std::fmt::Display for QualityTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityTrend::Improving => write!(f, "improving"),
            QualityTrend::Stable => write!(f, "stable"),
            QualityTrend::InsufficientData => write!(f, "insufficient_data"),
        }
    }
}

/// Aggregate statistics over all tracked queries.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceStats {
    pub total_queries: usize,
    pub average_quality: f64,
    pub improvement_rate: f64,
    pub retry_rate: f64,
    pub trend: QualityTrend,
}

/// Thread-safe append-only tracker of [`PerformanceRecord`]s.
#[derive(Debug, Default)]
pub struct PerformanceTracker {
    records: RwLock<Vec<PerformanceRecord>>,
}

impl PerformanceTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record for a completed run.
    pub async fn record(&self, query: &str, outcome: &RunOutcome) {
        let record = PerformanceRecord {
            query: query.to_string(),
            initial_quality: outcome.initial_quality,
            final_quality: outcome.metrics.overall,
            retry_count: outcome.retry_count,
            improved: outcome.improved(),
            improvements: outcome.improvements.clone(),
            timestamp: Utc::now(),
        };

        let mut records = self.records.write().await;
        records.push(record);
        debug!(total = records.len(), "Performance record appended");
    }

    /// Snapshot of all records, oldest first.
    pub async fn history(&self) -> Vec<PerformanceRecord> {
        self.records.read().await.clone()
    }

    /// Aggregate statistics including the quality trend.
    pub async fn stats(&self) -> PerformanceStats {
        let records = self.records.read().await;
        let total = records.len();

        if total == 0 {
            return PerformanceStats {
                total_queries: 0,
                average_quality: 0.0,
                improvement_rate: 0.0,
                retry_rate: 0.0,
                trend: QualityTrend::InsufficientData,
            };
        }

        let average_quality =
            records.iter().map(|r| r.final_quality).sum::<f64>() / total as f64;
        let improvement_rate =
            records.iter().filter(|r| r.improved).count() as f64 / total as f64;
        let retry_rate =
            records.iter().filter(|r| r.retry_count > 0).count() as f64 / total as f64;

        let trend = if total < 2 {
            QualityTrend::InsufficientData
        } else {
            let early: Vec<f64> = records
                .iter()
                .take(TREND_WINDOW)
                .map(|r| r.final_quality)
                .collect();
            let recent: Vec<f64> = records
                .iter()
                .rev()
                .take(TREND_WINDOW)
                .map(|r| r.final_quality)
                .collect();
            let early_mean = early.iter().sum::<f64>() / early.len() as f64;
            let recent_mean = recent.iter().sum::<f64>() / recent.len() as f64;
            if recent_mean > early_mean {
                QualityTrend::Improving
            } else {
                QualityTrend::Stable
            }
        };

        PerformanceStats {
            total_queries: total,
            average_quality,
            improvement_rate,
            retry_rate,
            trend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::reward::QualityMetrics;

    fn outcome(initial: f64, fin: f64, retries: u32) -> RunOutcome {
        let improvements = (1..=retries)
            .map(|retry| ImprovementStep {
                retry,
                previous_quality: initial,
                enhancement: "fix it".to_string(),
            })
            .collect();
        RunOutcome {
            report: "report".to_string(),
            metrics: QualityMetrics {
                completeness: fin,
                structure: fin,
                evidence_ratio: fin,
                overall: fin,
            },
            initial_quality: initial,
            retry_count: retries,
            improvements,
        }
    }

    #[tokio::test]
    async fn test_empty_tracker_stats() {
        let tracker = PerformanceTracker::new();
        let stats = tracker.stats().await;
        assert_eq!(stats.total_queries, 0);
        assert_eq!(stats.average_quality, 0.0);
        assert_eq!(stats.trend, QualityTrend::InsufficientData);
    }

    #[tokio::test]
    async fn test_single_record_is_insufficient_for_trend() {
        let tracker = PerformanceTracker::new();
        tracker.record("q", &outcome(0.5, 0.9, 1)).await;
        let stats = tracker.stats().await;
        assert_eq!(stats.total_queries, 1);
        assert_eq!(stats.trend, QualityTrend::InsufficientData);
    }

    #[tokio::test]
    async fn test_rates_and_average() {
        let tracker = PerformanceTracker::new();
        tracker.record("a", &outcome(0.5, 0.9, 1)).await; // improved, retried
        tracker.record("b", &outcome(0.8, 0.8, 0)).await; // neither

        let stats = tracker.stats().await;
        assert_eq!(stats.total_queries, 2);
        assert!((stats.average_quality - 0.85).abs() < 1e-9);
        assert!((stats.improvement_rate - 0.5).abs() < 1e-9);
        assert!((stats.retry_rate - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_trend_improving_over_six_records() {
        let tracker = PerformanceTracker::new();
        for quality in [0.5, 0.6, 0.7, 0.8, 0.9, 0.95] {
            tracker.record("q", &outcome(quality, quality, 0)).await;
        }
        let stats = tracker.stats().await;
        // mean(last 5) = 0.79 > mean(first 5) = 0.70
        assert_eq!(stats.trend, QualityTrend::Improving);
    }

    #[tokio::test]
    async fn test_trend_stable_on_tie() {
        let tracker = PerformanceTracker::new();
        tracker.record("a", &outcome(0.7, 0.7, 0)).await;
        tracker.record("b", &outcome(0.7, 0.7, 0)).await;
        let stats = tracker.stats().await;
        assert_eq!(stats.trend, QualityTrend::Stable);
    }

    #[tokio::test]
    async fn test_trend_stable_when_declining() {
        let tracker = PerformanceTracker::new();
        for quality in [0.9, 0.8, 0.7, 0.6] {
            tracker.record("q", &outcome(quality, quality, 0)).await;
        }
        let stats = tracker.stats().await;
        assert_eq!(stats.trend, QualityTrend::Stable);
    }

    #[tokio::test]
    async fn test_record_preserves_improvements() {
        let tracker = PerformanceTracker::new();
        tracker.record("q", &outcome(0.2, 0.9, 2)).await;
        let history = tracker.history().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].improvements.len(), 2);
        assert_eq!(history[0].retry_count, 2);
        assert!(history[0].improved);
    }

    #[tokio::test]
    async fn test_concurrent_appends_lose_nothing() {
        use std::sync::Arc;

        let tracker = Arc::new(PerformanceTracker::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let tracker = Arc::clone(&tracker);
            handles.push(tokio::spawn(async move {
                tracker.record(&format!("q{i}"), &outcome(0.5, 0.8, 1)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(tracker.history().await.len(), 32);
    }
}
