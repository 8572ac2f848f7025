//! The bounded retry-with-feedback state machine.
//!
//! ```text
//! INIT → RUNNING → EVALUATING → DONE
//!            ▲           │
//!            └─ ENHANCING ┘   (while below threshold and retries remain)
//! ```
//!
//! Terminal state is reached either because quality met the threshold or
//! retries ran out; both are success outcomes. The latest attempt always
//! wins, even when it scores lower than an earlier one.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::enhancement::build_enhancement;
use super::executor::{PipelineExecutor, StageRunner};
use super::reward::QualityMetrics;
use crate::config::QualityConfig;
use crate::error::AppResult;

/// One retry's corrective step, recorded before the retry executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementStep {
    /// 1-based retry number.
    pub retry: u32,
    /// Overall quality of the attempt that triggered this retry.
    pub previous_quality: f64,
    /// Corrective instruction text injected into the retry's prompts.
    pub enhancement: String,
}

/// Result of a completed retry loop.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// The final attempt's report text.
    pub report: String,
    /// The final attempt's quality metrics.
    pub metrics: QualityMetrics,
    /// Overall quality of the very first attempt.
    pub initial_quality: f64,
    /// Number of retries performed (0 when the first attempt passed).
    pub retry_count: u32,
    /// One entry per retry, in order.
    pub improvements: Vec<ImprovementStep>,
}

impl RunOutcome {
    /// Whether the final attempt scored above the first one.
    pub fn improved(&self) -> bool {
        self.metrics.overall > self.initial_quality
    }
}

/// Runs the pipeline, scores the result, and retries with corrective
/// feedback while quality stays below the configured threshold.
#[derive(Clone)]
pub struct RetryController<R> {
    executor: PipelineExecutor<R>,
    quality: QualityConfig,
}

impl<R: StageRunner> RetryController<R> {
    /// Create a controller with the given stage runner and quality config.
    pub fn new(runner: R, quality: QualityConfig) -> Self {
        Self {
            executor: PipelineExecutor::new(runner),
            quality,
        }
    }

    /// Run the full quality-feedback loop for one query.
    ///
    /// Performs `1 + retry_count` pipeline executions, strictly one after
    /// another: each retry's enhancement depends on the prior attempt's
    /// measured metrics. Any pipeline failure fails the whole run; no
    /// partial retry state is returned.
    pub async fn run(&self, query: &str) -> AppResult<RunOutcome> {
        let mut report = self.executor.execute(query, "").await?;
        let mut metrics = QualityMetrics::evaluate(&report);
        let initial_quality = metrics.overall;

        let mut retry_count = 0u32;
        let mut improvements = Vec::new();

        while metrics.overall < self.quality.threshold && retry_count < self.quality.max_retries {
            retry_count += 1;
            let enhancement = build_enhancement(&metrics);

            info!(
                retry = retry_count,
                quality = metrics.overall,
                threshold = self.quality.threshold,
                "Report below quality threshold, retrying with feedback"
            );

            improvements.push(ImprovementStep {
                retry: retry_count,
                previous_quality: metrics.overall,
                enhancement: enhancement.clone(),
            });

            report = self.executor.execute(query, &enhancement).await?;
            metrics = QualityMetrics::evaluate(&report);
        }

        if metrics.overall < self.quality.threshold {
            warn!(
                quality = metrics.overall,
                retries = retry_count,
                "Retries exhausted below quality threshold, returning last attempt"
            );
        }

        Ok(RunOutcome {
            report,
            metrics,
            initial_quality,
            retry_count,
            improvements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::error::AgentError;
    use crate::pipeline::executor::{MockStageRunner, StageRole};

    /// A report scoring 1.0 on every sub-metric.
    const GOOD_REPORT: &str = "\
## Overview
An answer.

## Key Claims
* claim 1 backed by evidence
* claim 2 has evidence, according to the cited source

## Sources
* https://example.com/a
* https://example.com/b
* https://example.com/c
* https://example.com/d
";

    fn quality_config() -> QualityConfig {
        QualityConfig {
            threshold: 0.65,
            max_retries: 2,
        }
    }

    /// Stage runner whose writer emits the given report per attempt
    /// (last entry repeats once attempts run out).
    fn scripted_runner(reports: Vec<&'static str>) -> MockStageRunner {
        let attempt = Arc::new(AtomicUsize::new(0));
        let mut mock = MockStageRunner::new();
        mock.expect_run_stage().returning(move |role, _, _, _| {
            if role == StageRole::Writer {
                let n = attempt.fetch_add(1, Ordering::SeqCst);
                Ok(reports[n.min(reports.len() - 1)].to_string())
            } else {
                Ok("stage output".to_string())
            }
        });
        mock
    }

    #[tokio::test]
    async fn test_good_first_attempt_runs_once() {
        let controller = RetryController::new(scripted_runner(vec![GOOD_REPORT]), quality_config());

        let outcome = controller.run("query").await.unwrap();
        assert_eq!(outcome.retry_count, 0);
        assert!(outcome.improvements.is_empty());
        assert!((outcome.metrics.overall - 1.0).abs() < 1e-9);
        assert_eq!(outcome.initial_quality, outcome.metrics.overall);
        assert!(!outcome.improved());
    }

    #[tokio::test]
    async fn test_poor_report_exhausts_retries() {
        // empty report scores 0.15 forever: both retries fire, then the
        // last attempt is returned as a success
        let controller = RetryController::new(scripted_runner(vec![""]), quality_config());

        let outcome = controller.run("query").await.unwrap();
        assert_eq!(outcome.retry_count, 2);
        assert_eq!(outcome.improvements.len(), 2);
        assert!((outcome.metrics.overall - 0.15).abs() < 1e-9);
        assert_eq!(outcome.improvements[0].retry, 1);
        assert_eq!(outcome.improvements[1].retry, 2);
        assert!((outcome.improvements[0].previous_quality - 0.15).abs() < 1e-9);
        assert!(!outcome.improvements[0].enhancement.is_empty());
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_feedback() {
        let controller =
            RetryController::new(scripted_runner(vec!["", GOOD_REPORT]), quality_config());

        let outcome = controller.run("query").await.unwrap();
        assert_eq!(outcome.retry_count, 1);
        assert_eq!(outcome.improvements.len(), 1);
        assert!((outcome.metrics.overall - 1.0).abs() < 1e-9);
        assert!((outcome.initial_quality - 0.15).abs() < 1e-9);
        assert!(outcome.improved());
    }

    #[tokio::test]
    async fn test_improvements_length_always_equals_retry_count() {
        for reports in [vec![GOOD_REPORT], vec!["", GOOD_REPORT], vec![""]] {
            let controller = RetryController::new(scripted_runner(reports), quality_config());
            let outcome = controller.run("query").await.unwrap();
            assert_eq!(outcome.improvements.len() as u32, outcome.retry_count);
            assert!(outcome.retry_count <= quality_config().max_retries);
        }
    }

    #[tokio::test]
    async fn test_latest_attempt_wins_even_when_worse() {
        // first retry produces a mid-quality report still below threshold,
        // second retry comes back empty; the empty report is final
        let mid = "## Overview\n## Sources\n";
        let controller =
            RetryController::new(scripted_runner(vec![mid, mid, ""]), quality_config());

        let outcome = controller.run("query").await.unwrap();
        assert_eq!(outcome.retry_count, 2);
        assert!((outcome.metrics.overall - 0.15).abs() < 1e-9);
        assert!(outcome.metrics.overall < outcome.improvements[1].previous_quality);
        assert!(!outcome.improved());
    }

    #[tokio::test]
    async fn test_stage_failure_fails_the_run() {
        let mut mock = MockStageRunner::new();
        mock.expect_run_stage().returning(|_, _, _, _| {
            Err(AgentError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        });

        let controller = RetryController::new(mock, quality_config());
        let err = controller.run("query").await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_zero_max_retries_never_retries() {
        let controller = RetryController::new(
            scripted_runner(vec![""]),
            QualityConfig {
                threshold: 0.65,
                max_retries: 0,
            },
        );

        let outcome = controller.run("query").await.unwrap();
        assert_eq!(outcome.retry_count, 0);
        assert!(outcome.improvements.is_empty());
    }
}
