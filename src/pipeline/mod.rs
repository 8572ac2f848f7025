//! The adaptive quality-feedback pipeline.
//!
//! This module contains the decision core of the server:
//!
//! - [`QualityMetrics`]: deterministic reward scoring of a generated report
//! - [`build_enhancement`]: corrective feedback synthesis for failed metrics
//! - [`PipelineExecutor`]: one sequential pass through the four crew stages
//! - [`extract_counts`]: claim/source counting for stored statistics
//! - [`RetryController`]: the bounded retry-with-feedback state machine
//! - [`PerformanceTracker`]: process-wide record of quality improvement
//!
//! ```text
//! run(query) ──▶ execute ──▶ evaluate ──▶ below threshold? ──▶ enhance ──┐
//!                  ▲                                                     │
//!                  └─────────────────────────────────────────────────────┘
//! ```

mod controller;
mod enhancement;
mod executor;
mod metrics;
mod reward;
mod tracker;

pub use controller::{ImprovementStep, RetryController, RunOutcome};
pub use enhancement::build_enhancement;
pub use executor::{PipelineExecutor, StageRole, StageRunner};
pub use metrics::{extract_counts, ReportCounts};
pub use reward::QualityMetrics;
pub use tracker::{PerformanceRecord, PerformanceStats, PerformanceTracker, QualityTrend};
