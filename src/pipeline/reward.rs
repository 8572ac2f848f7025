//! Deterministic reward scoring for generated reports.
//!
//! Scoring is a pure function of the report text. Identical input always
//! yields identical metrics, which is what makes the retry controller
//! testable without a live model.

use serde::{Deserialize, Serialize};

/// Section markers a complete report must contain.
const REQUIRED_SECTIONS: [&str; 3] = ["Overview", "Claims", "Sources"];

/// Minimum number of heading markers for the structure signal.
const MIN_HEADING_MARKERS: usize = 3;
/// Minimum number of bullet markers (either style) for the structure signal.
const MIN_BULLET_MARKERS: usize = 5;

const COMPLETENESS_WEIGHT: f64 = 0.4;
const STRUCTURE_WEIGHT: f64 = 0.3;
const EVIDENCE_WEIGHT: f64 = 0.3;

/// Quality metrics for a single report attempt.
///
/// All values are in `[0.0, 1.0]`. `overall` is the fixed weighted sum
/// `0.4 * completeness + 0.3 * structure + 0.3 * evidence_ratio`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Fraction of required section markers present.
    pub completeness: f64,
    /// Average of the heading and bullet density signals.
    pub structure: f64,
    /// Ratio of evidence signals to claim signals, capped at 1.
    pub evidence_ratio: f64,
    /// Weighted overall score.
    pub overall: f64,
}

impl QualityMetrics {
    /// Score a report. Total function: missing markers yield low scores,
    /// never an error.
    pub fn evaluate(report: &str) -> Self {
        let found = REQUIRED_SECTIONS
            .iter()
            .filter(|section| report.contains(**section))
            .count();
        let completeness = found as f64 / REQUIRED_SECTIONS.len() as f64;

        let has_headers = report.matches('#').count() >= MIN_HEADING_MARKERS;
        let has_bullets = report.matches('*').count() >= MIN_BULLET_MARKERS
            || report.matches('-').count() >= MIN_BULLET_MARKERS;
        let structure = (has_headers as u8 + has_bullets as u8) as f64 / 2.0;

        let lower = report.to_lowercase();
        let claim_signal = lower.matches("claim").count();
        let evidence_signal = lower.matches("evidence").count() + lower.matches("according to").count();
        // 0.5 when no claim signal exists: neither rewards nor punishes absence
        let evidence_ratio = if claim_signal > 0 {
            (evidence_signal as f64 / claim_signal as f64).min(1.0)
        } else {
            0.5
        };

        let overall = COMPLETENESS_WEIGHT * completeness
            + STRUCTURE_WEIGHT * structure
            + EVIDENCE_WEIGHT * evidence_ratio;

        Self {
            completeness,
            structure,
            evidence_ratio,
            overall,
        }
    }
}
