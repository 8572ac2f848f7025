//! Corrective feedback synthesis for retry attempts.

use super::reward::QualityMetrics;

/// Completeness below this emits the missing-sections instruction.
const COMPLETENESS_FLOOR: f64 = 0.8;
/// Evidence ratio below this emits the claims-need-evidence instruction.
const EVIDENCE_FLOOR: f64 = 0.5;
/// Structure below this emits the formatting instruction.
const STRUCTURE_FLOOR: f64 = 0.7;

/// Build the corrective instruction text for a retry attempt.
///
/// Returns the empty string exactly when no sub-metric fell below its floor;
/// callers must treat empty as "do not modify the next attempt's prompts".
/// Instruction order is fixed (completeness, evidence, structure) so retries
/// are reproducible.
pub fn build_enhancement(metrics: &QualityMetrics) -> String {
    let mut issues: Vec<&str> = Vec::new();

    if metrics.completeness < COMPLETENESS_FLOOR {
        issues.push(
            "CRITICAL: the report is missing required sections. Include ALL of: \
             Overview, Key Claims, Sources.",
        );
    }
    if metrics.evidence_ratio < EVIDENCE_FLOOR {
        issues.push(
            "Every claim must be backed by explicit evidence. For each claim, state \
             the supporting evidence or cite where it comes from (\"according to ...\").",
        );
    }
    if metrics.structure < STRUCTURE_FLOOR {
        issues.push(
            "Improve the report structure: use Markdown headers for each section and \
             bullet points for lists.",
        );
    }

    if issues.is_empty() {
        return String::new();
    }

    let mut enhancement =
        String::from("The previous attempt fell short on quality. Address these issues:\n");
    for issue in issues {
        enhancement.push_str("- ");
        enhancement.push_str(issue);
        enhancement.push('\n');
    }
    enhancement
}
