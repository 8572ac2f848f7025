//! Claim and source counting for stored report statistics.
//!
//! These are best-effort text-pattern counts, not a Markdown parser. They
//! tolerate absent sections (count 0) and never fail. Counting is separate
//! from quality scoring: these numbers feed the stored outcome record, not
//! the retry decision.

use serde::Serialize;

/// Literal markers counted by the source fallback scan.
const SOURCE_MARKERS: [&str; 5] = [
    "http://",
    "https://",
    "Encyclopedia",
    "Journal",
    "Publication",
];

/// Claim and source counts extracted from a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub claims_count: u32,
    pub sources_count: u32,
}

/// Extract claim and source counts from a report.
pub fn extract_counts(report: &str) -> ReportCounts {
    ReportCounts {
        claims_count: count_claims(report),
        sources_count: count_sources(report),
    }
}

/// Count claims: primary scan for literal "Claim N" lines, falling back to
/// numbered lines under a "Key Claims" heading.
///
/// When both formats are present the primary count wins; this precedence
/// affects stored statistics and is intentional.
fn count_claims(report: &str) -> u32 {
    let mut count = 0;
    for line in report.lines() {
        if has_numbered_claim(line) {
            count += 1;
        }
    }
    if count > 0 {
        return count;
    }

    let mut in_claims = false;
    for line in report.lines() {
        if line.contains("Key Claims") {
            in_claims = true;
        } else if line.contains("##") {
            in_claims = false;
        } else if in_claims && starts_with_numbered_item(line.trim()) {
            count += 1;
        }
    }
    count
}

/// True when the line contains "Claim " immediately followed by a digit.
fn has_numbered_claim(line: &str) -> bool {
    let mut rest = line;
    while let Some(idx) = rest.find("Claim ") {
        let after = &rest[idx + "Claim ".len()..];
        if after.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            return true;
        }
        rest = after;
    }
    false
}

/// True for lines like "1. ..." (leading digits then a period).
fn starts_with_numbered_item(line: &str) -> bool {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && line[digits..].starts_with('.')
}

/// Count sources: lines under a "Sources" heading that look like list items,
/// falling back to literal source markers anywhere in the text.
fn count_sources(report: &str) -> u32 {
    let mut count = 0;
    let mut in_sources = false;
    for line in report.lines() {
        if line.contains("Sources") {
            in_sources = true;
        } else if line.contains("##") {
            in_sources = false;
        } else if in_sources {
            let trimmed = line.trim();
            let is_item = trimmed.starts_with('*')
                || trimmed.starts_with('-')
                || trimmed.chars().next().is_some_and(|c| c.is_ascii_digit());
            if is_item {
                count += 1;
            }
        }
    }
    if count > 0 {
        return count;
    }

    SOURCE_MARKERS
        .iter()
        .map(|marker| report.matches(marker).count() as u32)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_primary_claim_pattern() {
        let report = "Claim 1: water is wet\nClaim 2: sky is blue\nno pattern here";
        assert_eq!(extract_counts(report).claims_count, 2);
    }

    #[test]
    fn test_claim_word_without_digit_not_counted() {
        let report = "Claim without a number\nClaims are discussed";
        // no primary matches, no Key Claims block either
        assert_eq!(extract_counts(report).claims_count, 0);
    }

    #[test]
    fn test_fallback_numbered_key_claims_block() {
        let report = "\
## Key Claims
1. X
2. Y
3. Z

## Sources
";
        assert_eq!(extract_counts(report).claims_count, 3);
    }

    #[test]
    fn test_fallback_block_ends_at_next_heading() {
        let report = "\
## Key Claims
1. X
## Discussion
2. not a claim
";
        assert_eq!(extract_counts(report).claims_count, 1);
    }

    #[test]
    fn test_primary_count_wins_over_fallback() {
        // both formats present: the literal "Claim N" lines decide the count
        let report = "\
Claim 1 is stated up front.

## Key Claims
1. X
2. Y
3. Z
";
        assert_eq!(extract_counts(report).claims_count, 1);
    }

    #[test]
    fn test_multi_digit_numbered_item() {
        let mut report = String::from("## Key Claims\n");
        for i in 1..=12 {
            report.push_str(&format!("{i}. point\n"));
        }
        assert_eq!(extract_counts(&report).claims_count, 12);
    }

    #[test]
    fn test_sources_block_counts_list_items() {
        let report = "\
## Sources
* Encyclopedia entry
- https://example.com
1. Journal article
plain line is skipped
";
        assert_eq!(extract_counts(report).sources_count, 3);
    }

    #[test]
    fn test_sources_fallback_counts_markers() {
        let report = "See https://example.com and http://old.example.com, \
                      plus the Journal of Tests and an Encyclopedia.";
        assert_eq!(extract_counts(report).sources_count, 4);
    }

    #[test]
    fn test_sources_block_wins_over_fallback() {
        let report = "\
## Sources
- one entry

and elsewhere https://ignored.example.com https://ignored.example.com
";
        assert_eq!(extract_counts(report).sources_count, 1);
    }

    #[test]
    fn test_empty_report_counts_zero() {
        assert_eq!(extract_counts(""), ReportCounts::default());
    }

    #[test]
    fn test_absent_sections_do_not_fail() {
        let counts = extract_counts("just prose, nothing structured");
        assert_eq!(counts.claims_count, 0);
        assert_eq!(counts.sources_count, 0);
    }
}
