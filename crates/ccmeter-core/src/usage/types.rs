//! Structured usage data parsed from the `/usage` screen.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One usage category row from the rendered screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageEntry {
    /// Category name exactly as rendered (e.g., "Current session")
    pub name: String,
    /// Percentage used. Parsed verbatim, deliberately unclamped: the screen
    /// has been observed to render values above 100 and we preserve them.
    pub percentage: u32,
    /// Free-form reset phrase (e.g., "4pm" or "Nov 18, 3pm"); empty when the
    /// reset line was missing or unrecognizable
    pub reset_time: String,
    /// IANA timezone name from the reset line; empty when absent
    pub reset_timezone: String,
}

/// Complete report from one capture of the `/usage` screen.
///
/// A report with zero entries is valid - it is how an empty capture or an
/// unrecognizable screen is represented, distinct from a fatal failure.
#[derive(Debug, Clone, Serialize)]
pub struct UsageReport {
    /// Entries in on-screen top-to-bottom order, duplicates preserved
    pub entries: Vec<UsageEntry>,
    /// Announcement text from an "update:" block, if one was rendered
    pub notice: Option<String>,
    /// When this report was parsed
    pub parsed_at: DateTime<Utc>,
}
