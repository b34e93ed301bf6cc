//! Usage report extraction - turn the normalized `/usage` screen text into
//! structured entries.

pub mod parser;
pub mod types;

pub use parser::parse_usage_report;
pub use types::{UsageEntry, UsageReport};
