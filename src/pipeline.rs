//! One capture invocation: driver -> normalizer -> parser.
//!
//! Exactly one session attempt per call; retry policy belongs to the caller
//! (watch mode simply schedules the next invocation). Only spawn and pty
//! failures propagate as errors - an empty or unparseable capture becomes a
//! report with zero entries, with the normalized text kept for diagnostics.

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, warn};

use ccmeter_core::{normalize, parse_usage_report, run_session, usage_script, Settings, UsageReport};

/// Result of one pipeline invocation.
pub struct FetchOutcome {
    /// Normalized capture text, kept even when parsing found nothing
    pub text: String,
    pub report: UsageReport,
}

impl FetchOutcome {
    /// True when the session produced text but no recognizable entries
    pub fn is_parse_mismatch(&self) -> bool {
        self.report.entries.is_empty() && !self.text.trim().is_empty()
    }
}

/// Run the full capture pipeline once. Blocking; call from a worker thread
/// in async contexts.
pub fn fetch_once(settings: &Settings) -> Result<FetchOutcome> {
    let config = settings.session_config();
    let phases = usage_script(Duration::from_millis(settings.char_delay_ms));

    let raw = run_session(&config, &phases)?;
    if raw.is_empty() {
        warn!("session captured zero bytes from {}", config.program);
    }

    let text = normalize(&raw);
    let report = parse_usage_report(&text);
    debug!(
        "parsed {} entries, notice: {}",
        report.entries.len(),
        report.notice.is_some()
    );

    let outcome = FetchOutcome { text, report };
    if outcome.is_parse_mismatch() {
        warn!("capture contained text but no recognizable usage blocks");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_settings(program: &str, args: &[&str]) -> Settings {
        let mut s = Settings::default();
        s.program = program.to_string();
        s.args = args.iter().map(|a| a.to_string()).collect();
        s.startup_timeout_ms = 800;
        s.idle_timeout_ms = 200;
        s.overall_deadline_ms = 10_000;
        s.char_delay_ms = 1;
        s
    }

    #[test]
    fn test_end_to_end_against_a_fake_renderer() {
        // A stand-in for the target: ignores input and prints an
        // ANSI-decorated usage screen
        let script = "printf '\\033[1mCurrent session\\033[0m\\n\
██████▌ 13%% used\\n\
Resets 4pm (America/Los_Angeles)\\n'";
        let settings = fake_settings("sh", &["-c", script]);

        let outcome = fetch_once(&settings).unwrap();
        assert_eq!(outcome.report.entries.len(), 1);
        let entry = &outcome.report.entries[0];
        assert_eq!(entry.name, "Current session");
        assert_eq!(entry.percentage, 13);
        assert_eq!(entry.reset_time, "4pm");
        assert_eq!(entry.reset_timezone, "America/Los_Angeles");
    }

    #[test]
    fn test_empty_capture_is_an_empty_report() {
        let settings = fake_settings("true", &[]);
        let outcome = fetch_once(&settings).unwrap();
        assert!(outcome.report.entries.is_empty());
        assert!(!outcome.is_parse_mismatch());
    }

    #[test]
    fn test_parse_mismatch_preserves_text() {
        let settings = fake_settings("sh", &["-c", "printf 'no usage data here\\n'"]);
        let outcome = fetch_once(&settings).unwrap();
        assert!(outcome.report.entries.is_empty());
        assert!(outcome.is_parse_mismatch());
        assert!(outcome.text.contains("no usage data here"));
    }

    #[test]
    fn test_spawn_failure_propagates() {
        let settings = fake_settings("ccmeter-no-such-program-xyzzy", &[]);
        assert!(fetch_once(&settings).is_err());
    }
}
