//! Report rendering - the summary table, JSON, and raw modes.
//!
//! Presentation only: this is where percentages get clamped for bar drawing
//! and where remaining-time annotations are attached. The parsed report
//! itself stays untouched.

use anyhow::Result;
use chrono::Local;

use ccmeter_core::{remaining, RemainingTime, Settings, UsageReport};

use crate::cli::OutputMode;
use crate::pipeline::FetchOutcome;

const TABLE_WIDTH: usize = 90;
const BAR_WIDTH: usize = 47;

/// Render one capture outcome in the requested mode.
pub fn render(outcome: &FetchOutcome, mode: OutputMode, settings: &Settings) -> Result<()> {
    match mode {
        OutputMode::Raw => print!("{}", outcome.text),
        OutputMode::Json => println!("{}", serde_json::to_string_pretty(&outcome.report)?),
        OutputMode::Table => print_table(&outcome.report, settings),
    }
    Ok(())
}

fn print_table(report: &UsageReport, settings: &Settings) {
    println!("{}", "=".repeat(TABLE_WIDTH));
    for entry in &report.entries {
        println!(
            "{:<30}: {:<47}| {:>3}% used|",
            entry.name,
            make_bar(entry.percentage),
            entry.percentage
        );
    }
    println!("{}", "=".repeat(TABLE_WIDTH));
    println!();

    for entry in &report.entries {
        let reset = if entry.reset_time.is_empty() {
            "unknown".to_string()
        } else {
            format!("{} ({})", entry.reset_time, entry.reset_timezone)
        };
        println!("{} resets at: {}", entry.name, reset);

        let period = settings.period_for(&entry.name);
        if let Some(rt) = remaining(&entry.reset_time, &entry.reset_timezone, period) {
            println!(
                "    └─ in {}, {:.1}% time passed, {:.1}% usage at current pace",
                rt.formatted,
                rt.elapsed_pct,
                projected_pct(entry.percentage, &rt)
            );
        }
    }

    if let Some(notice) = &report.notice {
        println!();
        println!("{notice}");
    }

    println!();
    println!(
        "Captured at {}",
        report.parsed_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    );
}

/// Projected usage at period end, extrapolated from usage so far against
/// time elapsed
fn projected_pct(usage_pct: u32, rt: &RemainingTime) -> f64 {
    if rt.elapsed_pct > 0.0 {
        usage_pct as f64 / rt.elapsed_pct * 100.0
    } else {
        0.0
    }
}

/// Progress bar of block glyphs. Display-clamped to the bar width; values
/// above 100 still parse and print numerically.
fn make_bar(pct: u32) -> String {
    let filled = (pct.min(100) as usize * BAR_WIDTH) / 100;
    "█".repeat(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_make_bar_widths() {
        assert_eq!(make_bar(0), "");
        assert_eq!(make_bar(100).chars().count(), BAR_WIDTH);
        assert_eq!(make_bar(50).chars().count(), BAR_WIDTH / 2);
        // Over-100 values are clamped for display only
        assert_eq!(make_bar(150).chars().count(), BAR_WIDTH);
    }

    #[test]
    fn test_projected_pct() {
        let rt = RemainingTime {
            formatted: String::new(),
            elapsed_pct: 50.0,
        };
        assert_eq!(projected_pct(13, &rt), 26.0);

        let fresh = RemainingTime {
            formatted: String::new(),
            elapsed_pct: 0.0,
        };
        assert_eq!(projected_pct(13, &fresh), 0.0);
    }
}
