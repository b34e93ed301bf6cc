//! Reset-time interpretation - turn a free-form reset phrase plus an IANA
//! timezone into a remaining duration and an elapsed fraction of the billing
//! period.
//!
//! Two phrase shapes are accepted, matching what the `/usage` screen renders:
//! time-only ("4pm", "4:30pm") and date-plus-time ("Nov 18, 3pm"). Anything
//! else is unparseable and reported as `None`, never as an error - a bad
//! reset phrase degrades one field, not the whole report.

use chrono::{DateTime, Datelike, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Remaining time until reset plus progress through the current period.
#[derive(Debug, Clone, PartialEq)]
pub struct RemainingTime {
    /// Human-readable duration, e.g. "2 hr(s) 30 min(s)"
    pub formatted: String,
    /// Elapsed fraction of the current period, 0.0 to 100.0
    pub elapsed_pct: f64,
}

/// Compute the time remaining until the given reset phrase, and how far
/// through the current period of `period_minutes` we are.
///
/// Returns `None` when the timezone is unknown or the phrase shape is not
/// recognized.
pub fn remaining(phrase: &str, tz_name: &str, period_minutes: i64) -> Option<RemainingTime> {
    remaining_at(phrase, tz_name, period_minutes, Utc::now())
}

/// Same as [`remaining`] with an explicit "now", so the arithmetic is
/// deterministic under test.
pub fn remaining_at(
    phrase: &str,
    tz_name: &str,
    period_minutes: i64,
    now_utc: DateTime<Utc>,
) -> Option<RemainingTime> {
    let tz = Tz::from_str(tz_name.trim()).ok()?;
    let now = now_utc.with_timezone(&tz);
    let target = resolve_phrase(phrase.trim().trim_end_matches(','), &now)?;

    let minutes_left = (target - now).num_seconds() / 60;
    Some(RemainingTime {
        formatted: format_duration(minutes_left),
        elapsed_pct: elapsed_pct(minutes_left, period_minutes),
    })
}

/// Resolve a reset phrase to the next matching instant at or after `now`.
///
/// Time-only phrases mean today at that time, or tomorrow if already past.
/// Date-plus-time phrases mean this calendar year, or next year if already
/// past.
fn resolve_phrase(phrase: &str, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let tz = now.timezone();

    if phrase.contains(',') {
        // "Nov 18, 3pm" - append the current year and parse
        let naive = parse_date_phrase(phrase, now.year())?;
        let target = tz.from_local_datetime(&naive).earliest()?;
        if target < *now {
            let naive = naive.with_year(now.year() + 1)?;
            return tz.from_local_datetime(&naive).earliest();
        }
        return Some(target);
    }

    // "4pm" / "4:30pm" - today, rolling to tomorrow when already past
    let time = parse_time_phrase(phrase)?;
    let naive = now.date_naive().and_time(time);
    let target = tz.from_local_datetime(&naive).earliest()?;
    if target <= *now {
        return tz.from_local_datetime(&(naive + TimeDelta::days(1))).earliest();
    }
    Some(target)
}

fn parse_date_phrase(phrase: &str, year: i32) -> Option<NaiveDateTime> {
    let with_year = format!("{phrase}, {year}");
    for fmt in ["%b %d, %I%p, %Y", "%b %d, %I:%M%p, %Y"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&with_year, fmt) {
            return Some(dt);
        }
    }
    None
}

fn parse_time_phrase(phrase: &str) -> Option<NaiveTime> {
    for fmt in ["%I%p", "%I:%M%p"] {
        if let Ok(t) = NaiveTime::parse_from_str(phrase, fmt) {
            return Some(t);
        }
    }
    None
}

/// Format minutes as "<D> day(s) <H> hr(s) <M> min(s)". The day component is
/// omitted when zero; hours appear whenever days or hours are nonzero;
/// minutes always appear.
fn format_duration(total_minutes: i64) -> String {
    let days = total_minutes / 1440;
    let hours = (total_minutes % 1440) / 60;
    let minutes = total_minutes % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{days} day(s)"));
    }
    if hours > 0 || days > 0 {
        parts.push(format!("{hours} hr(s)"));
    }
    parts.push(format!("{minutes} min(s)"));
    parts.join(" ")
}

/// Elapsed fraction of the current period, estimated from the next reset
/// instant and the fixed period length alone.
fn elapsed_pct(remaining_minutes: i64, period_minutes: i64) -> f64 {
    if period_minutes <= 0 {
        return 0.0;
    }
    let in_cycle = remaining_minutes.rem_euclid(period_minutes);
    // A reset exactly one full period away means the cycle just started
    if in_cycle == 0 && remaining_minutes > 0 {
        return 0.0;
    }
    let elapsed = (period_minutes - in_cycle) as f64 / period_minutes as f64 * 100.0;
    elapsed.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LA: &str = "America/Los_Angeles";

    /// 2024-01-15 12:00 PST (20:00 UTC)
    fn noon_pst() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap()
    }

    #[test]
    fn test_time_only_later_today() {
        let rt = remaining_at("4pm", LA, 300, noon_pst()).unwrap();
        assert_eq!(rt.formatted, "4 hr(s) 0 min(s)");
        // 240 of 300 minutes remain in the cycle
        assert_eq!(rt.elapsed_pct, 20.0);
    }

    #[test]
    fn test_time_only_rolls_to_tomorrow() {
        // 4am already passed; next reset is tomorrow 4am, 16 hours away
        let rt = remaining_at("4am", LA, 300, noon_pst()).unwrap();
        assert_eq!(rt.formatted, "16 hr(s) 0 min(s)");
    }

    #[test]
    fn test_time_with_minutes() {
        let rt = remaining_at("2:30pm", LA, 300, noon_pst()).unwrap();
        assert_eq!(rt.formatted, "2 hr(s) 30 min(s)");
        assert_eq!(rt.elapsed_pct, 50.0);
    }

    #[test]
    fn test_date_phrase_this_year() {
        let rt = remaining_at("Nov 18, 3pm", LA, 10080, noon_pst()).unwrap();
        assert!(rt.formatted.contains("day(s)"));
    }

    #[test]
    fn test_date_phrase_rolls_to_next_year() {
        // Jan 1 already passed relative to Jan 15; must resolve to next year
        let rt = remaining_at("Jan 1, 12am", LA, 10080, noon_pst()).unwrap();
        // ~351 days away
        assert!(rt.formatted.starts_with("351 day(s)"));
    }

    #[test]
    fn test_week_reset_exactly_one_period_away() {
        // Exactly 10080 minutes to the reset: the weekly cycle just started
        let rt = remaining_at("Jan 22, 12pm", LA, 10080, noon_pst()).unwrap();
        assert_eq!(rt.formatted, "7 day(s) 0 hr(s) 0 min(s)");
        assert_eq!(rt.elapsed_pct, 0.0);
    }

    #[test]
    fn test_unknown_timezone() {
        assert_eq!(remaining_at("4pm", "Not/AZone", 300, noon_pst()), None);
    }

    #[test]
    fn test_unrecognized_phrase() {
        assert_eq!(remaining_at("soonish", LA, 300, noon_pst()), None);
        assert_eq!(remaining_at("", LA, 300, noon_pst()), None);
    }

    #[test]
    fn test_trailing_comma_tolerated() {
        assert!(remaining_at("4pm,", LA, 300, noon_pst()).is_some());
    }

    #[test]
    fn test_format_duration_minutes_only() {
        assert_eq!(format_duration(45), "45 min(s)");
    }

    #[test]
    fn test_format_duration_hours_and_minutes() {
        assert_eq!(format_duration(150), "2 hr(s) 30 min(s)");
    }

    #[test]
    fn test_format_duration_days() {
        assert_eq!(format_duration(10080), "7 day(s) 0 hr(s) 0 min(s)");
        assert_eq!(format_duration(1441), "1 day(s) 0 hr(s) 1 min(s)");
    }

    #[test]
    fn test_elapsed_pct_midpoint() {
        assert_eq!(elapsed_pct(150, 300), 50.0);
    }

    #[test]
    fn test_elapsed_pct_full_period_away() {
        assert_eq!(elapsed_pct(10080, 10080), 0.0);
    }

    #[test]
    fn test_elapsed_pct_reset_now() {
        // Reset happening right now: the whole period has elapsed
        assert_eq!(elapsed_pct(0, 300), 100.0);
    }

    #[test]
    fn test_elapsed_pct_longer_than_period() {
        // 450 minutes to reset with a 300-minute period: 150 left in cycle
        assert_eq!(elapsed_pct(450, 300), 50.0);
    }

    #[test]
    fn test_elapsed_pct_degenerate_period() {
        assert_eq!(elapsed_pct(100, 0), 0.0);
    }

    #[test]
    fn test_twelve_oclock_edge_cases() {
        // 12am is midnight, 12pm is noon
        let rt = remaining_at("12am", LA, 300, noon_pst()).unwrap();
        assert_eq!(rt.formatted, "12 hr(s) 0 min(s)");
        let rt = remaining_at("12pm", LA, 300, noon_pst()).unwrap();
        // Exactly now rolls to tomorrow
        assert_eq!(rt.formatted, "1 day(s) 0 hr(s) 0 min(s)");
    }
}
