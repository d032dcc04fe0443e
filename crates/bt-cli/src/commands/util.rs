//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use bt_core::{Event, FieldInputs};
use chrono::{DateTime, Duration, TimeZone, Utc};
use regex::Regex;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").unwrap());

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parse a datetime string as ISO 8601, relative time, or `now`.
///
/// Supports:
/// - ISO 8601: "2026-01-15T10:30:00Z"
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
pub fn parse_datetime(s: &str, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("now") {
        return Ok(now);
    }

    // Try ISO 8601 first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try relative time: "N hours/minutes/days/weeks ago"
    let Some(caps) = RELATIVE_TIME_RE.captures(s) else {
        anyhow::bail!(
            "Invalid datetime: {s}. Use ISO 8601 (e.g., 2026-01-15T10:30:00Z) or relative (e.g., '2 hours ago')"
        );
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    // Safe to create Duration now that we've validated the range
    Ok(now - Duration::minutes(n * minutes_per_unit))
}

/// Collects `name=value` pairs into field inputs; later pairs win.
pub fn field_inputs(pairs: &[(String, String)]) -> FieldInputs {
    pairs.iter().cloned().collect()
}

/// Compact description of an event's measurements.
pub fn describe_event(event: &Event) -> String {
    let mut parts = vec![bt_core::format_duration(
        i64::try_from(event.duration).unwrap_or(i64::MAX),
    )];
    if let Some(volume) = event.volume {
        parts.push(format!("{volume} ml"));
    }
    if let Some(side) = event.side {
        parts.push(side.to_string());
    }
    for (name, value) in &event.fields {
        parts.push(format!("{name}={value}"));
    }
    parts.join(", ")
}

/// Formats a start time as `HH:MM` in `tz`.
pub fn clock_time<Tz: TimeZone>(start: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    start.with_timezone(tz).format("%H:%M").to_string()
}
