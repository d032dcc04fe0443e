//! Daily timeline and trend views.

use std::fmt::Display;
use std::io::Write;

use anyhow::{Context, Result};
use bt_core::{group_by_day, summarize, trends as trend_points};
use bt_db::Database;
use chrono::TimeZone;

use crate::commands::util::{clock_time, describe_event};

/// Prints events grouped by local day, each day under its summary headline.
pub fn timeline<W: Write, Tz: TimeZone>(writer: &mut W, db: &Database, tz: &Tz) -> Result<()>
where
    Tz::Offset: Display,
{
    let store = db.load_events().context("failed to load events")?;
    if store.is_empty() {
        writeln!(writer, "No events recorded.")?;
        return Ok(());
    }

    let days = group_by_day(store.all(), tz);
    for (i, (day, events)) in days.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        writeln!(writer, "{day}  {}", summarize(events).headline())?;
        for event in events {
            writeln!(
                writer,
                "  {}  {:<14}{}",
                clock_time(event.start, tz),
                event.type_name,
                describe_event(event)
            )?;
        }
    }
    Ok(())
}

/// Prints the per-day sleep, pumping and breastfeeding series.
pub fn trends<W: Write, Tz: TimeZone>(
    writer: &mut W,
    db: &Database,
    tz: &Tz,
    json: bool,
) -> Result<()> {
    let store = db.load_events().context("failed to load events")?;
    let points = trend_points(store.all(), tz);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&points)?)?;
        return Ok(());
    }

    if points.is_empty() {
        writeln!(writer, "No events recorded.")?;
        return Ok(());
    }
    writeln!(
        writer,
        "{:<12}{:>12}{:>14}{:>16}",
        "Day", "Sleep (h)", "Pumping (ml)", "Feeding (min)"
    )?;
    for point in &points {
        writeln!(
            writer,
            "{:<12}{:>12.1}{:>14}{:>16.0}",
            point.day.to_string(),
            point.sleep_hours,
            point.pumping_volume,
            point.breastfeeding_minutes
        )?;
    }
    Ok(())
}
