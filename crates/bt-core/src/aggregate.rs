//! Daily grouping and summaries behind the timeline and trend views.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

use crate::event::Event;
use crate::event_type::BuiltinType;
use crate::units::{Unit, format_duration, from_canonical_seconds};

/// Aggregate statistics for one calendar day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailySummary {
    /// Total sleeping time in seconds.
    pub sleeping_duration: u64,
    pub pumping_count: u32,
    /// Total pumped volume in milliliters.
    pub pumping_volume: i64,
    pub breastfeeding_count: u32,
    /// Total breastfeeding time in seconds.
    pub breastfeeding_duration: u64,
}

impl DailySummary {
    /// One-line header used above each day of the timeline.
    pub fn headline(&self) -> String {
        format!(
            "Sleep {} | Pumping {}x {} ml | Breastfeeding {}x {}",
            format_duration(saturating_i64(self.sleeping_duration)),
            self.pumping_count,
            self.pumping_volume,
            self.breastfeeding_count,
            format_duration(saturating_i64(self.breastfeeding_duration)),
        )
    }
}

/// One point of the three trend series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub day: NaiveDate,
    pub sleep_hours: f64,
    pub pumping_volume: i64,
    pub breastfeeding_minutes: f64,
}

/// Groups events by the calendar day of their start in `tz`.
///
/// Each day's events are sorted by start; ties keep insertion order.
pub fn group_by_day<Tz: TimeZone>(events: &[Event], tz: &Tz) -> BTreeMap<NaiveDate, Vec<Event>> {
    let mut days: BTreeMap<NaiveDate, Vec<Event>> = BTreeMap::new();
    for event in events {
        let day = event.start.with_timezone(tz).date_naive();
        days.entry(day).or_default().push(event.clone());
    }
    for day_events in days.values_mut() {
        day_events.sort_by_key(|event| event.start);
    }
    days
}

/// Accumulates one day's events. Types other than the built-ins are ignored.
///
/// Totals saturate instead of overflowing on extreme remote values.
pub fn summarize(day_events: &[Event]) -> DailySummary {
    let mut summary = DailySummary::default();
    for event in day_events {
        let Ok(kind) = event.type_name.parse::<BuiltinType>() else {
            continue;
        };
        match kind {
            BuiltinType::Sleeping => {
                summary.sleeping_duration =
                    summary.sleeping_duration.saturating_add(event.duration);
            }
            BuiltinType::Pumping => {
                summary.pumping_count = summary.pumping_count.saturating_add(1);
                summary.pumping_volume = summary
                    .pumping_volume
                    .saturating_add(event.volume.unwrap_or(0));
            }
            BuiltinType::Breastfeeding => {
                summary.breastfeeding_count = summary.breastfeeding_count.saturating_add(1);
                summary.breastfeeding_duration = summary
                    .breastfeeding_duration
                    .saturating_add(event.duration);
            }
        }
    }
    summary
}

/// Per-day trend series across all events, in chronological order.
#[allow(clippy::cast_precision_loss)]
pub fn trends<Tz: TimeZone>(events: &[Event], tz: &Tz) -> Vec<TrendPoint> {
    group_by_day(events, tz)
        .into_iter()
        .map(|(day, day_events)| {
            let summary = summarize(&day_events);
            TrendPoint {
                day,
                sleep_hours: from_canonical_seconds(
                    summary.sleeping_duration as f64,
                    Some(Unit::Hours),
                ),
                pumping_volume: summary.pumping_volume,
                breastfeeding_minutes: from_canonical_seconds(
                    summary.breastfeeding_duration as f64,
                    Some(Unit::Minutes),
                ),
            }
        })
        .collect()
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{DateTime, FixedOffset, Utc};
    use insta::assert_snapshot;

    fn event(type_name: &str, start: &str, duration: u64, volume: Option<i64>) -> Event {
        Event {
            type_name: type_name.to_string(),
            start: DateTime::parse_from_rfc3339(start).unwrap().with_timezone(&Utc),
            duration,
            volume,
            side: None,
            fields: BTreeMap::new(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn summarize_accumulates_builtin_totals() {
        let events = vec![
            event("Sleeping", "2025-03-01T01:00:00Z", 7200, None),
            event("Pumping", "2025-03-01T04:00:00Z", 0, Some(60)),
            event("Pumping", "2025-03-01T08:00:00Z", 0, Some(90)),
            event("Breastfeeding", "2025-03-01T10:00:00Z", 600, None),
        ];
        let summary = summarize(&events);
        assert_eq!(
            summary,
            DailySummary {
                sleeping_duration: 7200,
                pumping_count: 2,
                pumping_volume: 150,
                breastfeeding_count: 1,
                breastfeeding_duration: 600,
            }
        );
    }

    #[test]
    fn summarize_saturates_on_extreme_remote_values() {
        let rows: Vec<Event> = serde_json::from_str(
            r#"[
                {"type": "Pumping", "start": "2025-03-01T04:00:00Z", "duration": 60, "volume": "9e18"},
                {"type": "Pumping", "start": "2025-03-01T05:00:00Z", "duration": 60, "volume": "9e18"},
                {"type": "Sleeping", "start": "2025-03-01T06:00:00Z", "duration": "1e20"},
                {"type": "Sleeping", "start": "2025-03-01T07:00:00Z", "duration": 3600}
            ]"#,
        )
        .unwrap();
        let summary = summarize(&rows);
        assert_eq!(summary.pumping_count, 2);
        assert_eq!(summary.pumping_volume, i64::MAX);
        assert_eq!(summary.sleeping_duration, u64::MAX);
    }

    #[test]
    fn summarize_ignores_unknown_types_and_is_pure() {
        let events = vec![
            event("Snack", "2025-03-01T01:00:00Z", 999, Some(999)),
            event("sleeping", "2025-03-01T02:00:00Z", 999, None),
            event("Pumping", "2025-03-01T03:00:00Z", 0, None),
        ];
        let before = events.clone();
        let first = summarize(&events);
        let mut reversed = events.clone();
        reversed.reverse();

        assert_eq!(first, summarize(&reversed));
        assert_eq!(events, before);
        assert_eq!(first.pumping_count, 1);
        assert_eq!(first.pumping_volume, 0);
        assert_eq!(first.sleeping_duration, 0);
    }

    #[test]
    fn group_by_day_sorts_days_and_events() {
        let events = vec![
            event("Pumping", "2025-03-03T09:00:00Z", 0, Some(10)),
            event("Sleeping", "2025-03-01T22:00:00Z", 60, None),
            event("Pumping", "2025-03-02T12:00:00Z", 0, Some(20)),
            event("Sleeping", "2025-03-01T03:00:00Z", 60, None),
            event("Pumping", "2025-03-03T01:00:00Z", 0, Some(30)),
            event("Breastfeeding", "2025-03-02T06:00:00Z", 60, None),
        ];
        let grouped = group_by_day(&events, &Utc);

        let keys: Vec<_> = grouped.keys().copied().collect();
        assert_eq!(keys, vec![day("2025-03-01"), day("2025-03-02"), day("2025-03-03")]);
        for day_events in grouped.values() {
            assert_eq!(day_events.len(), 2);
            assert!(day_events[0].start < day_events[1].start);
        }
        assert_eq!(grouped[&day("2025-03-03")][0].volume, Some(30));
    }

    #[test]
    fn group_by_day_uses_the_given_zone() {
        let events = vec![event("Sleeping", "2025-03-01T23:30:00Z", 60, None)];
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let grouped = group_by_day(&events, &plus_two);
        assert!(grouped.contains_key(&day("2025-03-02")));
    }

    #[test]
    fn trends_convert_units() {
        let events = vec![
            event("Sleeping", "2025-03-01T01:00:00Z", 5400, None),
            event("Breastfeeding", "2025-03-01T05:00:00Z", 900, None),
            event("Pumping", "2025-03-02T05:00:00Z", 0, Some(120)),
        ];
        let points = trends(&events, &Utc);
        assert_eq!(points.len(), 2);
        assert!((points[0].sleep_hours - 1.5).abs() < f64::EPSILON);
        assert!((points[0].breastfeeding_minutes - 15.0).abs() < f64::EPSILON);
        assert_eq!(points[1].pumping_volume, 120);
        assert!(points[1].sleep_hours.abs() < f64::EPSILON);
    }

    #[test]
    fn headline_format() {
        let summary = DailySummary {
            sleeping_duration: 7200,
            pumping_count: 2,
            pumping_volume: 150,
            breastfeeding_count: 1,
            breastfeeding_duration: 600,
        };
        assert_snapshot!(summary.headline(), @"Sleep 2h 0m | Pumping 2x 150 ml | Breastfeeding 1x 10m");
    }
}
