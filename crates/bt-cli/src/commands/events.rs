//! Recording, editing and listing events.

use std::fmt::Display;
use std::io::Write;

use anyhow::{Context, Result, bail};
use bt_core::config_store::read_json;
use bt_core::{CustomTypes, Event, EventDraft, FieldInputs, SchemaRegistry};
use bt_db::Database;
use chrono::{DateTime, TimeZone, Utc};

use crate::commands::util::describe_event;

/// Settings key holding the activity in progress.
pub const ACTIVE_EVENT_KEY: &str = "activeEvent";

/// Returns the activity in progress, if any.
pub fn active_draft(db: &Database) -> Option<EventDraft> {
    read_json::<_, Option<EventDraft>>(db, ACTIVE_EVENT_KEY)
}

fn ensure_known_type(db: &mut Database, type_name: &str) -> Result<()> {
    let known = CustomTypes::new(db).all_type_names();
    if !known.iter().any(|name| name == type_name) {
        bail!(
            "unknown event type: {type_name} (known: {})",
            known.join(", ")
        );
    }
    Ok(())
}

fn record(db: &mut Database, event: Event) -> Result<usize> {
    let mut store = db.load_events().context("failed to load events")?;
    store.append(event);
    db.save_events(&store).context("failed to save events")?;
    Ok(store.len() - 1)
}

/// Begins a draft of `type_name` starting at `at`.
pub fn start<W: Write>(
    writer: &mut W,
    db: &mut Database,
    type_name: &str,
    at: DateTime<Utc>,
) -> Result<()> {
    if let Some(draft) = active_draft(db) {
        bail!(
            "{} already in progress since {}; run `bt finish` first",
            draft.type_name,
            draft.start.to_rfc3339()
        );
    }
    ensure_known_type(db, type_name)?;

    let draft = EventDraft::begin(type_name, at);
    let encoded = serde_json::to_string(&draft).context("failed to encode draft")?;
    db.set_setting(ACTIVE_EVENT_KEY, &encoded)?;
    tracing::debug!(type_name, start = %at, "started draft");
    writeln!(writer, "Started {type_name}")?;
    Ok(())
}

/// Finalizes the activity in progress and appends it to the store.
pub fn finish<W: Write>(
    writer: &mut W,
    db: &mut Database,
    inputs: &FieldInputs,
    now: DateTime<Utc>,
) -> Result<Event> {
    let Some(draft) = active_draft(db) else {
        bail!("no activity in progress; start one with `bt start <type>`");
    };
    let schema = SchemaRegistry::new(&*db).resolve_schema(&draft.type_name);
    let event = draft.finish(&schema, inputs, now)?;
    let index = record(db, event.clone())?;
    db.delete_setting(ACTIVE_EVENT_KEY)?;

    writeln!(
        writer,
        "Recorded {} at position {index}: {}",
        event.type_name,
        describe_event(&event)
    )?;
    Ok(event)
}

/// Begins and finalizes an event in one step.
pub fn log<W: Write>(
    writer: &mut W,
    db: &mut Database,
    type_name: &str,
    at: DateTime<Utc>,
    inputs: &FieldInputs,
    now: DateTime<Utc>,
) -> Result<Event> {
    ensure_known_type(db, type_name)?;
    let schema = SchemaRegistry::new(&*db).resolve_schema(type_name);
    let event = EventDraft::begin(type_name, at).finish(&schema, inputs, now)?;
    let index = record(db, event.clone())?;

    writeln!(
        writer,
        "Recorded {} at position {index}: {}",
        event.type_name,
        describe_event(&event)
    )?;
    Ok(event)
}

/// Applies `inputs` to the event at `index`.
pub fn edit<W: Write>(
    writer: &mut W,
    db: &mut Database,
    index: usize,
    inputs: &FieldInputs,
) -> Result<()> {
    let mut store = db.load_events().context("failed to load events")?;
    let Some(current) = store.get(index) else {
        bail!("no event at position {index}");
    };
    let schema = SchemaRegistry::new(&*db).resolve_schema(&current.type_name);
    let edited = current.edited(&schema, inputs)?;
    let summary = describe_event(&edited);
    let type_name = edited.type_name.clone();

    store.replace_at(index, edited);
    db.save_events(&store).context("failed to save events")?;
    writeln!(writer, "Updated {type_name} at position {index}: {summary}")?;
    Ok(())
}

/// Removes the event at `index`.
pub fn delete<W: Write>(writer: &mut W, db: &mut Database, index: usize) -> Result<()> {
    let mut store = db.load_events().context("failed to load events")?;
    if store.get(index).is_none() {
        bail!("no event at position {index}");
    }
    let removed = store.remove_at(index);
    db.save_events(&store).context("failed to save events")?;
    writeln!(writer, "Deleted {} at position {index}", removed.type_name)?;
    Ok(())
}

/// Lists events in insertion order with their positions.
pub fn list<W: Write, Tz: TimeZone>(
    writer: &mut W,
    db: &Database,
    tz: &Tz,
    json: bool,
) -> Result<()>
where
    Tz::Offset: Display,
{
    let store = db.load_events().context("failed to load events")?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(store.all())?)?;
        return Ok(());
    }

    if store.is_empty() {
        writeln!(writer, "No events recorded.")?;
        return Ok(());
    }
    for (index, event) in store.all().iter().enumerate() {
        let start = event.start.with_timezone(tz).format("%Y-%m-%d %H:%M");
        writeln!(
            writer,
            "{index:<4}{start}  {:<14}{}",
            event.type_name,
            describe_event(event)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bt_core::{NewCustomType, Side};
    use chrono::{Duration, TimeZone};
    use insta::assert_snapshot;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    fn inputs(pairs: &[(&str, &str)]) -> FieldInputs {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn start_then_finish_records_elapsed_time() {
        let mut db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();

        start(&mut out, &mut db, "Sleeping", at(1, 0)).unwrap();
        assert!(active_draft(&db).is_some());

        let event = finish(&mut out, &mut db, &FieldInputs::new(), at(3, 30)).unwrap();
        assert_eq!(event.duration, 9000);
        assert!(active_draft(&db).is_none());
        assert_eq!(db.load_events().unwrap().len(), 1);
        assert_snapshot!(output(out), @r"
        Started Sleeping
        Recorded Sleeping at position 0: 2h 30m
        ");
    }

    #[test]
    fn start_refuses_second_draft_and_unknown_types() {
        let mut db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();

        let err = start(&mut out, &mut db, "Snack", at(1, 0)).unwrap_err();
        assert!(err.to_string().contains("unknown event type: Snack"));

        start(&mut out, &mut db, "Pumping", at(1, 0)).unwrap();
        let err = start(&mut out, &mut db, "Sleeping", at(1, 5)).unwrap_err();
        assert!(err.to_string().contains("Pumping already in progress"));
    }

    #[test]
    fn finish_without_draft_fails() {
        let mut db = Database::open_in_memory().unwrap();
        let err = finish(&mut Vec::new(), &mut db, &FieldInputs::new(), at(2, 0)).unwrap_err();
        assert!(err.to_string().contains("no activity in progress"));
    }

    #[test]
    fn log_custom_type_uses_its_schema() {
        let mut db = Database::open_in_memory().unwrap();
        CustomTypes::new(&mut db)
            .create_type(NewCustomType {
                name: "Bottle".to_string(),
                color: "#ffcc00".to_string(),
                track_volume: true,
                ..NewCustomType::default()
            })
            .unwrap();

        let mut out = Vec::new();
        let event = log(
            &mut out,
            &mut db,
            "Bottle",
            at(6, 0),
            &inputs(&[("volume", "120"), ("side", "both")]),
            at(6, 15),
        )
        .unwrap();
        assert_eq!(event.volume, Some(120));
        assert_eq!(event.side, Some(Side::Both));
        assert_eq!(event.duration, 900);
    }

    #[test]
    fn edit_and_delete_by_position() {
        let mut db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        log(
            &mut out,
            &mut db,
            "Pumping",
            at(4, 0),
            &inputs(&[("duration", "20"), ("volume", "60")]),
            at(4, 30),
        )
        .unwrap();
        log(
            &mut out,
            &mut db,
            "Breastfeeding",
            at(5, 0),
            &inputs(&[("duration", "10")]),
            at(5, 10),
        )
        .unwrap();

        let mut out = Vec::new();
        edit(&mut out, &mut db, 0, &inputs(&[("volume", "75")])).unwrap();
        assert_eq!(db.load_events().unwrap().all()[0].volume, Some(75));

        let err = edit(&mut out, &mut db, 7, &inputs(&[])).unwrap_err();
        assert_eq!(err.to_string(), "no event at position 7");

        delete(&mut out, &mut db, 0).unwrap();
        let remaining = db.load_events().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining.all()[0].type_name, "Breastfeeding");
        assert!(delete(&mut out, &mut db, 1).is_err());

        assert_snapshot!(output(out), @r"
        Updated Pumping at position 0: 20m, 75 ml
        Deleted Pumping at position 0
        ");
    }

    #[test]
    fn list_shows_positions() {
        let mut db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        list(&mut out, &db, &Utc, false).unwrap();
        assert_eq!(output(out), "No events recorded.\n");

        log(
            &mut Vec::new(),
            &mut db,
            "Sleeping",
            at(22, 0),
            &inputs(&[("duration", "1.5")]),
            at(23, 0),
        )
        .unwrap();
        log(
            &mut Vec::new(),
            &mut db,
            "Pumping",
            at(2, 0),
            &inputs(&[("volume", "90"), ("side", "Left")]),
            at(2, 0) + Duration::minutes(12),
        )
        .unwrap();

        let mut out = Vec::new();
        list(&mut out, &db, &Utc, false).unwrap();
        assert_snapshot!(output(out), @r"
        0   2025-03-01 22:00  Sleeping      1h 30m
        1   2025-03-01 02:00  Pumping       12m, 90 ml, Left
        ");
    }
}
