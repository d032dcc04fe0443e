//! Status command for the activity in progress and store totals.

use std::io::Write;

use anyhow::{Context, Result};
use bt_core::{CustomTypes, format_duration};
use bt_db::Database;
use chrono::{DateTime, Utc};

use crate::Config;
use crate::commands::events::active_draft;

pub fn run<W: Write>(
    writer: &mut W,
    db: &mut Database,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()> {
    writeln!(writer, "Baby tracker status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;

    match active_draft(db) {
        Some(draft) => {
            let elapsed = (now - draft.start).num_seconds();
            writeln!(
                writer,
                "In progress: {} since {} ({})",
                draft.type_name,
                draft.start.to_rfc3339(),
                format_duration(elapsed)
            )?;
        }
        None => writeln!(writer, "In progress: nothing")?,
    }

    let store = db.load_events().context("failed to load events")?;
    writeln!(writer, "Events: {}", store.len())?;
    writeln!(writer, "Custom types: {}", CustomTypes::new(db).names().len())?;

    if config.sync_url.is_some() {
        writeln!(writer, "Sync: configured (policy: {})", config.sync_policy)?;
    } else {
        writeln!(writer, "Sync: not configured")?;
    }
    Ok(())
}
