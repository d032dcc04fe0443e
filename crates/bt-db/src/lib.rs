//! Storage layer for the baby tracker.
//!
//! Provides persistence for finalized events and the settings key-value store
//! using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! ## Event Order
//!
//! Events are identified by their position in insertion order, so the `seq`
//! column is an autoincrement key and every read orders by it. Saving an
//! [`EventStore`] rewrites the table in one transaction so positions stay dense.
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond precision
//! (e.g., `2025-01-15T10:30:00.000Z`), always UTC.
//!
//! ## Settings
//!
//! The `settings` table backs [`ConfigStore`]. Values are opaque strings; the
//! core decides how to decode them.

use std::collections::BTreeMap;
use std::path::Path;

use bt_core::{ConfigStore, Event, EventStore, FieldValue, Side};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse an event timestamp.
    #[error("invalid timestamp for event {seq}: {timestamp}")]
    TimestampParse {
        seq: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored column could not be decoded.
    #[error("invalid event data for {seq}: {message}")]
    InvalidEventData { seq: i64, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Finalized events in insertion order
            -- start: RFC 3339 UTC
            -- duration: whole seconds
            -- fields: JSON object of custom input values, NULL when empty
            CREATE TABLE IF NOT EXISTS events (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                start TEXT NOT NULL,
                duration INTEGER NOT NULL DEFAULT 0,
                volume INTEGER,
                side TEXT,
                fields TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_events_start ON events(start);

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Loads every event in insertion order.
    pub fn load_events(&self) -> Result<EventStore, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT seq, type, start, duration, volume, side, fields
            FROM events
            ORDER BY seq ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(EventRow {
                seq: row.get(0)?,
                kind: row.get(1)?,
                start: row.get(2)?,
                duration: row.get(3)?,
                volume: row.get(4)?,
                side: row.get(5)?,
                fields: row.get(6)?,
            })
        })?;
        let mut events = Vec::new();
        for row in rows {
            events.push(row?.into_event()?);
        }
        Ok(EventStore::from_events(events))
    }

    /// Replaces the stored events with the contents of `store`.
    pub fn save_events(&mut self, store: &EventStore) -> Result<usize, DbError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM events", [])?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO events (type, start, duration, volume, side, fields)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )?;
            for event in store.all() {
                let fields = if event.fields.is_empty() {
                    None
                } else {
                    serde_json::to_string(&event.fields).ok()
                };
                written += stmt.execute(params![
                    event.type_name,
                    format_timestamp(event.start),
                    i64::try_from(event.duration).unwrap_or(i64::MAX),
                    event.volume,
                    event.side.map(Side::as_str),
                    fields,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(written, "saved events");
        Ok(written)
    }

    /// Reads a raw setting.
    pub fn get_setting(&self, key: &str) -> Result<Option<String>, DbError> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Writes a raw setting, replacing any previous value.
    pub fn set_setting(&mut self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO settings (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            ",
            params![key, value],
        )?;
        Ok(())
    }

    /// Removes a setting. Missing keys are ignored.
    pub fn delete_setting(&mut self, key: &str) -> Result<(), DbError> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?", [key])?;
        Ok(())
    }
}

impl ConfigStore for Database {
    type Error = DbError;

    fn get(&self, key: &str) -> Option<String> {
        match self.get_setting(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(key, error = %err, "failed to read setting");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.set_setting(key, value)
    }
}

#[derive(Debug)]
struct EventRow {
    seq: i64,
    kind: String,
    start: String,
    duration: i64,
    volume: Option<i64>,
    side: Option<String>,
    fields: Option<String>,
}

impl EventRow {
    fn into_event(self) -> Result<Event, DbError> {
        let seq = self.seq;
        let start = parse_timestamp(&self.start, seq)?;
        let side = self
            .side
            .map(|side| side.parse::<Side>())
            .transpose()
            .map_err(|err| DbError::InvalidEventData {
                seq,
                message: err.to_string(),
            })?;
        let fields: BTreeMap<String, FieldValue> = match self.fields {
            Some(json) => serde_json::from_str(&json).map_err(|err| DbError::InvalidEventData {
                seq,
                message: format!("fields: {err}"),
            })?,
            None => BTreeMap::new(),
        };
        Ok(Event {
            type_name: self.kind,
            start,
            duration: u64::try_from(self.duration).unwrap_or(0),
            volume: self.volume,
            side,
            fields,
        })
    }
}

fn parse_timestamp(timestamp: &str, seq: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            seq,
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
