//! Command-line argument definitions.

use std::path::PathBuf;

use bt_core::custom_types::NEUTRAL_COLOR;
use bt_core::{CustomInput, CustomInputKind};
use clap::{Parser, Subcommand};

/// Baby care tracker.
///
/// Logs sleeping, pumping and breastfeeding sessions (plus your own event
/// types) and summarizes them per day.
#[derive(Debug, Parser)]
#[command(name = "bt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start timing an activity.
    Start {
        /// Event type (e.g., Sleeping).
        type_name: String,

        /// Start time: ISO 8601 or relative (e.g., '20 minutes ago'). Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },

    /// Finish the activity in progress and record it.
    Finish {
        /// Field value as name=value (e.g., -f volume=90).
        #[arg(short = 'f', long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Record a completed activity in one step.
    Log {
        /// Event type (e.g., Pumping).
        type_name: String,

        /// Start time: ISO 8601 or relative. Defaults to now.
        #[arg(long)]
        at: Option<String>,

        /// Field value as name=value.
        #[arg(short = 'f', long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Change fields of a recorded event.
    Edit {
        /// Position shown by `bt list`.
        index: usize,

        /// Field value as name=value.
        #[arg(short = 'f', long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Delete a recorded event.
    Delete {
        /// Position shown by `bt list`.
        index: usize,
    },

    /// List recorded events with their positions.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show events grouped by day with daily totals.
    Timeline,

    /// Show per-day sleep, pumping and feeding trends.
    Trends {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the fields an event type captures.
    Schema {
        /// Event type name.
        type_name: String,
    },

    /// Manage custom event types.
    Types {
        #[command(subcommand)]
        action: TypesAction,
    },

    /// Fetch events from the sync endpoint and merge them in.
    Pull,

    /// Show the activity in progress and store totals.
    Status,
}

/// Custom type management actions.
#[derive(Debug, Subcommand)]
pub enum TypesAction {
    /// List built-in and custom types.
    List,

    /// Create a custom type.
    Add {
        /// Type name; must not clash with an existing type.
        name: String,

        /// Display color.
        #[arg(long, default_value = NEUTRAL_COLOR)]
        color: String,

        /// Track a duration field.
        #[arg(long)]
        duration: bool,

        /// Track volume and side fields.
        #[arg(long)]
        volume: bool,

        /// Extra input as name:kind (timestamp, numeric, ranged-numeric, enumerated).
        #[arg(long = "input", value_parser = parse_custom_input)]
        inputs: Vec<CustomInput>,
    },

    /// Remove a custom type.
    Remove {
        /// Type name.
        name: String,
    },
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {s}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in {s}"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn parse_custom_input(s: &str) -> Result<CustomInput, String> {
    let (name, kind) = s
        .split_once(':')
        .ok_or_else(|| format!("expected name:kind, got {s}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing input name in {s}"));
    }
    let kind = kind
        .trim()
        .parse::<CustomInputKind>()
        .map_err(|_| format!("unknown input kind in {s}"))?;
    Ok(CustomInput {
        name: name.to_string(),
        kind,
    })
}
