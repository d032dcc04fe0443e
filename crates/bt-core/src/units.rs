//! Conversion between display units and canonical seconds.

use std::fmt;

use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_MINUTE: f64 = 60.0;

/// Semantic unit attached to a built-in field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Hours,
    Minutes,
    Milliliters,
}

impl Unit {
    /// Short suffix used when rendering a quantity.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Hours => "h",
            Self::Minutes => "min",
            Self::Milliliters => "ml",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Hours => "hours",
            Self::Minutes => "minutes",
            Self::Milliliters => "milliliters",
        };
        write!(f, "{s}")
    }
}

/// Converts `quantity` expressed in `unit` to seconds.
///
/// Anything other than hours or minutes is assumed to already be seconds.
/// Negative input is converted as-is.
#[must_use]
pub fn to_canonical_seconds(quantity: f64, unit: Option<Unit>) -> f64 {
    match unit {
        Some(Unit::Hours) => quantity * SECONDS_PER_HOUR,
        Some(Unit::Minutes) => quantity * SECONDS_PER_MINUTE,
        Some(Unit::Milliliters) | None => quantity,
    }
}

/// Converts `seconds` back to `unit`. Inverse of [`to_canonical_seconds`].
#[must_use]
pub fn from_canonical_seconds(seconds: f64, unit: Option<Unit>) -> f64 {
    match unit {
        Some(Unit::Hours) => seconds / SECONDS_PER_HOUR,
        Some(Unit::Minutes) => seconds / SECONDS_PER_MINUTE,
        Some(Unit::Milliliters) | None => seconds,
    }
}

/// Formats seconds as `"Xh Ym"` when at least an hour, `"Ym"` otherwise.
/// Negative durations render as `0m`.
pub fn format_duration(seconds: i64) -> String {
    if seconds < 0 {
        return "0m".to_string();
    }
    let total_minutes = seconds / 60;
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
