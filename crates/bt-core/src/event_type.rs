//! Built-in activity types and the side enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of activity kinds with hardcoded schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinType {
    Sleeping,
    Pumping,
    Breastfeeding,
}

impl BuiltinType {
    /// All built-ins, in display order.
    pub const ALL: [Self; 3] = [Self::Sleeping, Self::Pumping, Self::Breastfeeding];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sleeping => "Sleeping",
            Self::Pumping => "Pumping",
            Self::Breastfeeding => "Breastfeeding",
        }
    }

    /// Fixed color tag used by the timeline and charts.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Sleeping => "#6c8ebf",
            Self::Pumping => "#82b366",
            Self::Breastfeeding => "#d6a0c4",
        }
    }

    /// Returns true if `name` is exactly one of the built-in names.
    pub fn is_builtin(name: &str) -> bool {
        name.parse::<Self>().is_ok()
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BuiltinType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Sleeping" => Ok(Self::Sleeping),
            "Pumping" => Ok(Self::Pumping),
            "Breastfeeding" => Ok(Self::Breastfeeding),
            _ => Err(UnknownEventType(s.to_string())),
        }
    }
}

impl Serialize for BuiltinType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BuiltinType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for names that are not built-in types.
#[derive(Debug, Clone)]
pub struct UnknownEventType(String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type: {}", self.0)
    }
}

impl std::error::Error for UnknownEventType {}

/// Which side a feeding or pumping session used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Both,
    Left,
    Right,
}

impl Side {
    pub const ALL: [Self; 3] = [Self::Both, Self::Left, Self::Right];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Both => "Both",
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Side {
    type Err = UnknownSide;

    /// Case-insensitive so command-line input like `left` works.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|side| side.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSide(s.to_string()))
    }
}

/// Error type for unknown side strings.
#[derive(Debug, Clone)]
pub struct UnknownSide(String);

impl fmt::Display for UnknownSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown side: {} (expected Both, Left or Right)", self.0)
    }
}

impl std::error::Error for UnknownSide {}
