//! Event schemas: which inputs an event of a given type captures.
//!
//! Built-in types carry a fixed schema. Custom types assemble theirs from a
//! [`CustomTypeSettings`] record persisted under
//! [`CUSTOM_EVENT_SETTINGS_KEY`](crate::config_store::CUSTOM_EVENT_SETTINGS_KEY).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config_store::{CUSTOM_EVENT_SETTINGS_KEY, ConfigStore, read_json};
use crate::event_type::{BuiltinType, Side};
use crate::units::Unit;

pub const START_FIELD: &str = "start";
pub const DURATION_FIELD: &str = "duration";
pub const VOLUME_FIELD: &str = "volume";
pub const SIDE_FIELD: &str = "side";

const VOLUME_MIN: i64 = 0;
const VOLUME_MAX: i64 = 300;
const VOLUME_STEP: i64 = 10;

const RANGE_DEFAULT_MIN: i64 = 0;
const RANGE_DEFAULT_MAX: i64 = 100;
const RANGE_DEFAULT_STEP: i64 = 5;
const ENUM_DEFAULT_OPTIONS: [&str; 2] = ["Option 1", "Option 2"];

/// What kind of value a field accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldKind {
    Timestamp,
    Numeric,
    RangedNumeric { min: i64, max: i64, step: i64 },
    Enumerated { options: Vec<String> },
}

/// One input of an event schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
}

impl FieldDescriptor {
    fn new(name: &str, label: &str, kind: FieldKind, unit: Option<Unit>) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            unit,
        }
    }

    fn side() -> Self {
        let options = Side::ALL.iter().map(|s| s.as_str().to_string()).collect();
        Self::new(SIDE_FIELD, "Side", FieldKind::Enumerated { options }, None)
    }

    fn volume(unit: Option<Unit>) -> Self {
        Self::new(
            VOLUME_FIELD,
            "Volume",
            FieldKind::RangedNumeric {
                min: VOLUME_MIN,
                max: VOLUME_MAX,
                step: VOLUME_STEP,
            },
            unit,
        )
    }
}

/// Input kind a user can pick for a custom field.
///
/// Accepts the HTML form spellings as aliases since older settings used them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CustomInputKind {
    #[serde(alias = "datetime-local")]
    Timestamp,
    #[serde(alias = "number")]
    Numeric,
    #[serde(alias = "range")]
    RangedNumeric,
    #[serde(alias = "select")]
    Enumerated,
}

impl CustomInputKind {
    /// Expands the kind into a concrete field kind with default bounds.
    #[must_use]
    pub fn expand(self) -> FieldKind {
        match self {
            Self::Timestamp => FieldKind::Timestamp,
            Self::Numeric => FieldKind::Numeric,
            Self::RangedNumeric => FieldKind::RangedNumeric {
                min: RANGE_DEFAULT_MIN,
                max: RANGE_DEFAULT_MAX,
                step: RANGE_DEFAULT_STEP,
            },
            Self::Enumerated => FieldKind::Enumerated {
                options: ENUM_DEFAULT_OPTIONS.iter().map(|o| (*o).to_string()).collect(),
            },
        }
    }
}

impl std::str::FromStr for CustomInputKind {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
    }
}

/// A user-added input on a custom type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomInput {
    pub name: String,
    pub kind: CustomInputKind,
}

/// Persisted schema customization of a custom type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTypeSettings {
    #[serde(default)]
    pub track_duration: bool,
    #[serde(default)]
    pub track_volume: bool,
    #[serde(default)]
    pub custom_inputs: Vec<CustomInput>,
}

impl CustomTypeSettings {
    /// Builds the ordered descriptor list: custom inputs, then duration,
    /// then volume and side.
    #[must_use]
    pub fn to_schema(&self) -> Vec<FieldDescriptor> {
        let mut fields: Vec<FieldDescriptor> = self
            .custom_inputs
            .iter()
            .map(|input| FieldDescriptor::new(&input.name, &input.name, input.kind.expand(), None))
            .collect();
        if self.track_duration {
            fields.push(FieldDescriptor::new(
                DURATION_FIELD,
                "Duration",
                FieldKind::Numeric,
                None,
            ));
        }
        if self.track_volume {
            fields.push(FieldDescriptor::volume(None));
            fields.push(FieldDescriptor::side());
        }
        fields
    }
}

/// Fixed schema of a built-in type.
#[must_use]
pub fn builtin_schema(kind: BuiltinType) -> Vec<FieldDescriptor> {
    let start = FieldDescriptor::new(START_FIELD, "Start", FieldKind::Timestamp, None);
    match kind {
        BuiltinType::Sleeping => vec![
            start,
            FieldDescriptor::new(
                DURATION_FIELD,
                "Duration (hours)",
                FieldKind::Numeric,
                Some(Unit::Hours),
            ),
        ],
        BuiltinType::Pumping => vec![
            start,
            FieldDescriptor::new(
                DURATION_FIELD,
                "Duration (minutes)",
                FieldKind::Numeric,
                Some(Unit::Minutes),
            ),
            FieldDescriptor::volume(Some(Unit::Milliliters)),
            FieldDescriptor::side(),
        ],
        BuiltinType::Breastfeeding => vec![
            start,
            FieldDescriptor::new(
                DURATION_FIELD,
                "Duration (minutes)",
                FieldKind::Numeric,
                Some(Unit::Minutes),
            ),
            FieldDescriptor::side(),
        ],
    }
}

/// Reads every well-formed customization record from the store.
///
/// Entries that fail to decode are dropped individually.
pub fn load_settings<S>(store: &S) -> BTreeMap<String, CustomTypeSettings>
where
    S: ConfigStore + ?Sized,
{
    let raw: BTreeMap<String, serde_json::Value> = read_json(store, CUSTOM_EVENT_SETTINGS_KEY);
    raw.into_iter()
        .filter_map(|(name, value)| match serde_json::from_value(value) {
            Ok(settings) => Some((name, settings)),
            Err(err) => {
                tracing::warn!(type_name = %name, error = %err, "ignoring malformed type settings");
                None
            }
        })
        .collect()
}

/// Resolves event schemas against a settings store.
pub struct SchemaRegistry<'a, S: ConfigStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ConfigStore + ?Sized> SchemaRegistry<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Returns the ordered field descriptors for `type_name`.
    ///
    /// Built-in types always resolve to their fixed schema, even when a
    /// customization record exists under the same name. Unknown names and
    /// names without a readable record resolve to an empty schema.
    pub fn resolve_schema(&self, type_name: &str) -> Vec<FieldDescriptor> {
        if let Ok(builtin) = type_name.parse::<BuiltinType>() {
            return builtin_schema(builtin);
        }
        load_settings(self.store)
            .get(type_name)
            .map(CustomTypeSettings::to_schema)
            .unwrap_or_default()
    }

    /// Returns the unit of `field_name` within the schema of `type_name`.
    pub fn resolve_unit(&self, type_name: &str, field_name: &str) -> Option<Unit> {
        self.resolve_schema(type_name)
            .into_iter()
            .find(|field| field.name == field_name)
            .and_then(|field| field.unit)
    }
}
