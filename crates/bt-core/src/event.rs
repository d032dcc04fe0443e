//! Recorded events and their creation from user input.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::event_type::Side;
use crate::schema::{DURATION_FIELD, FieldDescriptor, FieldKind, SIDE_FIELD, START_FIELD, VOLUME_FIELD};
use crate::units::to_canonical_seconds;

/// Raw user input keyed by field name.
pub type FieldInputs = BTreeMap<String, String>;

/// Errors raised while coercing user input into an event.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    /// A numeric field received something that is not a number.
    #[error("{field} must be a number, got {value:?}")]
    InvalidNumber { field: String, value: String },
    /// A timestamp field received something that is not RFC 3339.
    #[error("{field} must be an RFC 3339 timestamp, got {value:?}")]
    InvalidTimestamp { field: String, value: String },
    /// The side field received an unknown option.
    #[error("{field} must be one of Both, Left, Right, got {value:?}")]
    InvalidSide { field: String, value: String },
}

/// Value of a custom input stored on an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// One recorded occurrence of a tracked activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Built-in or custom type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// When the activity started.
    pub start: DateTime<Utc>,
    /// Length of the activity in seconds.
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub duration: u64,
    /// Volume in milliliters, only for types whose schema tracks it.
    #[serde(default, deserialize_with = "lenient_volume")]
    pub volume: Option<i64>,
    /// Side used, only for types whose schema tracks it.
    #[serde(default, deserialize_with = "lenient_side")]
    pub side: Option<Side>,
    /// Values of custom inputs.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, FieldValue>,
}

/// An activity that has been started but not yet finalized.
///
/// Drafts never enter the event store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    #[serde(rename = "type")]
    pub type_name: String,
    pub start: DateTime<Utc>,
}

impl EventDraft {
    /// Starts a draft of `type_name` at `start`.
    pub fn begin(type_name: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            type_name: type_name.into(),
            start: to_millis(start),
        }
    }

    /// Finalizes the draft, interpreting `inputs` through `schema`.
    ///
    /// A zero or absent duration becomes the elapsed time between the start
    /// and `now`, rounded to whole seconds and never negative.
    pub fn finish(
        self,
        schema: &[FieldDescriptor],
        inputs: &FieldInputs,
        now: DateTime<Utc>,
    ) -> Result<Event, InputError> {
        let coerced = coerce_inputs(schema, inputs)?;
        let start = to_millis(coerced.start.unwrap_or(self.start));
        let duration = match coerced.duration {
            Some(seconds) if seconds > 0 => seconds,
            _ => elapsed_seconds(start, now),
        };

        let event = Event {
            type_name: self.type_name,
            start,
            duration,
            volume: coerced.volume,
            side: coerced.side,
            fields: coerced.fields,
        };
        Ok(restrict_to_schema(event, schema))
    }
}

impl Event {
    /// Returns a copy of the event with `inputs` applied on top.
    ///
    /// Fields missing from `inputs` keep their current value.
    pub fn edited(
        &self,
        schema: &[FieldDescriptor],
        inputs: &FieldInputs,
    ) -> Result<Self, InputError> {
        let coerced = coerce_inputs(schema, inputs)?;
        let mut fields = self.fields.clone();
        fields.extend(coerced.fields);

        let event = Self {
            type_name: self.type_name.clone(),
            start: to_millis(coerced.start.unwrap_or(self.start)),
            duration: coerced.duration.unwrap_or(self.duration),
            volume: coerced.volume.or(self.volume),
            side: coerced.side.or(self.side),
            fields,
        };
        Ok(restrict_to_schema(event, schema))
    }
}

#[derive(Debug, Default)]
struct CoercedInputs {
    start: Option<DateTime<Utc>>,
    duration: Option<u64>,
    volume: Option<i64>,
    side: Option<Side>,
    fields: BTreeMap<String, FieldValue>,
}

fn coerce_inputs(
    schema: &[FieldDescriptor],
    inputs: &FieldInputs,
) -> Result<CoercedInputs, InputError> {
    for name in inputs.keys() {
        if !schema.iter().any(|field| &field.name == name) {
            tracing::debug!(field = %name, "ignoring input not in schema");
        }
    }

    let mut coerced = CoercedInputs::default();
    for field in schema {
        let Some(raw) = inputs.get(&field.name).map(|v| v.trim()) else {
            continue;
        };
        if raw.is_empty() {
            continue;
        }

        match &field.kind {
            FieldKind::Timestamp => {
                let parsed = DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| InputError::InvalidTimestamp {
                        field: field.name.clone(),
                        value: raw.to_string(),
                    })?;
                if field.name == START_FIELD {
                    coerced.start = Some(parsed);
                } else {
                    coerced
                        .fields
                        .insert(field.name.clone(), FieldValue::Text(parsed.to_rfc3339()));
                }
            }
            FieldKind::Numeric | FieldKind::RangedNumeric { .. } => {
                let quantity = parse_number(&field.name, raw)?;
                match field.name.as_str() {
                    DURATION_FIELD => {
                        let seconds = to_canonical_seconds(quantity, field.unit);
                        coerced.duration = Some(non_negative_seconds(seconds));
                    }
                    VOLUME_FIELD => coerced.volume = Some(round_to_i64(quantity)),
                    _ => {
                        coerced
                            .fields
                            .insert(field.name.clone(), FieldValue::Number(quantity));
                    }
                }
            }
            FieldKind::Enumerated { .. } => {
                if field.name == SIDE_FIELD {
                    let side = raw.parse::<Side>().map_err(|_| InputError::InvalidSide {
                        field: field.name.clone(),
                        value: raw.to_string(),
                    })?;
                    coerced.side = Some(side);
                } else {
                    coerced
                        .fields
                        .insert(field.name.clone(), FieldValue::Text(raw.to_string()));
                }
            }
        }
    }
    Ok(coerced)
}

/// Drops volume and side when the schema does not carry them.
fn restrict_to_schema(mut event: Event, schema: &[FieldDescriptor]) -> Event {
    let has = |name: &str| schema.iter().any(|field| field.name == name);
    if !has(VOLUME_FIELD) {
        event.volume = None;
    }
    if !has(SIDE_FIELD) {
        event.side = None;
    }
    event
}

fn parse_number(field: &str, raw: &str) -> Result<f64, InputError> {
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| InputError::InvalidNumber {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

/// Truncates to the millisecond precision events are stored with, so a
/// finalized event equals its reloaded and echoed copies.
fn to_millis(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp.trunc_subsecs(3)
}

/// Whole seconds elapsed from `start` to `now`, zero if `now` is earlier.
pub fn elapsed_seconds(start: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    #[allow(clippy::cast_precision_loss)]
    let seconds = now.signed_duration_since(start).num_milliseconds() as f64 / 1000.0;
    non_negative_seconds(seconds)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn non_negative_seconds(seconds: f64) -> u64 {
    if seconds.is_nan() || seconds <= 0.0 {
        0
    } else {
        seconds.round() as u64
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round_to_i64(value: f64) -> i64 {
    value.round() as i64
}

// Remote rows come from a spreadsheet, so numbers may arrive as strings,
// floats or blanks.

#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Text(String),
}

fn loose_number(value: Option<Loose>) -> Option<f64> {
    match value? {
        Loose::Number(n) => Some(n),
        Loose::Text(s) => s.trim().parse::<f64>().ok(),
    }
    .filter(|n| n.is_finite())
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(loose_number(value).map_or(0, non_negative_seconds))
}

fn lenient_volume<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Loose>::deserialize(deserializer)?;
    Ok(loose_number(value).map(round_to_i64))
}

fn lenient_side<'de, D>(deserializer: D) -> Result<Option<Side>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, TimeZone};

    use crate::event_type::BuiltinType;
    use crate::schema::builtin_schema;
    use crate::units::Unit;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, s).unwrap()
    }

    fn inputs(pairs: &[(&str, &str)]) -> FieldInputs {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn absent_duration_defaults_to_elapsed() {
        let schema = builtin_schema(BuiltinType::Sleeping);
        let start = at(10, 0, 0);
        let now = start + Duration::milliseconds(5_400_600);
        let event = EventDraft::begin("Sleeping", start)
            .finish(&schema, &FieldInputs::new(), now)
            .unwrap();
        assert_eq!(event.duration, 5401);
        assert_eq!(event.volume, None);
        assert_eq!(event.side, None);
    }

    #[test]
    fn zero_duration_defaults_to_elapsed_and_never_negative() {
        let schema = builtin_schema(BuiltinType::Breastfeeding);
        let start = at(10, 0, 0);
        let event = EventDraft::begin("Breastfeeding", start)
            .finish(&schema, &inputs(&[("duration", "0")]), start + Duration::seconds(90))
            .unwrap();
        assert_eq!(event.duration, 90);

        let clock_skewed = EventDraft::begin("Breastfeeding", start)
            .finish(&schema, &FieldInputs::new(), start - Duration::seconds(30))
            .unwrap();
        assert_eq!(clock_skewed.duration, 0);
    }

    #[test]
    fn duration_is_converted_by_unit() {
        let start = at(8, 0, 0);
        let sleeping = EventDraft::begin("Sleeping", start)
            .finish(
                &builtin_schema(BuiltinType::Sleeping),
                &inputs(&[("duration", "1.5")]),
                start,
            )
            .unwrap();
        assert_eq!(sleeping.duration, 5400);

        let pumping = EventDraft::begin("Pumping", start)
            .finish(
                &builtin_schema(BuiltinType::Pumping),
                &inputs(&[("duration", "15"), ("volume", "92.6"), ("side", "left")]),
                start,
            )
            .unwrap();
        assert_eq!(pumping.duration, 900);
        assert_eq!(pumping.volume, Some(93));
        assert_eq!(pumping.side, Some(Side::Left));
    }

    #[test]
    fn start_field_overrides_draft_start() {
        let schema = builtin_schema(BuiltinType::Sleeping);
        let event = EventDraft::begin("Sleeping", at(12, 0, 0))
            .finish(
                &schema,
                &inputs(&[("start", "2025-03-01T09:00:00Z"), ("duration", "2")]),
                at(12, 0, 0),
            )
            .unwrap();
        assert_eq!(event.start, at(9, 0, 0));
        assert_eq!(event.duration, 7200);
    }

    #[test]
    fn start_keeps_millisecond_precision_only() {
        let schema = builtin_schema(BuiltinType::Sleeping);
        let start = at(8, 0, 0) + Duration::nanoseconds(123_456_789);
        let draft = EventDraft::begin("Sleeping", start);
        assert_eq!(draft.start, at(8, 0, 0) + Duration::milliseconds(123));

        let event = draft
            .finish(
                &schema,
                &inputs(&[("start", "2025-03-01T07:00:00.987654321Z")]),
                at(9, 0, 0),
            )
            .unwrap();
        assert_eq!(event.start, at(7, 0, 0) + Duration::milliseconds(987));
    }

    #[test]
    fn volume_and_side_only_when_schema_has_them() {
        let schema = builtin_schema(BuiltinType::Sleeping);
        let event = EventDraft::begin("Sleeping", at(1, 0, 0))
            .finish(&schema, &inputs(&[("volume", "50"), ("side", "Left")]), at(2, 0, 0))
            .unwrap();
        assert_eq!(event.volume, None);
        assert_eq!(event.side, None);
    }

    #[test]
    fn custom_inputs_are_kept_raw() {
        let schema = vec![
            FieldDescriptor {
                name: "amount".to_string(),
                label: "amount".to_string(),
                kind: FieldKind::RangedNumeric {
                    min: 0,
                    max: 100,
                    step: 5,
                },
                unit: None,
            },
            FieldDescriptor {
                name: "food".to_string(),
                label: "food".to_string(),
                kind: FieldKind::Enumerated {
                    options: vec!["Option 1".to_string()],
                },
                unit: None,
            },
            FieldDescriptor {
                name: "duration".to_string(),
                label: "Duration".to_string(),
                kind: FieldKind::Numeric,
                unit: None,
            },
        ];
        let event = EventDraft::begin("Snack", at(7, 0, 0))
            .finish(
                &schema,
                &inputs(&[("amount", "35"), ("food", "banana"), ("duration", "120")]),
                at(9, 0, 0),
            )
            .unwrap();
        assert_eq!(event.duration, 120);
        assert_eq!(event.fields.get("amount"), Some(&FieldValue::Number(35.0)));
        assert_eq!(
            event.fields.get("food"),
            Some(&FieldValue::Text("banana".to_string()))
        );
    }

    #[test]
    fn coercion_failures_are_errors() {
        let schema = builtin_schema(BuiltinType::Pumping);
        let draft = EventDraft::begin("Pumping", at(1, 0, 0));
        let err = draft
            .clone()
            .finish(&schema, &inputs(&[("volume", "lots")]), at(2, 0, 0))
            .unwrap_err();
        assert_eq!(
            err,
            InputError::InvalidNumber {
                field: "volume".to_string(),
                value: "lots".to_string()
            }
        );

        let err = draft
            .finish(&schema, &inputs(&[("side", "middle")]), at(2, 0, 0))
            .unwrap_err();
        assert!(matches!(err, InputError::InvalidSide { .. }));
    }

    #[test]
    fn edit_keeps_unset_fields() {
        let schema = builtin_schema(BuiltinType::Pumping);
        let original = EventDraft::begin("Pumping", at(6, 0, 0))
            .finish(
                &schema,
                &inputs(&[("duration", "20"), ("volume", "80"), ("side", "Both")]),
                at(7, 0, 0),
            )
            .unwrap();

        let edited = original.edited(&schema, &inputs(&[("volume", "95")])).unwrap();
        assert_eq!(edited.duration, 1200);
        assert_eq!(edited.volume, Some(95));
        assert_eq!(edited.side, Some(Side::Both));
        assert_eq!(edited.start, original.start);
    }

    #[test]
    fn serializes_with_wire_keys() {
        let event = Event {
            type_name: BuiltinType::Sleeping.to_string(),
            start: at(21, 0, 0),
            duration: 3600,
            volume: None,
            side: None,
            fields: BTreeMap::new(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"type":"Sleeping","start":"2025-03-01T21:00:00Z","duration":3600,"volume":null,"side":null}"#
        );
    }

    #[test]
    fn deserializes_spreadsheet_rows() {
        let json = r#"[
            {"type":"Pumping","start":"2025-03-01T06:00:00.000Z","duration":"600","volume":"85","side":"Right"},
            {"type":"Sleeping","start":"2025-03-01T01:00:00Z","duration":1800.4,"volume":"","side":""},
            {"type":"Snack","start":"2025-03-01T02:00:00Z"}
        ]"#;
        let events: Vec<Event> = serde_json::from_str(json).unwrap();
        assert_eq!(events[0].duration, 600);
        assert_eq!(events[0].volume, Some(85));
        assert_eq!(events[0].side, Some(Side::Right));
        assert_eq!(events[1].duration, 1800);
        assert_eq!(events[1].volume, None);
        assert_eq!(events[1].side, None);
        assert_eq!(events[2].duration, 0);
    }

    #[test]
    fn unit_lookup_matches_schema() {
        let schema = builtin_schema(BuiltinType::Breastfeeding);
        let duration = schema.iter().find(|f| f.name == DURATION_FIELD).unwrap();
        assert_eq!(duration.unit, Some(Unit::Minutes));
    }
}
