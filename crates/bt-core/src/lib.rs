//! Core domain logic for the baby tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Units: converting display units to canonical seconds
//! - Schemas: resolving the inputs of built-in and custom event types
//! - Events: finalizing drafts and keeping them in an ordered store
//! - Aggregation: daily summaries and trend series
//! - Custom types: creating and removing user-defined event types

pub mod aggregate;
pub mod config_store;
pub mod custom_types;
pub mod event;
pub mod event_type;
pub mod schema;
pub mod store;
pub mod units;

pub use aggregate::{DailySummary, TrendPoint, group_by_day, summarize, trends};
pub use config_store::{ConfigStore, MemoryConfigStore};
pub use custom_types::{CreateTypeError, CustomTypes, NewCustomType, color_for};
pub use event::{Event, EventDraft, FieldInputs, FieldValue, InputError};
pub use event_type::{BuiltinType, Side, UnknownEventType};
pub use schema::{
    CustomInput, CustomInputKind, CustomTypeSettings, FieldDescriptor, FieldKind, SchemaRegistry,
};
pub use store::EventStore;
pub use units::{Unit, format_duration, from_canonical_seconds, to_canonical_seconds};
