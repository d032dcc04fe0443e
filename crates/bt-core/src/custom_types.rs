//! Creation and removal of user-defined event types.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::config_store::{
    CUSTOM_EVENT_COLORS_KEY, CUSTOM_EVENT_SETTINGS_KEY, CUSTOM_EVENT_TYPES_KEY, ConfigStore,
    read_json, write_json,
};
use crate::event_type::BuiltinType;
use crate::schema::{CustomInput, CustomTypeSettings};

/// Color used when a type has no stored color.
pub const NEUTRAL_COLOR: &str = "#9e9e9e";

/// Reasons a custom type cannot be created.
#[derive(Debug, Error)]
pub enum CreateTypeError {
    #[error("type name cannot be blank")]
    Blank,
    #[error("{0} is a built-in type")]
    BuiltIn(String),
    #[error("type {0} already exists")]
    Duplicate(String),
    /// Two inputs of the resulting schema share a name.
    #[error("field {0} appears more than once")]
    DuplicateField(String),
    /// The settings store rejected a write.
    #[error("failed to save type settings: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Everything needed to register a custom type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewCustomType {
    pub name: String,
    pub color: String,
    pub track_duration: bool,
    pub track_volume: bool,
    pub custom_inputs: Vec<CustomInput>,
}

/// Registry of custom types backed by a settings store.
pub struct CustomTypes<'a, S: ConfigStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: ConfigStore + ?Sized> CustomTypes<'a, S> {
    pub const fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Custom type names in creation order.
    pub fn names(&self) -> Vec<String> {
        read_json(&*self.store, CUSTOM_EVENT_TYPES_KEY)
    }

    /// Built-in names followed by custom names.
    pub fn all_type_names(&self) -> Vec<String> {
        BuiltinType::ALL
            .iter()
            .map(ToString::to_string)
            .chain(self.names())
            .collect()
    }

    /// Registers a new type with its color and schema customization.
    ///
    /// The settings record and color are written before the name list. A
    /// failed write can leave an orphaned record or color, but never a listed
    /// type without its schema; retrying the same name overwrites both.
    pub fn create_type(&mut self, new_type: NewCustomType) -> Result<(), CreateTypeError> {
        let name = new_type.name;
        if name.trim().is_empty() {
            return Err(CreateTypeError::Blank);
        }
        if BuiltinType::is_builtin(&name) {
            return Err(CreateTypeError::BuiltIn(name));
        }
        let mut names = self.names();
        if names.contains(&name) {
            return Err(CreateTypeError::Duplicate(name));
        }

        let record = CustomTypeSettings {
            track_duration: new_type.track_duration,
            track_volume: new_type.track_volume,
            custom_inputs: new_type.custom_inputs,
        };
        let mut seen = BTreeSet::new();
        for field in record.to_schema() {
            if !seen.insert(field.name.clone()) {
                return Err(CreateTypeError::DuplicateField(field.name));
            }
        }

        let mut settings: BTreeMap<String, serde_json::Value> =
            read_json(&*self.store, CUSTOM_EVENT_SETTINGS_KEY);
        settings.insert(
            name.clone(),
            serde_json::to_value(&record).expect("type settings encode as JSON"),
        );
        write_json(&mut *self.store, CUSTOM_EVENT_SETTINGS_KEY, &settings).map_err(store_error)?;

        let mut colors: BTreeMap<String, String> = read_json(&*self.store, CUSTOM_EVENT_COLORS_KEY);
        colors.insert(name.clone(), new_type.color);
        write_json(&mut *self.store, CUSTOM_EVENT_COLORS_KEY, &colors).map_err(store_error)?;

        names.push(name.clone());
        write_json(&mut *self.store, CUSTOM_EVENT_TYPES_KEY, &names).map_err(store_error)?;

        tracing::debug!(type_name = %name, "created custom type");
        Ok(())
    }

    /// Removes a type with its color and customization. Unknown names are a no-op.
    pub fn remove_type(&mut self, name: &str) -> Result<(), S::Error> {
        let mut names = self.names();
        if let Some(pos) = names.iter().position(|n| n == name) {
            names.remove(pos);
            write_json(&mut *self.store, CUSTOM_EVENT_TYPES_KEY, &names)?;
        }

        let mut colors: BTreeMap<String, String> = read_json(&*self.store, CUSTOM_EVENT_COLORS_KEY);
        if colors.remove(name).is_some() {
            write_json(&mut *self.store, CUSTOM_EVENT_COLORS_KEY, &colors)?;
        }

        let mut settings: BTreeMap<String, serde_json::Value> =
            read_json(&*self.store, CUSTOM_EVENT_SETTINGS_KEY);
        if settings.remove(name).is_some() {
            write_json(&mut *self.store, CUSTOM_EVENT_SETTINGS_KEY, &settings)?;
        }
        Ok(())
    }

    /// Display color for any type name.
    pub fn color_for(&self, type_name: &str) -> String {
        color_for(&*self.store, type_name)
    }
}

/// Display color for `type_name`: fixed for built-ins, stored for custom
/// types, neutral otherwise.
pub fn color_for<S: ConfigStore + ?Sized>(store: &S, type_name: &str) -> String {
    if let Ok(builtin) = type_name.parse::<BuiltinType>() {
        return builtin.color().to_string();
    }
    let colors: BTreeMap<String, String> = read_json(store, CUSTOM_EVENT_COLORS_KEY);
    colors
        .get(type_name)
        .cloned()
        .unwrap_or_else(|| NEUTRAL_COLOR.to_string())
}

fn store_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> CreateTypeError {
    CreateTypeError::Store(Box::new(err))
}
