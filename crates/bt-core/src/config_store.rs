//! Key-value settings storage.
//!
//! The schema registry and the custom type lifecycle never touch persistent
//! storage directly; they are handed a [`ConfigStore`]. Values are JSON
//! documents stored as strings under the keys below.

use std::collections::HashMap;
use std::convert::Infallible;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Ordered array of custom type names.
pub const CUSTOM_EVENT_TYPES_KEY: &str = "customEventTypes";
/// Map from type name to color tag.
pub const CUSTOM_EVENT_COLORS_KEY: &str = "customEventColors";
/// Map from type name to its schema customization.
pub const CUSTOM_EVENT_SETTINGS_KEY: &str = "customEventSettings";

/// String key-value store holding user settings.
pub trait ConfigStore {
    /// Error raised when a write fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the value under `key`, or `None` if unset or unreadable.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;
}

/// In-memory store, used in tests and as a scratch store.
#[derive(Debug, Default, Clone)]
pub struct MemoryConfigStore {
    values: HashMap<String, String>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Reads and decodes the JSON value under `key`.
///
/// Missing keys and undecodable values both yield `T::default()`.
pub fn read_json<S, T>(store: &S, key: &str) -> T
where
    S: ConfigStore + ?Sized,
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key) else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, error = %err, "ignoring malformed setting");
            T::default()
        }
    }
}

/// Encodes `value` as JSON and stores it under `key`.
///
/// # Panics
///
/// Panics if `value` cannot be encoded, which only happens for maps with
/// non-string keys or failing `Serialize` impls.
pub(crate) fn write_json<S, T>(store: &mut S, key: &str, value: &T) -> Result<(), S::Error>
where
    S: ConfigStore + ?Sized,
    T: Serialize + ?Sized,
{
    let encoded = serde_json::to_string(value).expect("settings values encode as JSON");
    store.set(key, &encoded)
}
