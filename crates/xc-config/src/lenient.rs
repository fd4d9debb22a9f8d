//! Field-by-field reading of JSON objects.
//!
//! Records are built one key at a time. A value of the wrong type (`"tag": null`,
//! `"selector": "proxy-"`) is not an import error: it stays in the remainder map,
//! which the record keeps as `extra`, so export writes it back unchanged and the
//! validators can report the key.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub(crate) struct Fields(Map<String, Value>);

impl Fields {
    pub(crate) fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Typed value of `key`; on a type mismatch the raw value is kept.
    pub(crate) fn take<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let raw = self.0.shift_remove(key)?;
        match T::deserialize(&raw) {
            Ok(v) => Some(v),
            Err(_) => {
                self.0.insert(key.to_string(), raw);
                None
            }
        }
    }

    pub(crate) fn text(&mut self, key: &str) -> String {
        self.take(key).unwrap_or_default()
    }

    pub(crate) fn list<T: DeserializeOwned>(&mut self, key: &str) -> Vec<T> {
        self.take(key).unwrap_or_default()
    }

    pub(crate) fn value(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub(crate) fn rest(self) -> Map<String, Value> {
        self.0
    }
}

/// Whether `key` was present with a value its typed field could not hold.
pub(crate) fn mistyped(extra: &Map<String, Value>, key: &str) -> bool {
    extra.contains_key(key)
}

/// As [`mistyped`], but an explicit `null` counts as absent.
pub(crate) fn mistyped_non_null(extra: &Map<String, Value>, key: &str) -> bool {
    extra.get(key).is_some_and(|v| !v.is_null())
}
