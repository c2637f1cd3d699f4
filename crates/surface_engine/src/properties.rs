//! Per-window property sets
//!
//! Properties are the per-window knobs the embedding layer tunes at runtime
//! (color channels, toggles, labels). Values are copied into commands at
//! send time, so a producer may keep mutating its own copy after sending.
//! Application order is last-writer-wins under the run loop's
//! single-threaded command application.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Integer value (e.g. a color channel intensity)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Boolean toggle
    Bool(bool),
    /// Text value
    Text(String),
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Name -> value mapping owned by one window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    values: HashMap<String, PropertyValue>,
}

impl PropertySet {
    /// Create an empty property set
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a property by name
    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key)
    }

    /// Set a property, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: PropertyValue) {
        self.values.insert(key.into(), value);
    }

    /// Number of properties currently set
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no properties are set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over all properties
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}
