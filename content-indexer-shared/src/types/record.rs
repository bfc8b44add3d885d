//! Raw content records as delivered by the content repository.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Record field holding the record's language id.
pub const LANGUAGE_FIELD: &str = "sys_language_uid";

/// Language value marking a record as valid for every language.
pub const ALL_LANGUAGES: i64 = -1;

/// A raw content record: a flat mapping of column name to JSON value.
///
/// Records are views, not entities. Overlays and virtual fields are applied by
/// producing new records with [`Record::overlaid_with`] and
/// [`Record::with_virtual_field`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record from an existing JSON object.
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Builder-style insert, mostly useful for fixtures.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a field value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Get the raw value of a field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether the record carries a non-null value for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|v| !v.is_null())
    }

    /// Read a field as a string. Numbers and booleans are rendered, null is absent.
    pub fn get_string(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Read a field as an integer, accepting numeric strings.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.fields.get(name)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// The record's own language id, if it carries one.
    pub fn language(&self) -> Option<i64> {
        self.get_i64(LANGUAGE_FIELD)
    }

    /// Return a copy of this record with every non-null field of `overlay`
    /// written on top.
    pub fn overlaid_with(&self, overlay: &Record) -> Record {
        let mut merged = self.fields.clone();
        for (name, value) in &overlay.fields {
            if !value.is_null() {
                merged.insert(name.clone(), value.clone());
            }
        }
        Record { fields: merged }
    }

    /// Return a copy of this record with an additional virtual field.
    pub fn with_virtual_field(&self, name: &str, value: impl Into<Value>) -> Record {
        let mut fields = self.fields.clone();
        fields.insert(name.to_string(), value.into());
        Record { fields }
    }

    /// Iterate over all fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}
