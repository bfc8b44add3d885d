//! Document types for the search index.
//!
//! A [`Document`] is the structured record submitted to the search engine for
//! one item in one language. Field order is preserved so that documents
//! serialize deterministically.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use serde_json::Value;

/// Unique document id.
pub const FIELD_ID: &str = "id";
/// Type discriminator; never writable through a field mapping.
pub const FIELD_TYPE: &str = "type";
/// Record uid.
pub const FIELD_UID: &str = "uid";
/// Page the record lives on.
pub const FIELD_PID: &str = "pid";
/// Site identifier.
pub const FIELD_SITE: &str = "site";
/// Hash scoping documents to one site.
pub const FIELD_SITE_HASH: &str = "siteHash";
/// Language marker.
pub const FIELD_LANGUAGE: &str = "language";
/// Access flags.
pub const FIELD_ACCESS: &str = "access";
/// Full-text content.
pub const FIELD_CONTENT: &str = "content";
/// Record creation date.
pub const FIELD_CREATED: &str = "created";
/// Record modification date.
pub const FIELD_CHANGED: &str = "changed";
/// Time the document was built.
pub const FIELD_INDEXED_AT: &str = "indexedAt";

/// A document field value: a scalar or a list of scalars.
#[derive(Debug, Clone, PartialEq, Deserialize, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// Convert a JSON value into a field value.
    ///
    /// Objects are rendered as their JSON text; nested arrays are flattened
    /// into a single list and `null` yields `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Int(i)),
                None => n.as_f64().map(Self::Float),
            },
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(items) => {
                let mut flat = Vec::with_capacity(items.len());
                for item in items {
                    match Self::from_json(item) {
                        Some(Self::List(inner)) => flat.extend(inner),
                        Some(scalar) => flat.push(scalar),
                        None => {}
                    }
                }
                Some(Self::List(flat))
            }
            Value::Object(_) => Some(Self::String(value.to_string())),
        }
    }

    /// Whether the value carries no content (empty string or empty list).
    pub fn is_empty(&self) -> bool {
        match self {
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Borrow the value as a string if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Document representation for the search index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: Vec<(String, FieldValue)>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value in place.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Append a value to a field, turning it into a list when needed.
    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, FieldValue::List(items))) => match value {
                FieldValue::List(more) => items.extend(more),
                scalar => items.push(scalar),
            },
            Some(slot) => {
                let previous = std::mem::replace(&mut slot.1, FieldValue::List(Vec::new()));
                let mut items = vec![previous];
                match value {
                    FieldValue::List(more) => items.extend(more),
                    scalar => items.push(scalar),
                }
                slot.1 = FieldValue::List(items);
            }
            None => self.fields.push((name, value)),
        }
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let position = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(position).1)
    }

    /// Whether the document carries the given field.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The document id, if set.
    pub fn id(&self) -> Option<&str> {
        self.get(FIELD_ID).and_then(FieldValue::as_str)
    }

    /// The type discriminator, if set.
    pub fn doc_type(&self) -> Option<&str> {
        self.get(FIELD_TYPE).and_then(FieldValue::as_str)
    }

    /// Iterate over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the document has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render the document as a JSON object.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_field_replaces_in_place() {
        let mut doc = Document::new();
        doc.set_field(FIELD_ID, "a");
        doc.set_field("title", "first");
        doc.set_field(FIELD_ID, "b");

        assert_eq!(doc.field_names(), vec!["id", "title"]);
        assert_eq!(doc.id(), Some("b"));
    }

    #[test]
    fn test_add_field_builds_list() {
        let mut doc = Document::new();
        doc.add_field("tags", "a");
        doc.add_field("tags", "b");
        doc.add_field("tags", FieldValue::List(vec!["c".into()]));

        assert_eq!(
            doc.get("tags"),
            Some(&FieldValue::List(vec!["a".into(), "b".into(), "c".into()]))
        );
    }

    #[test]
    fn test_serialization_preserves_order() {
        let mut doc = Document::new();
        doc.set_field("z", 1i64);
        doc.set_field("a", 2.5);
        doc.set_field("m", true);

        let text = serde_json::to_string(&doc).unwrap();
        assert_eq!(text, r#"{"z":1,"a":2.5,"m":true}"#);
    }

    #[test]
    fn test_field_value_from_json_flattens_lists() {
        let value = json!(["a", ["b", 3], null]);
        assert_eq!(
            FieldValue::from_json(&value),
            Some(FieldValue::List(vec!["a".into(), "b".into(), 3i64.into()]))
        );
        assert_eq!(FieldValue::from_json(&Value::Null), None);
    }

    #[test]
    fn test_remove_field() {
        let mut doc = Document::new();
        doc.set_field(FIELD_TYPE, "tt_content");
        assert_eq!(doc.remove(FIELD_TYPE), Some("tt_content".into()));
        assert!(doc.is_empty());
        assert_eq!(doc.remove(FIELD_TYPE), None);
    }
}
