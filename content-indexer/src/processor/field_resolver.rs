//! Field value resolution.
//!
//! Evaluates a [`FieldMappingSpec`] against a raw record. Literal mappings
//! read a record column and coerce it to the declared [`FieldType`]; computed
//! and relation mappings are rendered by the host platform and, when the
//! output is a serialized list, expanded into a list value.

use std::sync::Arc;

use content_indexer_shared::types::document::FIELD_TYPE;
use content_indexer_shared::{
    FieldMapping, FieldMappingSpec, FieldSource, FieldType, FieldValue, ProcessingInstruction,
    Record,
};
use serde_json::Value;
use tracing::trace;

use crate::errors::IndexerError;
use crate::interfaces::{ContentRenderer, RenderContext, SerializedValueDetector};
use crate::processor::iso_date;

/// Coerce a raw record value to a declared field type.
///
/// Numeric types accept numbers, numeric strings and booleans; empty or
/// unparseable input becomes `0`. Arrays are coerced element by element.
/// `null` yields `None`.
pub fn coerce(value: &Value, field_type: FieldType) -> Option<FieldValue> {
    if let Value::Array(items) = value {
        let items: Vec<FieldValue> = items
            .iter()
            .filter_map(|item| coerce(item, field_type))
            .collect();
        return Some(FieldValue::List(items));
    }
    if value.is_null() {
        return None;
    }

    match field_type {
        FieldType::Int => Some(FieldValue::Int(to_i64(value))),
        FieldType::Float => Some(FieldValue::Float(to_f64(value))),
        FieldType::Bool => Some(FieldValue::Bool(to_bool(value))),
        FieldType::Date => to_date(value),
        FieldType::String => Some(FieldValue::String(to_string(value))),
    }
}

fn to_i64(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or(0)
        }
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

fn to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        _ => false,
    }
}

fn to_date(value: &Value) -> Option<FieldValue> {
    match value {
        Value::Number(n) => n.as_i64().and_then(iso_date).map(FieldValue::String),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            match s.parse::<i64>() {
                Ok(timestamp) => iso_date(timestamp).map(FieldValue::String),
                Err(_) => Some(FieldValue::String(s.to_string())),
            }
        }
        _ => None,
    }
}

fn to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        other => other.to_string(),
    }
}

fn apply(instruction: ProcessingInstruction, value: FieldValue) -> FieldValue {
    match (instruction, value) {
        (_, FieldValue::List(items)) if instruction != ProcessingInstruction::PathToHierarchy => {
            FieldValue::List(items.into_iter().map(|v| apply(instruction, v)).collect())
        }
        (ProcessingInstruction::Lowercase, FieldValue::String(s)) => {
            FieldValue::String(s.to_lowercase())
        }
        (ProcessingInstruction::Uppercase, FieldValue::String(s)) => {
            FieldValue::String(s.to_uppercase())
        }
        (ProcessingInstruction::TimestampToIsoDate, FieldValue::Int(timestamp)) => {
            iso_date(timestamp).map_or(FieldValue::Int(timestamp), FieldValue::String)
        }
        (ProcessingInstruction::TimestampToIsoDate, FieldValue::String(s)) => {
            match s.trim().parse::<i64>().ok().and_then(iso_date) {
                Some(date) => FieldValue::String(date),
                None => FieldValue::String(s),
            }
        }
        (ProcessingInstruction::PathToHierarchy, FieldValue::String(path)) => {
            path_to_hierarchy(&path)
        }
        (ProcessingInstruction::PathToHierarchy, FieldValue::List(items)) => {
            let mut levels = Vec::new();
            for item in items {
                match apply(ProcessingInstruction::PathToHierarchy, item) {
                    FieldValue::List(more) => levels.extend(more),
                    other => levels.push(other),
                }
            }
            FieldValue::List(levels)
        }
        (_, other) => other,
    }
}

/// `a/b/c` becomes `["0-a/", "1-a/b/", "2-a/b/c/"]`.
fn path_to_hierarchy(path: &str) -> FieldValue {
    let segments: Vec<&str> = path
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    FieldValue::List(
        (0..segments.len())
            .map(|depth| {
                FieldValue::String(format!("{}-{}/", depth, segments[..=depth].join("/")))
            })
            .collect(),
    )
}

/// Evaluates field mappings against records.
pub struct FieldResolver {
    renderer: Arc<dyn ContentRenderer>,
    detectors: Vec<Arc<dyn SerializedValueDetector>>,
}

impl FieldResolver {
    pub fn new(renderer: Arc<dyn ContentRenderer>) -> Self {
        Self {
            renderer,
            detectors: Vec::new(),
        }
    }

    /// Register a detector for serialized output of additional computed kinds.
    pub fn with_detector(mut self, detector: Arc<dyn SerializedValueDetector>) -> Self {
        self.detectors.push(detector);
        self
    }

    /// Resolve every mapped field of `spec` against `record`.
    ///
    /// Fields resolving to nothing or to an empty value are left out.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<(String, FieldValue)>)` - Field values in mapping order
    /// * `Err(IndexerError::InvalidFieldName)` - The mapping targets `type`
    pub async fn resolve(
        &self,
        spec: &FieldMappingSpec,
        record: &Record,
        context: &RenderContext,
    ) -> Result<Vec<(String, FieldValue)>, IndexerError> {
        spec.validate()?;

        let mut fields = Vec::with_capacity(spec.len());
        for mapping in spec.iter() {
            if let Some(value) = self.resolve_field(mapping, record, context).await? {
                fields.push((mapping.name.clone(), value));
            }
        }
        Ok(fields)
    }

    /// Resolve a single mapped field.
    pub async fn resolve_field(
        &self,
        mapping: &FieldMapping,
        record: &Record,
        context: &RenderContext,
    ) -> Result<Option<FieldValue>, IndexerError> {
        if mapping.name == FIELD_TYPE {
            return Err(IndexerError::InvalidFieldName(mapping.name.clone()));
        }

        let value = match &mapping.source {
            FieldSource::Literal { path } => {
                record.get(path).and_then(|v| coerce(v, mapping.field_type))
            }
            FieldSource::Computed { .. } | FieldSource::Relation(_) => {
                match self.renderer.render(mapping, record, context).await? {
                    None => None,
                    Some(rendered) if self.is_serialized(mapping, &rendered) => {
                        Self::deserialize(&rendered, mapping.field_type)
                    }
                    Some(rendered) => coerce(&Value::String(rendered), mapping.field_type),
                }
            }
        };

        let value = value.map(|value| {
            mapping
                .processing
                .iter()
                .fold(value, |value, instruction| apply(*instruction, value))
        });

        trace!(field = %mapping.name, value = ?value, "Resolved field");
        Ok(value.filter(|value| !value.is_empty()))
    }

    fn is_serialized(&self, mapping: &FieldMapping, rendered: &str) -> bool {
        mapping.produces_list()
            || self
                .detectors
                .iter()
                .any(|detector| detector.is_serialized(mapping, rendered))
    }

    /// Expand a serialized JSON list; anything else stays a single value.
    fn deserialize(rendered: &str, field_type: FieldType) -> Option<FieldValue> {
        match serde_json::from_str::<Value>(rendered) {
            Ok(list @ Value::Array(_)) => coerce(&list, field_type),
            _ => coerce(&Value::String(rendered.to_string()), field_type),
        }
    }
}
