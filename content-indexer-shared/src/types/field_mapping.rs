//! Declarative field mappings from raw records to document fields.
//!
//! Mappings arrive from the configuration tree in a flat key/value form:
//!
//! ```text
//! title = header
//! keywords_stringM = SOLR_MULTIVALUE
//! keywords_stringM. { field = keywords, separator = , }
//! category_stringM = SOLR_RELATION
//! category_stringM. { localField = categories, multiValue = 1 }
//! ```
//!
//! [`FieldMappingSpec::from_config`] turns that form into typed entries once,
//! at load time, so indexing never parses field names again.

use serde_json::{Map, Value};

use crate::errors::ModelError;
use crate::types::document::FIELD_TYPE;

/// Declared value type of a mapped field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    Date,
}

impl FieldType {
    /// Parse an explicit type code such as `int` or `float`.
    pub fn from_type_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "string" | "str" | "text" => Some(Self::String),
            "int" | "integer" | "long" | "tint" | "tlong" => Some(Self::Int),
            "float" | "double" | "tfloat" | "tdouble" => Some(Self::Float),
            "bool" | "boolean" => Some(Self::Bool),
            "date" | "tdate" => Some(Self::Date),
            _ => None,
        }
    }

    /// Derive the type from a dynamic field name suffix (`_intS`, `_floatM`, ...).
    ///
    /// Names without a recognised suffix are strings.
    pub fn from_field_name(name: &str) -> Self {
        name.rsplit_once('_')
            .and_then(|(_, suffix)| {
                let code = suffix
                    .strip_suffix('S')
                    .or_else(|| suffix.strip_suffix('M'))?;
                Self::from_type_code(code)
            })
            .unwrap_or_default()
    }
}

/// Kind of computed value delegated to the content renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputedKind {
    /// Cleaned full-text content of a record field.
    Content,
    /// A separated string turned into a list.
    Multivalue,
    /// Labels of related records.
    Relation,
    /// A static or wrapped text value.
    Text,
    /// Any other content object understood by the host renderer.
    Other(String),
}

impl ComputedKind {
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "SOLR_CONTENT" => Self::Content,
            "SOLR_MULTIVALUE" => Self::Multivalue,
            "SOLR_RELATION" => Self::Relation,
            "TEXT" => Self::Text,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Content => "SOLR_CONTENT",
            Self::Multivalue => "SOLR_MULTIVALUE",
            Self::Relation => "SOLR_RELATION",
            Self::Text => "TEXT",
            Self::Other(name) => name,
        }
    }
}

/// Foreign-key resolution for a related-records field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    /// Local column holding the related uids.
    pub local_field: String,
    pub foreign_table: Option<String>,
    /// Column of the related record used as label.
    pub foreign_label_field: Option<String>,
    /// Produce a list instead of a joined string.
    pub multi_value: bool,
}

impl RelationDescriptor {
    fn from_config(field_name: &str, config: &Map<String, Value>) -> Self {
        Self {
            local_field: config_string(config, "localField")
                .unwrap_or_else(|| field_name.to_string()),
            foreign_table: config_string(config, "foreignTable"),
            foreign_label_field: config_string(config, "foreignLabelField"),
            multi_value: config_flag(config, "multiValue"),
        }
    }
}

/// Post-coercion transformation of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingInstruction {
    Lowercase,
    Uppercase,
    /// Unix timestamp to ISO-8601 UTC date.
    TimestampToIsoDate,
    /// `a/b/c` to `["0-a/", "1-a/b/", "2-a/b/c/"]`.
    PathToHierarchy,
}

impl ProcessingInstruction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "lowercase" => Some(Self::Lowercase),
            "uppercase" => Some(Self::Uppercase),
            "timestampToIsoDate" => Some(Self::TimestampToIsoDate),
            "pathToHierarchy" => Some(Self::PathToHierarchy),
            _ => None,
        }
    }
}

/// Where a field's value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSource {
    /// Read a record column.
    Literal { path: String },
    /// Ask the content renderer to compute a value.
    Computed {
        kind: ComputedKind,
        config: Map<String, Value>,
    },
    /// Resolve related records.
    Relation(RelationDescriptor),
}

/// One mapped document field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    pub name: String,
    pub field_type: FieldType,
    pub source: FieldSource,
    pub processing: Vec<ProcessingInstruction>,
}

impl FieldMapping {
    /// Map a record column, typing the field from its name.
    pub fn literal(name: impl Into<String>, path: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            field_type: FieldType::from_field_name(&name),
            source: FieldSource::Literal { path: path.into() },
            name,
            processing: Vec::new(),
        }
    }

    /// Map a computed value.
    pub fn computed(name: impl Into<String>, kind: ComputedKind, config: Map<String, Value>) -> Self {
        let name = name.into();
        Self {
            field_type: FieldType::from_field_name(&name),
            source: FieldSource::Computed { kind, config },
            name,
            processing: Vec::new(),
        }
    }

    /// Map related records.
    pub fn relation(name: impl Into<String>, relation: RelationDescriptor) -> Self {
        let name = name.into();
        Self {
            field_type: FieldType::from_field_name(&name),
            source: FieldSource::Relation(relation),
            name,
            processing: Vec::new(),
        }
    }

    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    pub fn with_processing(mut self, instruction: ProcessingInstruction) -> Self {
        self.processing.push(instruction);
        self
    }

    /// Whether rendered output is a serialized list by construction.
    pub fn produces_list(&self) -> bool {
        match &self.source {
            FieldSource::Literal { .. } => false,
            FieldSource::Computed { kind, .. } => *kind == ComputedKind::Multivalue,
            FieldSource::Relation(relation) => relation.multi_value,
        }
    }
}

/// Ordered set of field mappings for one indexing configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMappingSpec {
    fields: Vec<FieldMapping>,
}

impl FieldMappingSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with_field(mut self, mapping: FieldMapping) -> Self {
        self.fields.push(mapping);
        self
    }

    pub fn push(&mut self, mapping: FieldMapping) {
        self.fields.push(mapping);
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldMapping> {
        self.fields.iter()
    }

    pub fn get(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Reject mappings that would overwrite protected document fields.
    pub fn validate(&self) -> Result<(), ModelError> {
        match self.fields.iter().find(|f| f.name == FIELD_TYPE) {
            Some(field) => Err(ModelError::InvalidFieldName(field.name.clone())),
            None => Ok(()),
        }
    }

    /// Load a mapping from its flat configuration-tree form.
    ///
    /// Entries keep the order in which the configuration lists them.
    pub fn from_config(config: &Map<String, Value>) -> Result<Self, ModelError> {
        let mut spec = Self::new();

        for (name, value) in config {
            if name.ends_with('.') {
                continue;
            }
            if name == FIELD_TYPE {
                return Err(ModelError::InvalidFieldName(name.clone()));
            }

            let target = value.as_str().ok_or_else(|| {
                ModelError::invalid_field_mapping(format!(
                    "field '{}' must map to a string, got {}",
                    name, value
                ))
            })?;
            let options = config.get(&format!("{}.", name)).and_then(Value::as_object);

            let mut mapping = match options {
                Some(options) if is_content_object_name(target) => {
                    match ComputedKind::from_name(target) {
                        ComputedKind::Relation => FieldMapping::relation(
                            name.clone(),
                            RelationDescriptor::from_config(name, options),
                        ),
                        kind => FieldMapping::computed(name.clone(), kind, options.clone()),
                    }
                }
                _ if is_content_object_name(target) => {
                    FieldMapping::computed(name.clone(), ComputedKind::from_name(target), Map::new())
                }
                _ => FieldMapping::literal(name.clone(), target),
            };

            if let Some(options) = options {
                if let Some(code) = config_string(options, "type") {
                    mapping.field_type = FieldType::from_type_code(&code).ok_or_else(|| {
                        ModelError::invalid_field_mapping(format!(
                            "field '{}' declares unknown type '{}'",
                            name, code
                        ))
                    })?;
                }
                if let Some(instructions) = config_string(options, "processing") {
                    for instruction in instructions.split(',').filter(|s| !s.trim().is_empty()) {
                        let parsed = ProcessingInstruction::from_name(instruction).ok_or_else(|| {
                            ModelError::invalid_field_mapping(format!(
                                "field '{}' uses unknown processing instruction '{}'",
                                name,
                                instruction.trim()
                            ))
                        })?;
                        mapping.processing.push(parsed);
                    }
                }
            }

            spec.push(mapping);
        }

        Ok(spec)
    }
}

/// Content object names are upper-case identifiers (`TEXT`, `SOLR_RELATION`).
fn is_content_object_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        && value.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

fn config_string(config: &Map<String, Value>, key: &str) -> Option<String> {
    match config.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn config_flag(config: &Map<String, Value>, key: &str) -> bool {
    match config.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|v| v != 0),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true"),
        _ => false,
    }
}
