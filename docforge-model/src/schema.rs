use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Document, IDENTITY_FIELD, ValidationError, ValidationResult, generate_id};

/// How a field is stored in a document collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    /// Any JSON number.
    Number,
    /// Unstructured; any JSON value.
    Mixed,
    /// An opaque identifier, stored as a string.
    ObjectId,
    String,
    Boolean,
    /// A list of values of the inner type.
    Array(Box<StorageType>),
}

impl StorageType {
    /// Whether a non-null `value` fits this storage type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Mixed => true,
            Self::Number => value.is_number(),
            Self::ObjectId | Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Array(item) => value
                .as_array()
                .is_some_and(|values| values.iter().all(|v| v.is_null() || item.accepts(v))),
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "Number"),
            Self::Mixed => write!(f, "Mixed"),
            Self::ObjectId => write!(f, "ObjectId"),
            Self::String => write!(f, "String"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Array(item) => write!(f, "[{item}]"),
        }
    }
}

/// A value filled in at creation time when the field is omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// A freshly generated unique identifier.
    GeneratedId,
}

impl DefaultValue {
    fn produce(self) -> Value {
        match self {
            Self::GeneratedId => Value::String(generate_id()),
        }
    }
}

/// One field of a [`StorageSchema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageField {
    pub name: String,
    pub storage_type: StorageType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
}

impl StorageField {
    pub fn new(name: impl Into<String>, storage_type: StorageType, required: bool) -> Self {
        Self {
            name: name.into(),
            storage_type,
            required,
            default: None,
        }
    }

    /// Installs a creation-time default.
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// The storage record schema of one entity type.
///
/// Fields keep their declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSchema {
    pub entity_type: String,
    pub fields: Vec<StorageField>,
}

impl StorageSchema {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field.
    pub fn with_field(mut self, field: StorageField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&StorageField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Names of the fields that must be present and non-null.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name.as_str())
    }

    /// Fills creation-time defaults and validates a new record.
    ///
    /// Runs before the record reaches storage; a failure means nothing was written.
    pub fn prepare_insert(&self, mut payload: Document) -> ValidationResult<Document> {
        for field in &self.fields {
            let missing = payload.get(&field.name).is_none_or(Value::is_null);
            if let (true, Some(default)) = (missing, field.default) {
                payload.insert(field.name.clone(), default.produce());
            }
        }

        for (name, value) in &payload {
            self.check_value(name, value)?;
        }

        if let Some(missing) = self
            .required_fields()
            .find(|name| payload.get(*name).is_none_or(Value::is_null))
        {
            return Err(ValidationError::MissingField {
                entity_type: self.entity_type.clone(),
                field: missing.to_string(),
            });
        }

        Ok(payload)
    }

    /// Validates a partial update before it is applied.
    pub fn validate_patch(&self, patch: &Document) -> ValidationResult<()> {
        if patch.contains_key(IDENTITY_FIELD) {
            return Err(ValidationError::ImmutableField {
                entity_type: self.entity_type.clone(),
                field: IDENTITY_FIELD.to_string(),
            });
        }
        for (name, value) in patch {
            self.check_value(name, value)?;
            if value.is_null() && self.field(name).is_some_and(|field| field.required) {
                return Err(ValidationError::MissingField {
                    entity_type: self.entity_type.clone(),
                    field: name.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_value(&self, name: &str, value: &Value) -> ValidationResult<()> {
        let field = self
            .field(name)
            .ok_or_else(|| ValidationError::UnknownField {
                entity_type: self.entity_type.clone(),
                field: name.to_string(),
            })?;

        if value.is_null() || field.storage_type.accepts(value) {
            return Ok(());
        }

        Err(ValidationError::TypeMismatch {
            entity_type: self.entity_type.clone(),
            field: name.to_string(),
            expected: field.storage_type.clone(),
            found: json_kind(value).to_string(),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
