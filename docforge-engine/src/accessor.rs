use docforge_model::{Document, IDENTITY_FIELD, SchemaDocument};
use serde_json::Value;

/// Reads one field of one entity type from a stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAccessor {
    entity_type: String,
    field: String,
}

impl FieldAccessor {
    pub fn new(entity_type: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            field: field.into(),
        }
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Null when the record is absent or lacks the field.
    pub fn read(&self, record: Option<&Document>) -> Value {
        record
            .and_then(|record| record.get(&self.field))
            .cloned()
            .unwrap_or(Value::Null)
    }
}

/// One accessor per field of every entity type, in declaration order. An
/// entity without a declared `_id` gets an accessor for the implicit one first.
pub fn generate_accessors(document: &SchemaDocument) -> Vec<FieldAccessor> {
    document
        .entities()
        .flat_map(|entity| {
            let implicit = entity
                .field(IDENTITY_FIELD)
                .is_none()
                .then_some(IDENTITY_FIELD);
            implicit
                .into_iter()
                .chain(entity.fields.iter().map(|field| field.name.as_str()))
                .map(|field| FieldAccessor::new(entity.name.clone(), field))
                .collect::<Vec<_>>()
        })
        .collect()
}
