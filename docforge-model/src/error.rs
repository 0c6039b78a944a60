//! Error types for record validation.

use thiserror::Error;

use crate::StorageType;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// A record did not fit its entity's storage schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field was omitted or null.
    #[error("{entity_type} validation failed: `{field}` is required")]
    MissingField { entity_type: String, field: String },

    /// The record names a field the schema does not declare.
    #[error("{entity_type} validation failed: unknown field `{field}`")]
    UnknownField { entity_type: String, field: String },

    /// The value's shape does not fit the field's storage type.
    #[error("{entity_type} validation failed: `{field}` expects {expected}, got {found}")]
    TypeMismatch {
        entity_type: String,
        field: String,
        expected: StorageType,
        found: String,
    },

    /// The field cannot be changed after creation.
    #[error("{entity_type} validation failed: `{field}` cannot be updated")]
    ImmutableField { entity_type: String, field: String },
}
