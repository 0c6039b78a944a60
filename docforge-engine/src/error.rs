//! Error types for schema compilation and handler execution.

use docforge_model::ValidationError;
use docforge_storage::StorageError;
use thiserror::Error;

/// Result type for generation-time operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for handler execution.
pub type EngineResult<T> = Result<T, EngineError>;

/// Fatal errors raised while compiling a schema. Never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// The schema text is not well-formed.
    #[error("schema parse error: {0}")]
    Parse(String),

    /// Two definitions share a name.
    #[error("duplicate type definition: {0}")]
    DuplicateType(String),

    /// A definition kind the compiler does not handle.
    #[error("unsupported {kind} definition: {name}")]
    Unsupported { kind: String, name: String },

    /// An entity field whose type has no storage mapping.
    #[error("{entity}.{field}: no storage type for `{ty}`")]
    UnmappedFieldType {
        entity: String,
        field: String,
        ty: String,
    },

    /// A `Query`/`Mutation` field that does not name a known operation.
    #[error("cannot bind operation `{resolver}`: {reason}")]
    UnmatchedOperation { resolver: String, reason: String },

    /// A comparison input declares an operator outside the allow-list.
    #[error("input `{input}` declares unsupported comparison operator `{operator}`")]
    UnsupportedOperator { input: String, operator: String },

    /// The authorization annotation cannot be applied to a type.
    #[error("invalid authorization annotation on `{entity}`: {reason}")]
    InvalidAuthDirective { entity: String, reason: String },

    /// The GraphQL executor rejected the assembled schema.
    #[error("schema assembly failed: {0}")]
    Build(String),
}

/// Per-request failures surfaced by a handler.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The record did not fit the entity's storage schema. Nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The storage collaborator failed. Not retried.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// No storage schema exists for the entity type.
    #[error("unknown entity type: {0}")]
    UnknownEntity(String),

    /// No handler is bound under the resolver name.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// A declared argument was not supplied.
    #[error("{resolver}: missing argument `{argument}`")]
    MissingArgument { resolver: String, argument: String },

    /// An argument has the wrong shape.
    #[error("{resolver}: argument `{argument}` must be an object")]
    InvalidArgument { resolver: String, argument: String },
}
