//! Core schema and document model for docforge.
//!
//! Defines the universal types that the storage layer, the schema compiler
//! and the HTTP surface all depend on:
//! - [`SchemaDocument`] / [`TypeDefinition`] / [`FieldDefinition`]: the parsed interface description
//! - [`TypeReference`]: a declared field type with its non-null and list modifiers
//! - [`Document`] / [`Filter`]: stored records and storage filter expressions (JSON objects)
//! - [`StorageSchema`]: the per-entity field-to-storage-type mapping used to validate records
//! - [`IdentityContext`]: the subject resolved for a single request
//!
//! These types carry no behavior tied to a particular storage engine or
//! transport. They form the contract between the compiler and its collaborators.

mod definition;
mod document;
mod error;
mod identity;
mod schema;

pub use definition::{
    ArgumentDefinition, DefinitionKind, Directive, FieldDefinition, MUTATION_TYPE, QUERY_TYPE,
    SchemaDocument, TypeDefinition, TypeReference,
};
pub use document::{Document, Filter, IDENTITY_FIELD, document_id, generate_id};
pub use error::{ValidationError, ValidationResult};
pub use identity::IdentityContext;
pub use schema::{DefaultValue, StorageField, StorageSchema, StorageType};
