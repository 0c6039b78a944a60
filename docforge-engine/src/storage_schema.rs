//! Derives storage record schemas from entity type definitions.

use std::collections::BTreeMap;

use docforge_model::{
    DefaultValue, IDENTITY_FIELD, SchemaDocument, StorageField, StorageSchema, StorageType,
    TypeDefinition, TypeReference,
};
use tracing::debug;

use crate::{SchemaError, SchemaResult};

/// Builds one storage schema per entity type, keyed by type name.
pub fn synthesize_storage_schemas(
    document: &SchemaDocument,
) -> SchemaResult<BTreeMap<String, StorageSchema>> {
    document
        .entities()
        .map(|entity| {
            let schema = synthesize_storage_schema(entity, document)?;
            Ok::<_, SchemaError>((entity.name.clone(), schema))
        })
        .collect()
}

/// Builds the storage schema of a single entity type.
///
/// Required follows the outer non-null modifier. An `_id: ID` field gets a
/// generated default; an entity that declares no `_id` gets one implicitly.
pub fn synthesize_storage_schema(
    entity: &TypeDefinition,
    document: &SchemaDocument,
) -> SchemaResult<StorageSchema> {
    let mut schema = StorageSchema::new(entity.name.clone());

    if entity.field(IDENTITY_FIELD).is_none() {
        schema = schema.with_field(
            StorageField::new(IDENTITY_FIELD, StorageType::ObjectId, true)
                .with_default(DefaultValue::GeneratedId),
        );
    }

    for field in &entity.fields {
        let storage_type =
            storage_type_for(&field.ty, document).ok_or_else(|| SchemaError::UnmappedFieldType {
                entity: entity.name.clone(),
                field: field.name.clone(),
                ty: field.ty.to_string(),
            })?;

        let mut storage_field =
            StorageField::new(field.name.clone(), storage_type, field.ty.is_non_null());
        if field.name == IDENTITY_FIELD && storage_field.storage_type == StorageType::ObjectId {
            storage_field = storage_field.with_default(DefaultValue::GeneratedId);
        }
        schema = schema.with_field(storage_field);
    }

    debug!(entity = %entity.name, fields = schema.fields.len(), "synthesized storage schema");
    Ok(schema)
}

/// Maps a declared type to its storage type, or `None` when nothing fits.
pub fn storage_type_for(ty: &TypeReference, document: &SchemaDocument) -> Option<StorageType> {
    match ty {
        TypeReference::NonNull(inner) => storage_type_for(inner, document),
        TypeReference::List(item) => {
            storage_type_for(item, document).map(|item| StorageType::Array(Box::new(item)))
        }
        TypeReference::Named(name) => scalar_storage_type(name, document),
    }
}

fn scalar_storage_type(name: &str, document: &SchemaDocument) -> Option<StorageType> {
    match name {
        "Float" | "Int" => Some(StorageType::Number),
        "Scalar" => Some(StorageType::Mixed),
        "ID" => Some(StorageType::ObjectId),
        "String" => Some(StorageType::String),
        "Boolean" => Some(StorageType::Boolean),
        other if document.is_custom_scalar(other) => Some(StorageType::Mixed),
        other if document.is_enum(other) => Some(StorageType::String),
        _ => None,
    }
}
