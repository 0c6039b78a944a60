//! Assembles the executable GraphQL schema from the definitions, the field
//! accessors and the bound handlers.

use std::collections::BTreeMap;

use async_graphql::Name;
use async_graphql::Value as GqlValue;
use async_graphql::dynamic::{
    Enum, EnumItem, Field, FieldFuture, FieldValue, InputObject, InputValue, Object, Scalar,
    Schema, TypeRef,
};
use docforge_model::{
    DefinitionKind, Document, IDENTITY_FIELD, IdentityContext, MUTATION_TYPE, QUERY_TYPE,
    SchemaDocument, TypeDefinition, TypeReference,
};
use serde_json::Value;
use tracing::trace;

use crate::accessor::FieldAccessor;
use crate::handlers::HandlerBinding;
use crate::{SchemaError, SchemaResult};

/// Name of the opaque scalar, available whether or not the source declares it.
const OPAQUE_SCALAR: &str = "Scalar";

/// Builds the dynamic schema. Field resolvers of entity types are the
/// accessors; `Query` and `Mutation` fields run their bound handlers.
pub fn assemble(
    document: &SchemaDocument,
    accessors: &[FieldAccessor],
    bindings: &BTreeMap<String, HandlerBinding>,
) -> SchemaResult<Schema> {
    let has_mutations = document.mutation().is_some_and(|m| !m.fields.is_empty());
    let mut schema = Schema::build(QUERY_TYPE, has_mutations.then_some(MUTATION_TYPE), None);

    for ty in &document.types {
        match &ty.kind {
            DefinitionKind::Object if ty.is_entity() => {
                schema = schema.register(entity_object(ty, accessors, document));
            }
            DefinitionKind::Object => {
                if ty.name == MUTATION_TYPE && !has_mutations {
                    continue;
                }
                schema = schema.register(operation_object(ty, bindings)?);
            }
            DefinitionKind::Input => {
                let input = ty.fields.iter().fold(InputObject::new(&ty.name), |input, field| {
                    input.field(InputValue::new(&field.name, type_ref(&field.ty)))
                });
                schema = schema.register(input);
            }
            DefinitionKind::Scalar => {
                schema = schema.register(Scalar::new(&ty.name));
            }
            DefinitionKind::Enum(values) => {
                let item = values
                    .iter()
                    .fold(Enum::new(&ty.name), |item, value| item.item(EnumItem::new(value)));
                schema = schema.register(item);
            }
        }
    }

    if document.query().is_none() {
        schema = schema.register(Object::new(QUERY_TYPE));
    }
    if document.get(OPAQUE_SCALAR).is_none() && references(document, OPAQUE_SCALAR) {
        schema = schema.register(Scalar::new(OPAQUE_SCALAR));
    }

    schema
        .finish()
        .map_err(|e| SchemaError::Build(e.to_string()))
}

/// Converts a declared type into the executor's type reference.
pub fn type_ref(ty: &TypeReference) -> TypeRef {
    match ty {
        TypeReference::Named(name) => TypeRef::named(name.clone()),
        TypeReference::NonNull(inner) => TypeRef::NonNull(Box::new(type_ref(inner))),
        TypeReference::List(item) => TypeRef::List(Box::new(type_ref(item))),
    }
}

/// Decodes resolver arguments into a document.
pub fn arguments_document<'a>(
    arguments: impl IntoIterator<Item = (&'a Name, &'a GqlValue)>,
) -> serde_json::Result<Document> {
    arguments
        .into_iter()
        .map(|(name, value)| {
            let value = value.clone().into_json()?;
            Ok::<_, serde_json::Error>((name.to_string(), value))
        })
        .collect()
}

fn entity_object(
    entity: &TypeDefinition,
    accessors: &[FieldAccessor],
    document: &SchemaDocument,
) -> Object {
    accessors
        .iter()
        .filter(|accessor| accessor.entity_type() == entity.name)
        .filter_map(|accessor| {
            let ty = match entity.field(accessor.field()) {
                Some(field) => field.ty.clone(),
                // Storage adds `_id` to entities that leave it out.
                None if accessor.field() == IDENTITY_FIELD => {
                    TypeReference::named("ID").non_null()
                }
                None => return None,
            };
            Some((accessor, ty))
        })
        .fold(Object::new(&entity.name), |object, (accessor, ty)| {
            let name = accessor.field().to_string();
            let accessor = accessor.clone();
            let enum_typed = document.is_enum(ty.base_name());
            object.field(Field::new(name, type_ref(&ty), move |ctx| {
                let accessor = accessor.clone();
                FieldFuture::new(async move {
                    let record = ctx.parent_value.downcast_ref::<Document>();
                    let value = output_value(accessor.read(record), enum_typed)?;
                    Ok(Some(FieldValue::value(value)))
                })
            }))
        })
}

fn operation_object(
    namespace: &TypeDefinition,
    bindings: &BTreeMap<String, HandlerBinding>,
) -> SchemaResult<Object> {
    let mut object = Object::new(&namespace.name);
    for field in &namespace.fields {
        let binding = bindings.get(&field.name).cloned().ok_or_else(|| {
            SchemaError::Build(format!("no handler bound for `{}`", field.name))
        })?;
        trace!(resolver = %field.name, "registering operation field");

        let mut operation = Field::new(&field.name, type_ref(&field.ty), move |ctx| {
            let binding = binding.clone();
            FieldFuture::new(async move {
                let arguments = arguments_document(ctx.args.as_index_map())?;
                let identity = ctx
                    .data_opt::<IdentityContext>()
                    .cloned()
                    .unwrap_or_default();
                let output = binding.invoke(arguments, identity).await?;
                Ok(output.into_field_value())
            })
        });
        for argument in &field.arguments {
            operation =
                operation.argument(InputValue::new(&argument.name, type_ref(&argument.ty)));
        }
        object = object.field(operation);
    }
    Ok(object)
}

/// Stored values as executor values. Enum-typed fields hold their value names
/// as strings.
fn output_value(value: Value, enum_typed: bool) -> serde_json::Result<GqlValue> {
    if !enum_typed {
        return GqlValue::from_json(value);
    }
    match value {
        Value::String(name) => Ok(GqlValue::Enum(Name::new(name))),
        Value::Array(items) => items
            .into_iter()
            .map(|item| output_value(item, true))
            .collect::<serde_json::Result<Vec<_>>>()
            .map(GqlValue::List),
        other => GqlValue::from_json(other),
    }
}

fn references(document: &SchemaDocument, name: &str) -> bool {
    document.types.iter().flat_map(|ty| &ty.fields).any(|field| {
        field.ty.base_name() == name
            || field
                .arguments
                .iter()
                .any(|argument| argument.ty.base_name() == name)
    })
}
