//! Lowers GraphQL SDL into the docforge definition model.

use async_graphql::parser::parse_schema as parse_sdl;
use async_graphql::parser::types::{
    BaseType, ConstDirective, FieldDefinition as SdlField, InputValueDefinition, Type,
    TypeDefinition as SdlType, TypeKind, TypeSystemDefinition,
};
use docforge_model::{
    ArgumentDefinition, DefinitionKind, Directive, FieldDefinition, SchemaDocument, TypeDefinition,
    TypeReference,
};
use tracing::trace;

use crate::{SchemaError, SchemaResult};

/// Parses schema source text into an ordered list of type definitions.
///
/// Declaration order of types and fields is preserved. Directive definitions
/// are accepted and dropped; interfaces, unions, `schema` blocks and type
/// extensions are rejected.
pub fn parse_schema(source: &str) -> SchemaResult<SchemaDocument> {
    let sdl = parse_sdl(source).map_err(|e| SchemaError::Parse(e.to_string()))?;

    let mut types: Vec<TypeDefinition> = Vec::new();
    for definition in sdl.definitions {
        match definition {
            TypeSystemDefinition::Type(ty) => {
                let lowered = lower_type(ty.node)?;
                if types.iter().any(|existing| existing.name == lowered.name) {
                    return Err(SchemaError::DuplicateType(lowered.name));
                }
                trace!(name = %lowered.name, fields = lowered.fields.len(), "parsed type");
                types.push(lowered);
            }
            TypeSystemDefinition::Directive(_) => {}
            TypeSystemDefinition::Schema(_) => return Err(unsupported("schema", "schema")),
        }
    }

    Ok(SchemaDocument::new(types))
}

fn unsupported(kind: &str, name: impl Into<String>) -> SchemaError {
    SchemaError::Unsupported {
        kind: kind.to_string(),
        name: name.into(),
    }
}

fn lower_type(definition: SdlType) -> SchemaResult<TypeDefinition> {
    let name = definition.name.node.to_string();
    if definition.extend {
        return Err(unsupported("type extension", name));
    }

    let directives = lower_directives(definition.directives.into_iter().map(|d| d.node))?;

    let (kind, fields) = match definition.kind {
        TypeKind::Object(object) => {
            let fields = object
                .fields
                .into_iter()
                .map(|field| lower_field(field.node))
                .collect::<SchemaResult<Vec<_>>>()?;
            (DefinitionKind::Object, fields)
        }
        TypeKind::InputObject(input) => {
            let fields = input
                .fields
                .into_iter()
                .map(|field| lower_input_field(field.node))
                .collect();
            (DefinitionKind::Input, fields)
        }
        TypeKind::Scalar => (DefinitionKind::Scalar, Vec::new()),
        TypeKind::Enum(values) => {
            let values = values
                .values
                .into_iter()
                .map(|value| value.node.value.node.to_string())
                .collect();
            (DefinitionKind::Enum(values), Vec::new())
        }
        TypeKind::Interface(_) => return Err(unsupported("interface", name)),
        TypeKind::Union(_) => return Err(unsupported("union", name)),
    };

    Ok(TypeDefinition {
        name,
        kind,
        fields,
        directives,
    })
}

fn lower_field(field: SdlField) -> SchemaResult<FieldDefinition> {
    Ok(FieldDefinition {
        name: field.name.node.to_string(),
        ty: lower_type_reference(field.ty.node),
        arguments: field
            .arguments
            .into_iter()
            .map(|argument| lower_argument(argument.node))
            .collect(),
        directives: lower_directives(field.directives.into_iter().map(|d| d.node))?,
    })
}

fn lower_argument(argument: InputValueDefinition) -> ArgumentDefinition {
    ArgumentDefinition::new(
        argument.name.node.to_string(),
        lower_type_reference(argument.ty.node),
    )
}

fn lower_input_field(field: InputValueDefinition) -> FieldDefinition {
    FieldDefinition::new(field.name.node.to_string(), lower_type_reference(field.ty.node))
}

fn lower_type_reference(ty: Type) -> TypeReference {
    let base = match ty.base {
        BaseType::Named(name) => TypeReference::Named(name.to_string()),
        BaseType::List(item) => TypeReference::List(Box::new(lower_type_reference(*item))),
    };
    if ty.nullable { base } else { base.non_null() }
}

fn lower_directives(
    directives: impl Iterator<Item = ConstDirective>,
) -> SchemaResult<Vec<Directive>> {
    directives
        .map(|directive| {
            let mut lowered = Directive::new(directive.name.node.to_string());
            for (name, value) in directive.arguments {
                let value = value
                    .node
                    .into_json()
                    .map_err(|e| SchemaError::Parse(e.to_string()))?;
                lowered = lowered.with_argument(name.node.to_string(), value);
            }
            Ok::<_, SchemaError>(lowered)
        })
        .collect()
}
