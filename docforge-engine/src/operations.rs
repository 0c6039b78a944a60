//! The operation table: every `Query`/`Mutation` field resolved to a target
//! entity and an operation kind at generation time.

use std::collections::BTreeMap;
use std::fmt;

use docforge_model::{
    ArgumentDefinition, DefinitionKind, FieldDefinition, IDENTITY_FIELD, SchemaDocument,
    TypeDefinition, TypeReference,
};
use tracing::debug;

use crate::filter::is_supported_operator;
use crate::{SchemaError, SchemaResult};

/// What a bound handler does against its entity's collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    FindOne,
    FindMany,
    Create,
    Update,
    Delete,
}

impl OperationKind {
    /// Read operations live under `Query`, writes under `Mutation`.
    pub fn is_query(self) -> bool {
        matches!(self, Self::FindOne | Self::FindMany)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FindOne => "find-one",
            Self::FindMany => "find-many",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    fn from_mutation_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Number of declared arguments the kind consumes, if fixed.
    fn arity(self) -> Option<usize> {
        match self {
            Self::FindOne | Self::FindMany => None,
            Self::Create | Self::Delete => Some(1),
            Self::Update => Some(2),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resolved `Query` or `Mutation` field.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Field name, `<Type>_<operation>`.
    pub resolver: String,
    /// Target entity type.
    pub model: String,
    pub kind: OperationKind,
    pub arguments: Vec<ArgumentDefinition>,
    pub return_type: TypeReference,
}

impl Operation {
    /// The identifier argument of an update or delete.
    pub fn id_argument(&self) -> Option<&ArgumentDefinition> {
        match self.kind {
            OperationKind::Update | OperationKind::Delete => self.arguments.first(),
            _ => None,
        }
    }

    /// The record payload of a create, or the patch of an update.
    pub fn payload_argument(&self) -> Option<&ArgumentDefinition> {
        match self.kind {
            OperationKind::Create => self.arguments.first(),
            OperationKind::Update => self.arguments.get(1),
            _ => None,
        }
    }
}

/// Splits `Person_findByAge` into `("Person", "findByAge")`.
pub fn split_resolver_name(resolver: &str) -> Option<(&str, &str)> {
    resolver
        .split_once('_')
        .filter(|(model, operation)| !model.is_empty() && !operation.is_empty())
}

/// All operations of a schema, keyed by resolver name.
#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    operations: BTreeMap<String, Operation>,
}

impl OperationTable {
    /// Resolves every field of `Query` and `Mutation`.
    ///
    /// A field that cannot be mapped to an entity and operation kind fails
    /// the whole schema.
    pub fn from_schema(document: &SchemaDocument) -> SchemaResult<Self> {
        let mut operations = BTreeMap::new();

        if let Some(query) = document.query() {
            for field in &query.fields {
                let operation = resolve_query(field, document)?;
                debug!(resolver = %operation.resolver, model = %operation.model, kind = %operation.kind, "bound query");
                operations.insert(operation.resolver.clone(), operation);
            }
        }

        if let Some(mutation) = document.mutation() {
            for field in &mutation.fields {
                let operation = resolve_mutation(field, document)?;
                debug!(resolver = %operation.resolver, model = %operation.model, kind = %operation.kind, "bound mutation");
                operations.insert(operation.resolver.clone(), operation);
            }
        }

        Ok(Self { operations })
    }

    pub fn get(&self, resolver: &str) -> Option<&Operation> {
        self.operations.get(resolver)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl IntoIterator for OperationTable {
    type Item = Operation;
    type IntoIter = std::collections::btree_map::IntoValues<String, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_values()
    }
}

fn unmatched(resolver: &str, reason: impl Into<String>) -> SchemaError {
    SchemaError::UnmatchedOperation {
        resolver: resolver.to_string(),
        reason: reason.into(),
    }
}

/// Finds the entity named by the resolver prefix.
fn target_entity<'a>(
    field: &FieldDefinition,
    document: &'a SchemaDocument,
) -> SchemaResult<(&'a TypeDefinition, String)> {
    let (model, suffix) = split_resolver_name(&field.name)
        .ok_or_else(|| unmatched(&field.name, "name must have the form `<Type>_<operation>`"))?;
    let entity = document
        .get(model)
        .filter(|ty| ty.is_entity())
        .ok_or_else(|| unmatched(&field.name, format!("`{model}` is not an entity type")))?;
    Ok((entity, suffix.to_string()))
}

fn resolve_query(field: &FieldDefinition, document: &SchemaDocument) -> SchemaResult<Operation> {
    let (entity, _) = target_entity(field, document)?;

    let kind = if names_model(field.ty.nullable(), &entity.name) {
        OperationKind::FindOne
    } else if field
        .ty
        .list_item()
        .is_some_and(|item| names_model(item.nullable(), &entity.name))
    {
        OperationKind::FindMany
    } else {
        return Err(unmatched(
            &field.name,
            format!(
                "return type `{}` is neither `{}` nor a list of it",
                field.ty, entity.name
            ),
        ));
    };

    for argument in &field.arguments {
        if argument.name != IDENTITY_FIELD && entity.field(&argument.name).is_none() {
            return Err(unmatched(
                &field.name,
                format!("argument `{}` is not a field of `{}`", argument.name, entity.name),
            ));
        }
        check_comparison_input(&argument.ty, document)?;
    }

    Ok(operation(field, entity, kind))
}

fn resolve_mutation(field: &FieldDefinition, document: &SchemaDocument) -> SchemaResult<Operation> {
    let (entity, suffix) = target_entity(field, document)?;

    let kind = OperationKind::from_mutation_suffix(&suffix).ok_or_else(|| {
        unmatched(
            &field.name,
            format!("unknown mutation `{suffix}`, expected create, update or delete"),
        )
    })?;

    if let Some(arity) = kind.arity().filter(|&arity| arity != field.arguments.len()) {
        return Err(unmatched(
            &field.name,
            format!(
                "{kind} takes {arity} argument(s), found {}",
                field.arguments.len()
            ),
        ));
    }

    if !names_model(field.ty.nullable(), &entity.name) {
        return Err(unmatched(
            &field.name,
            format!("return type `{}` must be `{}`", field.ty, entity.name),
        ));
    }

    let operation = operation(field, entity, kind);
    if let Some(payload) = operation.payload_argument() {
        let is_input = matches!(payload.ty.nullable(), TypeReference::Named(_))
            && document
                .get(payload.ty.base_name())
                .is_some_and(|ty| ty.kind == DefinitionKind::Input);
        if !is_input {
            return Err(unmatched(
                &field.name,
                format!("argument `{}` must be an input type", payload.name),
            ));
        }
    }

    Ok(operation)
}

fn operation(field: &FieldDefinition, entity: &TypeDefinition, kind: OperationKind) -> Operation {
    Operation {
        resolver: field.name.clone(),
        model: entity.name.clone(),
        kind,
        arguments: field.arguments.clone(),
        return_type: field.ty.clone(),
    }
}

fn names_model(ty: &TypeReference, model: &str) -> bool {
    matches!(ty, TypeReference::Named(name) if name == model)
}

/// An input type used as a query argument is a comparison object: every one
/// of its fields must be a supported operator.
fn check_comparison_input(ty: &TypeReference, document: &SchemaDocument) -> SchemaResult<()> {
    let Some(input) = document
        .get(ty.base_name())
        .filter(|def| def.kind == DefinitionKind::Input)
    else {
        return Ok(());
    };

    match input
        .fields
        .iter()
        .find(|field| !is_supported_operator(&field.name))
    {
        Some(field) => Err(SchemaError::UnsupportedOperator {
            input: input.name.clone(),
            operator: field.name.clone(),
        }),
        None => Ok(()),
    }
}
