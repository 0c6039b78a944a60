//! Per-type access-control hooks.
//!
//! Every entity type starts with an unrestricted hook. A type carrying the
//! authorization annotation has it replaced, once, at schema-processing time
//! by an [`OwnerHook`]. The registry is then frozen behind an `Arc` and only
//! read while serving.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use docforge_model::{
    Filter, IdentityContext, SchemaDocument, StorageType, TypeDefinition, TypeReference,
};
use serde_json::Value;
use tracing::debug;

use crate::storage_schema::storage_type_for;
use crate::{EngineConfig, SchemaError, SchemaResult};

/// Derives mandatory filter constraints from the request identity.
pub trait AccessHook: Send + Sync + fmt::Debug {
    fn constraints(&self, identity: &IdentityContext) -> Filter;

    /// Whether the hook can ever narrow a query.
    fn restricts(&self) -> bool {
        true
    }
}

/// The default hook: adds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unrestricted;

impl AccessHook for Unrestricted {
    fn constraints(&self, _identity: &IdentityContext) -> Filter {
        Filter::new()
    }

    fn restricts(&self) -> bool {
        false
    }
}

/// Restricts records to those owned by the requesting subject.
///
/// Without a subject the owner constraint is `null`, which matches no record
/// because the owner field is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerHook {
    owner_field: String,
}

impl OwnerHook {
    pub fn new(owner_field: impl Into<String>) -> Self {
        Self {
            owner_field: owner_field.into(),
        }
    }

    pub fn owner_field(&self) -> &str {
        &self.owner_field
    }
}

impl AccessHook for OwnerHook {
    fn constraints(&self, identity: &IdentityContext) -> Filter {
        let owner = identity.subject_id().cloned().unwrap_or(Value::Null);
        let mut constraints = Filter::new();
        constraints.insert(self.owner_field.clone(), owner);
        constraints
    }
}

/// Side table from entity type name to its access hook.
#[derive(Debug, Default, Clone)]
pub struct AccessRegistry {
    hooks: HashMap<String, Arc<dyn AccessHook>>,
}

impl AccessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the default hook for every entity, then replaces it for
    /// each entity annotated with the configured directive.
    pub fn from_schema(document: &SchemaDocument, config: &EngineConfig) -> SchemaResult<Self> {
        let mut registry = Self::new();
        for entity in document.entities() {
            registry.install(entity.name.clone(), Arc::new(Unrestricted));
        }

        for ty in &document.types {
            let Some(directive) = ty.directive(&config.auth_directive) else {
                continue;
            };
            if !ty.is_entity() {
                return Err(invalid(ty, "only entity types can be annotated"));
            }

            let owner_field = match directive.argument("ownerField") {
                None => config.default_owner_field.clone(),
                Some(Value::String(field)) => field.clone(),
                Some(_) => return Err(invalid(ty, "`ownerField` must be a string")),
            };
            check_owner_field(ty, &owner_field, document)?;

            debug!(entity = %ty.name, owner_field = %owner_field, "installing owner hook");
            registry.install(ty.name.clone(), Arc::new(OwnerHook::new(owner_field)));
        }

        Ok(registry)
    }

    /// Sets the hook for an entity type, replacing any previous one.
    pub fn install(&mut self, entity_type: impl Into<String>, hook: Arc<dyn AccessHook>) {
        self.hooks.insert(entity_type.into(), hook);
    }

    /// Constraints the entity's hook derives for this identity.
    pub fn constraints_for(&self, entity_type: &str, identity: &IdentityContext) -> Filter {
        self.hooks
            .get(entity_type)
            .map(|hook| hook.constraints(identity))
            .unwrap_or_default()
    }

    /// True when the entity has a restricting hook installed.
    pub fn is_protected(&self, entity_type: &str) -> bool {
        self.hooks
            .get(entity_type)
            .is_some_and(|hook| hook.restricts())
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.hooks.contains_key(entity_type)
    }
}

fn invalid(ty: &TypeDefinition, reason: impl Into<String>) -> SchemaError {
    SchemaError::InvalidAuthDirective {
        entity: ty.name.clone(),
        reason: reason.into(),
    }
}

/// The owner field must exist, be required, and hold a single identifier or string.
fn check_owner_field(
    entity: &TypeDefinition,
    owner_field: &str,
    document: &SchemaDocument,
) -> SchemaResult<()> {
    let field = entity
        .field(owner_field)
        .ok_or_else(|| invalid(entity, format!("owner field `{owner_field}` is not declared")))?;

    if !field.ty.is_non_null() {
        return Err(invalid(
            entity,
            format!("owner field `{owner_field}` must be non-null"),
        ));
    }

    let scalar = matches!(field.ty.nullable(), TypeReference::Named(_));
    match storage_type_for(&field.ty, document) {
        Some(StorageType::ObjectId | StorageType::String) if scalar => Ok(()),
        _ => Err(invalid(
            entity,
            format!("owner field `{owner_field}` must be an ID or String"),
        )),
    }
}
