//! Handler synthesis: one bound closure per operation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::FieldValue;
use docforge_model::{ArgumentDefinition, Document, Filter, IdentityContext, StorageSchema};
use docforge_storage::DocumentStore;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;

use crate::access::AccessRegistry;
use crate::filter::{identity_filter, merge_constraints, translate_filter};
use crate::operations::{Operation, OperationKind};
use crate::{EngineError, EngineResult};

/// What a handler hands back to the GraphQL layer.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutput {
    /// A single record, or `None` when nothing matched.
    Record(Option<Document>),
    Records(Vec<Document>),
}

impl HandlerOutput {
    /// The record, if the handler returned exactly one.
    pub fn record(&self) -> Option<&Document> {
        match self {
            Self::Record(record) => record.as_ref(),
            Self::Records(_) => None,
        }
    }

    /// All returned records; a single miss is empty.
    pub fn into_records(self) -> Vec<Document> {
        match self {
            Self::Record(record) => record.into_iter().collect(),
            Self::Records(records) => records,
        }
    }

    /// Records become opaque parent values that field accessors read from.
    pub fn into_field_value<'a>(self) -> Option<FieldValue<'a>> {
        match self {
            Self::Record(record) => record.map(FieldValue::owned_any),
            Self::Records(records) => Some(FieldValue::list(
                records.into_iter().map(FieldValue::owned_any),
            )),
        }
    }
}

/// Everything a handler captures at generation time.
#[derive(Clone)]
pub struct HandlerContext {
    pub store: Arc<dyn DocumentStore>,
    pub access: Arc<AccessRegistry>,
    pub schemas: Arc<BTreeMap<String, StorageSchema>>,
}

type HandlerFn = dyn Fn(Document, IdentityContext) -> BoxFuture<'static, EngineResult<HandlerOutput>>
    + Send
    + Sync;

/// An operation bound to its handler closure. Immutable once built.
#[derive(Clone)]
pub struct HandlerBinding {
    operation: Arc<Operation>,
    run: Arc<HandlerFn>,
}

impl HandlerBinding {
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn resolver(&self) -> &str {
        &self.operation.resolver
    }

    /// Runs the handler with already-decoded arguments.
    pub async fn invoke(
        &self,
        arguments: Document,
        identity: IdentityContext,
    ) -> EngineResult<HandlerOutput> {
        (self.run)(arguments, identity).await
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("resolver", &self.operation.resolver)
            .field("model", &self.operation.model)
            .field("kind", &self.operation.kind)
            .finish()
    }
}

/// Binds an operation to a closure over the store, the access registry and
/// the storage schemas.
pub fn bind(operation: Operation, context: &HandlerContext) -> HandlerBinding {
    let operation = Arc::new(operation);
    let bound = Arc::clone(&operation);
    let context = context.clone();

    let run: Arc<HandlerFn> = Arc::new(move |arguments: Document, identity: IdentityContext| {
        let operation = Arc::clone(&bound);
        let context = context.clone();
        async move { execute(&operation, &context, arguments, identity).await }.boxed()
    });

    HandlerBinding { operation, run }
}

async fn execute(
    operation: &Operation,
    context: &HandlerContext,
    arguments: Document,
    identity: IdentityContext,
) -> EngineResult<HandlerOutput> {
    let model = operation.model.as_str();
    match operation.kind {
        OperationKind::FindOne => {
            let filter = query_filter(model, context, arguments, &identity);
            let record = context.store.find_one(model, &filter).await?;
            Ok(HandlerOutput::Record(record))
        }
        OperationKind::FindMany => {
            let filter = query_filter(model, context, arguments, &identity);
            let records = context.store.find(model, &filter).await?;
            Ok(HandlerOutput::Records(records))
        }
        OperationKind::Create => {
            let payload = object_argument(operation, operation.payload_argument(), &arguments)?;
            let record = storage_schema(context, model)?.prepare_insert(payload)?;
            // Known gap: ownership is whatever the payload says. The access
            // hook is not consulted on create.
            if context.access.is_protected(model) {
                debug!(resolver = %operation.resolver, "create bypasses access hook");
            }
            let created = context.store.create(model, record).await?;
            Ok(HandlerOutput::Record(Some(created)))
        }
        OperationKind::Update => {
            let id = required_argument(operation, &arguments)?;
            let patch = object_argument(operation, operation.payload_argument(), &arguments)?;
            storage_schema(context, model)?.validate_patch(&patch)?;
            let filter = merge_constraints(
                identity_filter(id),
                context.access.constraints_for(model, &identity),
            );
            let updated = context
                .store
                .find_one_and_update(model, &filter, patch)
                .await?;
            Ok(HandlerOutput::Record(updated))
        }
        OperationKind::Delete => {
            let id = required_argument(operation, &arguments)?;
            let filter = merge_constraints(
                identity_filter(id),
                context.access.constraints_for(model, &identity),
            );
            let deleted = context.store.delete_one(model, &filter).await?;
            Ok(HandlerOutput::Record(deleted))
        }
    }
}

/// Query arguments plus the access constraints. A null argument is treated as
/// absent, which is how an unset optional variable arrives.
fn query_filter(
    model: &str,
    context: &HandlerContext,
    arguments: Document,
    identity: &IdentityContext,
) -> Filter {
    let supplied: Document = arguments
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect();
    merge_constraints(
        translate_filter(&supplied),
        context.access.constraints_for(model, identity),
    )
}

fn storage_schema<'a>(context: &'a HandlerContext, model: &str) -> EngineResult<&'a StorageSchema> {
    context
        .schemas
        .get(model)
        .ok_or_else(|| EngineError::UnknownEntity(model.to_string()))
}

/// The identifier of an update or delete.
fn required_argument(operation: &Operation, arguments: &Document) -> EngineResult<Value> {
    let name = operation
        .id_argument()
        .map(|argument| argument.name.as_str())
        .unwrap_or_default();
    arguments
        .get(name)
        .filter(|value| !value.is_null())
        .cloned()
        .ok_or_else(|| EngineError::MissingArgument {
            resolver: operation.resolver.clone(),
            argument: name.to_string(),
        })
}

fn object_argument(
    operation: &Operation,
    argument: Option<&ArgumentDefinition>,
    arguments: &Document,
) -> EngineResult<Document> {
    let name = argument.map(|a| a.name.as_str()).unwrap_or_default();
    match arguments.get(name) {
        Some(Value::Object(object)) => Ok(object.clone()),
        None | Some(Value::Null) => Err(EngineError::MissingArgument {
            resolver: operation.resolver.clone(),
            argument: name.to_string(),
        }),
        Some(_) => Err(EngineError::InvalidArgument {
            resolver: operation.resolver.clone(),
            argument: name.to_string(),
        }),
    }
}
