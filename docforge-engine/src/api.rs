use std::collections::BTreeMap;
use std::sync::Arc;

use async_graphql::dynamic::Schema;
use async_graphql::{Request, Response};
use docforge_model::{Document, IdentityContext, SchemaDocument, StorageSchema};
use docforge_storage::DocumentStore;
use tracing::{debug, info};

use crate::access::AccessRegistry;
use crate::accessor::{FieldAccessor, generate_accessors};
use crate::graphql::assemble;
use crate::handlers::{HandlerBinding, HandlerContext, HandlerOutput, bind};
use crate::identity::IdentityResolver;
use crate::operations::OperationTable;
use crate::parser::parse_schema;
use crate::storage_schema::synthesize_storage_schemas;
use crate::{EngineConfig, EngineError, EngineResult, SchemaResult};

/// A compiled schema: storage schemas, access hooks and bound handlers,
/// served through one executable GraphQL schema.
///
/// Built once at startup and read-only afterwards.
pub struct GeneratedApi {
    document: SchemaDocument,
    schemas: Arc<BTreeMap<String, StorageSchema>>,
    accessors: Vec<FieldAccessor>,
    access: Arc<AccessRegistry>,
    operations: OperationTable,
    bindings: BTreeMap<String, HandlerBinding>,
    identity: IdentityResolver,
    store: Arc<dyn DocumentStore>,
    schema: Schema,
}

impl GeneratedApi {
    /// Compiles `source` with the default naming conventions.
    pub fn build(source: &str, store: Arc<dyn DocumentStore>) -> SchemaResult<Self> {
        Self::build_with_config(source, store, &EngineConfig::default())
    }

    /// Runs the generation pass: parse, synthesize storage schemas and
    /// accessors, install access hooks, resolve and bind operations, then
    /// assemble the executable schema.
    pub fn build_with_config(
        source: &str,
        store: Arc<dyn DocumentStore>,
        config: &EngineConfig,
    ) -> SchemaResult<Self> {
        let document = parse_schema(source)?;
        let schemas = Arc::new(synthesize_storage_schemas(&document)?);
        let accessors = generate_accessors(&document);
        let access = Arc::new(AccessRegistry::from_schema(&document, config)?);
        let operations = OperationTable::from_schema(&document)?;

        let context = HandlerContext {
            store: Arc::clone(&store),
            access: Arc::clone(&access),
            schemas: Arc::clone(&schemas),
        };
        let bindings: BTreeMap<String, HandlerBinding> = operations
            .iter()
            .map(|operation| {
                let binding = bind(operation.clone(), &context);
                (binding.resolver().to_string(), binding)
            })
            .collect();

        let schema = assemble(&document, &accessors, &bindings)?;

        info!(
            entities = schemas.len(),
            operations = operations.len(),
            "generated API"
        );

        Ok(Self {
            identity: IdentityResolver::new(Arc::clone(&store), config),
            document,
            schemas,
            accessors,
            access,
            operations,
            bindings,
            store,
            schema,
        })
    }

    /// Resolves the credential and executes one GraphQL request.
    pub async fn execute(&self, request: Request, credential: Option<&str>) -> Response {
        let identity = self.identity.resolve(credential).await;
        debug!(authenticated = identity.is_authenticated(), "executing request");
        self.schema.execute(request.data(identity)).await
    }

    /// Runs a bound handler directly, bypassing the GraphQL layer.
    pub async fn invoke(
        &self,
        resolver: &str,
        arguments: Document,
        identity: IdentityContext,
    ) -> EngineResult<HandlerOutput> {
        let binding = self
            .bindings
            .get(resolver)
            .ok_or_else(|| EngineError::UnknownOperation(resolver.to_string()))?;
        binding.invoke(arguments, identity).await
    }

    /// Validates and stores a record of any entity type, whether or not the
    /// schema declares a create mutation for it.
    pub async fn insert(&self, entity_type: &str, record: Document) -> EngineResult<Document> {
        let schema = self
            .schemas
            .get(entity_type)
            .ok_or_else(|| EngineError::UnknownEntity(entity_type.to_string()))?;
        let record = schema.prepare_insert(record)?;
        Ok(self.store.create(entity_type, record).await?)
    }

    pub async fn resolve_identity(&self, credential: Option<&str>) -> IdentityContext {
        self.identity.resolve(credential).await
    }

    pub fn document(&self) -> &SchemaDocument {
        &self.document
    }

    pub fn storage_schema(&self, entity_type: &str) -> Option<&StorageSchema> {
        self.schemas.get(entity_type)
    }

    pub fn accessors(&self) -> &[FieldAccessor] {
        &self.accessors
    }

    pub fn access(&self) -> &AccessRegistry {
        &self.access
    }

    pub fn operations(&self) -> &OperationTable {
        &self.operations
    }

    pub fn binding(&self, resolver: &str) -> Option<&HandlerBinding> {
        self.bindings.get(resolver)
    }

    /// The generated schema in SDL form.
    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }
}

impl std::fmt::Debug for GeneratedApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedApi")
            .field("entities", &self.schemas.keys().collect::<Vec<_>>())
            .field("operations", &self.bindings.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
