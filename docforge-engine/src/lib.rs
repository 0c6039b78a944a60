//! Schema-to-handler compiler for docforge.
//!
//! Takes an interface description written as GraphQL SDL and produces a
//! serving API over a [`DocumentStore`](docforge_storage::DocumentStore):
//!
//! - [`parse_schema`] lowers SDL into a [`SchemaDocument`](docforge_model::SchemaDocument)
//! - [`synthesize_storage_schemas`] derives one storage schema per entity type
//! - [`generate_accessors`] produces the field read accessors
//! - [`translate_filter`] rewrites query arguments into storage filters
//! - [`AccessRegistry`] holds the per-type access hooks, installed from `@auth`
//! - [`OperationTable`] maps every `Query`/`Mutation` field to an operation,
//!   and [`bind`] turns each into a handler
//! - [`IdentityResolver`] turns a bearer credential into an [`IdentityContext`](docforge_model::IdentityContext)
//!
//! [`GeneratedApi`] runs the whole generation pass once and then serves
//! requests.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use docforge_engine::GeneratedApi;
//! use docforge_storage::MemoryStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let api = GeneratedApi::build(
//!     r#"
//!     type Query { Person_findByName(name: String): [Person] }
//!     type Person { name: String! }
//!     "#,
//!     Arc::new(MemoryStore::new()),
//! )?;
//! let response = api
//!     .execute(async_graphql::Request::new("{ Person_findByName(name: \"Val\") { name } }"), None)
//!     .await;
//! assert!(response.errors.is_empty());
//! # Ok(())
//! # }
//! ```

mod access;
mod accessor;
mod api;
mod config;
mod error;
mod filter;
mod graphql;
mod handlers;
mod identity;
mod operations;
mod parser;
mod storage_schema;

pub use access::{AccessHook, AccessRegistry, OwnerHook, Unrestricted};
pub use accessor::{FieldAccessor, generate_accessors};
pub use api::GeneratedApi;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, SchemaError, SchemaResult};
pub use filter::{
    COMPARISON_OPERATORS, identity_filter, is_supported_operator, merge_constraints,
    operator_syntax, translate_filter,
};
pub use graphql::{arguments_document, assemble, type_ref};
pub use handlers::{HandlerBinding, HandlerContext, HandlerOutput, bind};
pub use identity::{IdentityResolver, credential_from_header};
pub use operations::{Operation, OperationKind, OperationTable, split_resolver_name};
pub use parser::parse_schema;
pub use storage_schema::{storage_type_for, synthesize_storage_schema, synthesize_storage_schemas};
