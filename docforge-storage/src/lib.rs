//! Document store collaborators for docforge.
//!
//! The schema compiler never implements storage itself; it issues filter
//! queries against a [`DocumentStore`]. This crate defines that contract and
//! ships two implementations that share one filter evaluator:
//!
//! - [`MemoryStore`] keeps collections in process memory (tests, ephemeral servers)
//! - [`SqliteStore`] persists documents as JSON rows in a SQLite file
//!
//! # Filter language
//!
//! A filter is a JSON object. Each key names a field; its value is either a
//! literal (equality) or an object of operators:
//! `$eq $ne $lt $lte $gt $gte $in $nin`. All entries must hold for a document
//! to match. Equality against `null` also matches a missing field.

mod error;
mod matcher;
mod memory;
mod sqlite;

use async_trait::async_trait;
use docforge_model::{Document, Filter};

pub use error::{StorageError, StorageResult};
pub use matcher::{SUPPORTED_OPERATORS, apply_patch, matches};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// The operations the handler layer issues against a collection.
///
/// Every method takes the collection (entity type) name. Operations that
/// target a single record act on the first match in insertion order.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the first document matching `filter`.
    async fn find_one(&self, collection: &str, filter: &Filter) -> StorageResult<Option<Document>>;

    /// Returns every document matching `filter`, in insertion order.
    async fn find(&self, collection: &str, filter: &Filter) -> StorageResult<Vec<Document>>;

    /// Inserts a document and returns it as stored.
    ///
    /// A document without `_id` is assigned a generated one.
    async fn create(&self, collection: &str, document: Document) -> StorageResult<Document>;

    /// Sets the fields of `patch` on the first match and returns the updated document.
    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> StorageResult<Option<Document>>;

    /// Removes the first match and returns it.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> StorageResult<Option<Document>>;
}
