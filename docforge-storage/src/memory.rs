//! In-process document store.

use std::collections::HashMap;

use async_trait::async_trait;
use docforge_model::{Document, Filter, IDENTITY_FIELD, document_id, generate_id};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::matcher::{apply_patch, matches};
use crate::{DocumentStore, StorageError, StorageResult};

/// Keeps every collection in memory, in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

fn position(documents: &[Document], filter: &Filter) -> StorageResult<Option<usize>> {
    for (index, document) in documents.iter().enumerate() {
        if matches(document, filter)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(&self, collection: &str, filter: &Filter) -> StorageResult<Option<Document>> {
        debug!(collection, ?filter, "find_one");
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(None);
        };
        Ok(position(documents, filter)?.map(|index| documents[index].clone()))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> StorageResult<Vec<Document>> {
        debug!(collection, ?filter, "find");
        let collections = self.collections.read().await;
        let mut found = Vec::new();
        for document in collections.get(collection).into_iter().flatten() {
            if matches(document, filter)? {
                found.push(document.clone());
            }
        }
        Ok(found)
    }

    async fn create(&self, collection: &str, mut document: Document) -> StorageResult<Document> {
        if document_id(&document).is_none() {
            document.insert(IDENTITY_FIELD.to_string(), Value::String(generate_id()));
        }
        debug!(collection, ?document, "create");

        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();
        let id = document.get(IDENTITY_FIELD);
        if documents.iter().any(|existing| existing.get(IDENTITY_FIELD) == id) {
            return Err(StorageError::DuplicateKey {
                collection: collection.to_string(),
                id: id.map(Value::to_string).unwrap_or_default(),
            });
        }
        documents.push(document.clone());
        Ok(document)
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> StorageResult<Option<Document>> {
        debug!(collection, ?filter, ?patch, "find_one_and_update");
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(index) = position(documents, filter)? else {
            return Ok(None);
        };
        apply_patch(&mut documents[index], patch);
        Ok(Some(documents[index].clone()))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StorageResult<Option<Document>> {
        debug!(collection, ?filter, "delete_one");
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(None);
        };
        let Some(index) = position(documents, filter)? else {
            return Ok(None);
        };
        Ok(Some(documents.remove(index)))
    }
}
