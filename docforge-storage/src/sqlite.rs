//! SQLite-backed document store.
//!
//! Documents are stored as JSON text, one row per document, keyed by
//! `(collection, id)`. Filters are evaluated in process by the shared matcher,
//! so both stores answer every query identically.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docforge_model::{Document, Filter, IDENTITY_FIELD, document_id, generate_id};
use rusqlite::{Connection, ErrorCode, params};
use serde_json::Value;
use tracing::debug;

use crate::matcher::{apply_patch, matches};
use crate::{DocumentStore, StorageError, StorageResult};

/// Persistent store backed by a single SQLite file.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(Connection::open(path)?)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(Connection::open_in_memory()?)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StorageResult<()> {
        let conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                UNIQUE(collection, id)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection, seq);
            ",
        )?;
        Ok(())
    }

    /// Runs `f` against the connection on the blocking pool.
    async fn with_connection<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            f(&conn)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

/// The JSON text of `_id`, so `1` and `"1"` are distinct keys.
fn id_key(document: &Document) -> String {
    document_id(document).map(Value::to_string).unwrap_or_default()
}

fn load(conn: &Connection, collection: &str) -> StorageResult<Vec<(i64, Document)>> {
    let mut stmt =
        conn.prepare("SELECT seq, body FROM documents WHERE collection = ?1 ORDER BY seq")?;
    let rows = stmt.query_map(params![collection], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut documents = Vec::new();
    for row in rows {
        let (seq, body) = row?;
        documents.push((seq, serde_json::from_str(&body)?));
    }
    Ok(documents)
}

fn first_match(
    conn: &Connection,
    collection: &str,
    filter: &Filter,
) -> StorageResult<Option<(i64, Document)>> {
    for (seq, document) in load(conn, collection)? {
        if matches(&document, filter)? {
            return Ok(Some((seq, document)));
        }
    }
    Ok(None)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn find_one(&self, collection: &str, filter: &Filter) -> StorageResult<Option<Document>> {
        debug!(collection, ?filter, "find_one");
        let (collection, filter) = (collection.to_string(), filter.clone());
        self.with_connection(move |conn| {
            Ok(first_match(conn, &collection, &filter)?.map(|(_, document)| document))
        })
        .await
    }

    async fn find(&self, collection: &str, filter: &Filter) -> StorageResult<Vec<Document>> {
        debug!(collection, ?filter, "find");
        let (collection, filter) = (collection.to_string(), filter.clone());
        self.with_connection(move |conn| {
            let mut found = Vec::new();
            for (_, document) in load(conn, &collection)? {
                if matches(&document, &filter)? {
                    found.push(document);
                }
            }
            Ok(found)
        })
        .await
    }

    async fn create(&self, collection: &str, mut document: Document) -> StorageResult<Document> {
        if document_id(&document).is_none() {
            document.insert(IDENTITY_FIELD.to_string(), Value::String(generate_id()));
        }
        debug!(collection, ?document, "create");
        let collection = collection.to_string();
        self.with_connection(move |conn| {
            let id = id_key(&document);
            let body = serde_json::to_string(&document)?;
            let inserted = conn.execute(
                "INSERT INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
                params![collection, id, body],
            );
            match inserted {
                Ok(_) => Ok(document),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    Err(StorageError::DuplicateKey { collection, id })
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn find_one_and_update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: Document,
    ) -> StorageResult<Option<Document>> {
        debug!(collection, ?filter, ?patch, "find_one_and_update");
        let (collection, filter) = (collection.to_string(), filter.clone());
        self.with_connection(move |conn| {
            let Some((seq, mut document)) = first_match(conn, &collection, &filter)? else {
                return Ok(None);
            };
            apply_patch(&mut document, patch);
            conn.execute(
                "UPDATE documents SET id = ?1, body = ?2 WHERE seq = ?3",
                params![id_key(&document), serde_json::to_string(&document)?, seq],
            )?;
            Ok(Some(document))
        })
        .await
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StorageResult<Option<Document>> {
        debug!(collection, ?filter, "delete_one");
        let (collection, filter) = (collection.to_string(), filter.clone());
        self.with_connection(move |conn| {
            let Some((seq, document)) = first_match(conn, &collection, &filter)? else {
                return Ok(None);
            };
            conn.execute("DELETE FROM documents WHERE seq = ?1", params![seq])?;
            Ok(Some(document))
        })
        .await
    }
}
