use serde_json::{Map, Value};
use uuid::Uuid;

/// Name of the identity field every stored record carries.
pub const IDENTITY_FIELD: &str = "_id";

/// A stored record: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// A storage filter expression.
///
/// Keys are field names. A value is either a literal (equality) or an object
/// of `$`-prefixed operators, e.g. `{"age": {"$gt": 30}}`.
pub type Filter = Map<String, Value>;

/// Returns a fresh, globally unique identifier (UUID v7, time ordered).
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Extracts the identity value of a record.
pub fn document_id(document: &Document) -> Option<&Value> {
    document.get(IDENTITY_FIELD).filter(|id| !id.is_null())
}
