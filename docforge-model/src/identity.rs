use serde_json::Value;

use crate::{Document, document_id};

/// The subject a request acts on behalf of, resolved once per request.
///
/// Anonymous when no credential was presented or it did not resolve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityContext {
    subject: Option<Document>,
}

impl IdentityContext {
    /// A context with no resolved subject.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A context acting as `subject`.
    pub fn authenticated(subject: Document) -> Self {
        Self {
            subject: Some(subject),
        }
    }

    pub fn subject(&self) -> Option<&Document> {
        self.subject.as_ref()
    }

    /// The identity value of the resolved subject.
    pub fn subject_id(&self) -> Option<&Value> {
        self.subject.as_ref().and_then(document_id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.subject.is_some()
    }
}
