//! Per-request identity resolution from a bearer credential.

use std::sync::Arc;

use docforge_model::{IdentityContext, document_id};
use docforge_storage::DocumentStore;
use serde_json::Value;
use tracing::{debug, warn};

use crate::EngineConfig;
use crate::filter::identity_filter;

/// Extracts the credential from an `Authorization` header value.
///
/// Accepts a raw token or `Bearer <token>`. Blank values yield `None`.
pub fn credential_from_header(header: &str) -> Option<&str> {
    let header = header.trim();
    let credential = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or(header)
        .trim();
    (!credential.is_empty()).then_some(credential)
}

/// Resolves credentials to subjects through two stored collections.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn DocumentStore>,
    token_collection: String,
    token_subject_field: String,
    subject_collection: String,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn DocumentStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            token_collection: config.token_collection.clone(),
            token_subject_field: config.token_subject_field.clone(),
            subject_collection: config.subject_collection.clone(),
        }
    }

    /// Builds the identity for one request from the raw header value.
    ///
    /// Never fails: a missing, unknown or unreadable credential is anonymous.
    pub async fn resolve(&self, header: Option<&str>) -> IdentityContext {
        let Some(credential) = header.and_then(credential_from_header) else {
            return IdentityContext::anonymous();
        };

        let token = match self
            .store
            .find_one(
                &self.token_collection,
                &identity_filter(Value::String(credential.to_string())),
            )
            .await
        {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("credential not found");
                return IdentityContext::anonymous();
            }
            Err(e) => {
                warn!("credential lookup failed: {e}");
                return IdentityContext::anonymous();
            }
        };

        let Some(subject_id) = token
            .get(&self.token_subject_field)
            .filter(|id| !id.is_null())
            .cloned()
        else {
            debug!(token = ?document_id(&token), "credential has no subject");
            return IdentityContext::anonymous();
        };

        match self
            .store
            .find_one(&self.subject_collection, &identity_filter(subject_id))
            .await
        {
            Ok(Some(subject)) => {
                debug!(subject = ?document_id(&subject), "resolved identity");
                IdentityContext::authenticated(subject)
            }
            Ok(None) => {
                debug!("credential subject not found");
                IdentityContext::anonymous()
            }
            Err(e) => {
                warn!("subject lookup failed: {e}");
                IdentityContext::anonymous()
            }
        }
    }
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("token_collection", &self.token_collection)
            .field("subject_collection", &self.subject_collection)
            .finish_non_exhaustive()
    }
}
