/// Naming conventions the compiler and identity resolution follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Directive marking an entity type as owner-restricted.
    pub auth_directive: String,
    /// Owner field used when the directive names none.
    pub default_owner_field: String,
    /// Collection holding credential records.
    pub token_collection: String,
    /// Field of a credential record naming its subject.
    pub token_subject_field: String,
    /// Collection holding subject records.
    pub subject_collection: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auth_directive: "auth".to_string(),
            default_owner_field: "userId".to_string(),
            token_collection: "AccessToken".to_string(),
            token_subject_field: "userId".to_string(),
            subject_collection: "User".to_string(),
        }
    }
}
