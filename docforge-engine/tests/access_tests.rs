use std::sync::Arc;

use docforge_engine::{
    AccessHook, AccessRegistry, EngineConfig, OwnerHook, SchemaError, parse_schema,
};
use docforge_model::{Filter, IdentityContext};
use serde_json::{Value, json};

fn registry(source: &str) -> Result<AccessRegistry, SchemaError> {
    AccessRegistry::from_schema(&parse_schema(source).unwrap(), &EngineConfig::default())
}

fn subject(id: &str) -> IdentityContext {
    IdentityContext::authenticated(json!({"_id": id, "name": "Val"}).as_object().cloned().unwrap())
}

const TODOS: &str = r#"
    type User { _id: ID!, name: String! }
    type Todo @auth { userId: ID!, done: Boolean! }
"#;

// ── installation ─────────────────────────────────────────────────

#[test]
fn annotated_type_is_protected() {
    let registry = registry(TODOS).unwrap();
    assert!(registry.is_protected("Todo"));
    assert!(!registry.is_protected("User"));
    assert!(registry.contains("User"));
    assert!(!registry.contains("Missing"));
}

#[test]
fn default_hook_adds_nothing() {
    let registry = registry(TODOS).unwrap();
    assert!(registry.constraints_for("User", &subject("u1")).is_empty());
    assert!(
        registry
            .constraints_for("User", &IdentityContext::anonymous())
            .is_empty()
    );
}

#[test]
fn owner_hook_uses_subject_id() {
    let registry = registry(TODOS).unwrap();
    let constraints = registry.constraints_for("Todo", &subject("u1"));
    assert_eq!(Value::Object(constraints), json!({"userId": "u1"}));
}

#[test]
fn anonymous_owner_is_null() {
    let registry = registry(TODOS).unwrap();
    let constraints = registry.constraints_for("Todo", &IdentityContext::anonymous());
    assert_eq!(Value::Object(constraints), json!({"userId": null}));
}

#[test]
fn explicit_owner_field() {
    let registry = registry(
        r#"type Note @auth(ownerField: "author") { author: String!, body: String }"#,
    )
    .unwrap();
    let constraints = registry.constraints_for("Note", &subject("u7"));
    assert_eq!(Value::Object(constraints), json!({"author": "u7"}));
}

#[test]
fn custom_directive_name() {
    let config = EngineConfig {
        auth_directive: "owned".into(),
        ..Default::default()
    };
    let document = parse_schema("type Note @owned { userId: ID!, body: String }").unwrap();
    let registry = AccessRegistry::from_schema(&document, &config).unwrap();
    assert!(registry.is_protected("Note"));
}

#[test]
fn installed_hook_replaces_default() {
    #[derive(Debug)]
    struct Tenant;
    impl AccessHook for Tenant {
        fn constraints(&self, _identity: &IdentityContext) -> Filter {
            json!({"tenant": "acme"}).as_object().cloned().unwrap()
        }
    }

    let mut registry = registry(TODOS).unwrap();
    registry.install("User", Arc::new(Tenant));
    assert!(registry.is_protected("User"));
    assert_eq!(
        Value::Object(registry.constraints_for("User", &IdentityContext::anonymous())),
        json!({"tenant": "acme"})
    );
    assert_eq!(OwnerHook::new("userId").owner_field(), "userId");
}

// ── rejection ────────────────────────────────────────────────────

#[test]
fn owner_field_must_exist() {
    let err = registry("type Todo @auth { done: Boolean! }").unwrap_err();
    assert!(matches!(err, SchemaError::InvalidAuthDirective { ref entity, .. } if entity == "Todo"));
}

#[test]
fn owner_field_must_be_required() {
    let err = registry("type Todo @auth { userId: ID, done: Boolean! }").unwrap_err();
    assert!(err.to_string().contains("non-null"), "{err}");
}

#[test]
fn owner_field_must_be_single_identifier() {
    assert!(registry("type Todo @auth { userId: [ID!]! }").is_err());
    assert!(registry("type Todo @auth { userId: Int! }").is_err());
}

#[test]
fn owner_field_argument_must_be_string() {
    assert!(registry("type Todo @auth(ownerField: 3) { userId: ID! }").is_err());
}

#[test]
fn only_entities_can_be_annotated() {
    let err = registry("input TodoInput @auth { userId: ID! }").unwrap_err();
    assert!(matches!(err, SchemaError::InvalidAuthDirective { .. }), "{err}");
}
