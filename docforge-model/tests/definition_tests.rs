use docforge_model::{
    DefinitionKind, Directive, FieldDefinition, IdentityContext, SchemaDocument, TypeDefinition,
    TypeReference,
};
use serde_json::json;

// ── TypeReference ────────────────────────────────────────────────

#[test]
fn named_type_is_nullable_scalar() {
    let ty = TypeReference::named("String");
    assert!(!ty.is_non_null());
    assert!(!ty.is_list());
    assert_eq!(ty.base_name(), "String");
}

#[test]
fn non_null_list_of_non_null() {
    let ty = TypeReference::named("Person").non_null().list().non_null();
    assert!(ty.is_non_null());
    assert!(ty.is_list());
    assert_eq!(ty.base_name(), "Person");
    assert_eq!(ty.to_string(), "[Person!]!");
    assert_eq!(ty.list_item(), Some(&TypeReference::named("Person").non_null()));
}

#[test]
fn nullable_strips_one_level() {
    let ty = TypeReference::named("ID").non_null();
    assert_eq!(ty.nullable(), &TypeReference::named("ID"));
    assert_eq!(TypeReference::named("ID").nullable(), &TypeReference::named("ID"));
}

// ── TypeDefinition ───────────────────────────────────────────────

#[test]
fn query_and_mutation_are_not_entities() {
    assert!(!TypeDefinition::object("Query").is_entity());
    assert!(!TypeDefinition::object("Mutation").is_entity());
    assert!(TypeDefinition::object("Person").is_entity());
}

#[test]
fn input_types_are_not_entities() {
    let mut input = TypeDefinition::object("PersonInput");
    input.kind = DefinitionKind::Input;
    assert!(!input.is_entity());
}

#[test]
fn fields_keep_declaration_order() {
    let ty = TypeDefinition::object("Todo")
        .with_field(FieldDefinition::new("userId", TypeReference::named("ID")))
        .with_field(FieldDefinition::new("done", TypeReference::named("Boolean")))
        .with_field(FieldDefinition::new("description", TypeReference::named("String")));
    let names: Vec<&str> = ty.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["userId", "done", "description"]);
}

#[test]
fn directive_arguments_are_looked_up_by_name() {
    let ty = TypeDefinition::object("Todo")
        .with_directive(Directive::new("auth").with_argument("ownerField", json!("ownerId")));
    let auth = ty.directive("auth").unwrap();
    assert_eq!(auth.argument("ownerField"), Some(&json!("ownerId")));
    assert!(auth.argument("other").is_none());
    assert!(ty.directive("deprecated").is_none());
}

// ── SchemaDocument ───────────────────────────────────────────────

#[test]
fn document_classifies_types() {
    let mut scalar = TypeDefinition::object("JSON");
    scalar.kind = DefinitionKind::Scalar;
    let mut status = TypeDefinition::object("Status");
    status.kind = DefinitionKind::Enum(vec!["OPEN".into(), "CLOSED".into()]);

    let doc = SchemaDocument::new(vec![
        TypeDefinition::object("Query"),
        TypeDefinition::object("Person"),
        scalar,
        status,
    ]);

    let entities: Vec<&str> = doc.entities().map(|t| t.name.as_str()).collect();
    assert_eq!(entities, vec!["Person"]);
    assert!(doc.query().is_some());
    assert!(doc.mutation().is_none());
    assert!(doc.is_custom_scalar("JSON"));
    assert!(doc.is_enum("Status"));
    assert!(!doc.is_entity("Query"));
}

// ── IdentityContext ──────────────────────────────────────────────

#[test]
fn anonymous_identity_has_no_subject() {
    let identity = IdentityContext::anonymous();
    assert!(!identity.is_authenticated());
    assert!(identity.subject_id().is_none());
}

#[test]
fn authenticated_identity_exposes_subject_id() {
    let subject = json!({"_id": "u-1", "name": "Val"}).as_object().cloned().unwrap();
    let identity = IdentityContext::authenticated(subject);
    assert!(identity.is_authenticated());
    assert_eq!(identity.subject_id(), Some(&json!("u-1")));
}
