//! End-to-end behavior of generated APIs, driven through GraphQL.

use std::sync::Arc;

use async_graphql::{Request, Response, Variables};
use docforge_engine::{EngineError, GeneratedApi, HandlerOutput};
use docforge_model::{Document, IdentityContext};
use docforge_storage::{DocumentStore, MemoryStore};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const PERSON_SCHEMA: &str = r#"
    type Query {
      Person_findByAge(age: NumberFilter): [Person]
      Person_findOne(name: String): Person
    }
    type Mutation {
      Person_create(data: PersonInput!): Person
      Person_delete(_id: ID!): Person
    }

    type Person {
      _id: ID!
      name: String!
      age: Int!
      mood: Mood
    }

    input PersonInput {
      name: String
      age: Int
      mood: Mood
    }
    input NumberFilter {
      eq: Float
      lt: Float
      gt: Float
    }
    enum Mood { HAPPY SAD }
"#;

const TODO_SCHEMA: &str = r#"
    directive @auth(ownerField: String) on OBJECT

    type Query {
      Todo_find: [Todo]
    }
    type Mutation {
      Todo_create(data: TodoInput!): Todo
      Todo_update(_id: ID!, update: TodoUpdate!): Todo
      Todo_delete(_id: ID!): Todo
    }

    type User {
      _id: ID!
      name: String!
    }
    type Todo @auth {
      _id: ID!
      userId: ID!
      done: Boolean!
      description: String!
    }

    input TodoInput {
      userId: ID
      done: Boolean
      description: String
    }
    input TodoUpdate {
      done: Boolean
      description: String
    }
"#;

fn obj(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

async fn execute(api: &GeneratedApi, query: &str, credential: Option<&str>) -> Response {
    api.execute(Request::new(query), credential).await
}

/// Runs a request that must succeed and returns its `data`.
async fn data(api: &GeneratedApi, query: &str, credential: Option<&str>) -> Value {
    let response = execute(api, query, credential).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    response.data.into_json().unwrap()
}

struct Todos {
    api: GeneratedApi,
    store: Arc<MemoryStore>,
    mine: String,
    theirs: String,
}

/// Two users, one todo each, and a credential for the first user.
async fn todos() -> Todos {
    let store = Arc::new(MemoryStore::new());
    let api = GeneratedApi::build(TODO_SCHEMA, store.clone()).unwrap();

    let val = api.insert("User", obj(json!({"name": "Val"}))).await.unwrap();
    let test = api.insert("User", obj(json!({"name": "test"}))).await.unwrap();

    let mine = api
        .insert(
            "Todo",
            obj(json!({"userId": val["_id"], "done": false, "description": "write blog post"})),
        )
        .await
        .unwrap();
    let theirs = api
        .insert(
            "Todo",
            obj(json!({"userId": test["_id"], "done": true, "description": "schedule tweet"})),
        )
        .await
        .unwrap();

    store
        .create(
            "AccessToken",
            obj(json!({"_id": "testtoken", "userId": val["_id"]})),
        )
        .await
        .unwrap();

    Todos {
        api,
        store,
        mine: mine["_id"].as_str().unwrap().to_string(),
        theirs: theirs["_id"].as_str().unwrap().to_string(),
    }
}

// ── scenario A: comparison filters ───────────────────────────────

#[tokio::test]
async fn person_find_by_age() {
    let api = GeneratedApi::build(PERSON_SCHEMA, Arc::new(MemoryStore::new())).unwrap();

    let created = data(
        &api,
        r#"mutation { Person_create(data: {name: "Val", age: 31}) { _id name age } }"#,
        None,
    )
    .await;
    assert_eq!(created["Person_create"]["name"], json!("Val"));
    assert!(created["Person_create"]["_id"].as_str().is_some());

    let found = data(&api, "{ Person_findByAge(age: {gt: 30}) { name age } }", None).await;
    assert_eq!(found, json!({"Person_findByAge": [{"name": "Val", "age": 31}]}));

    let none = data(&api, "{ Person_findByAge(age: {gt: 40}) { name } }", None).await;
    assert_eq!(none, json!({"Person_findByAge": []}));
}

#[tokio::test]
async fn filters_through_variables() {
    let api = GeneratedApi::build(PERSON_SCHEMA, Arc::new(MemoryStore::new())).unwrap();
    for (name, age) in [("Val", 31), ("Ann", 45), ("Bob", 22)] {
        api.insert("Person", obj(json!({"name": name, "age": age})))
            .await
            .unwrap();
    }

    let request = Request::new(
        "query ($age: NumberFilter) { Person_findByAge(age: $age) { name } }",
    )
    .variables(Variables::from_json(json!({"age": {"gt": 25, "lt": 50}})));
    let response = api.execute(request, None).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({"Person_findByAge": [{"name": "Val"}, {"name": "Ann"}]})
    );
}

#[tokio::test]
async fn unset_variable_does_not_filter() {
    let api = GeneratedApi::build(PERSON_SCHEMA, Arc::new(MemoryStore::new())).unwrap();
    api.insert("Person", obj(json!({"name": "Val", "age": 31})))
        .await
        .unwrap();

    let response = api
        .execute(
            Request::new("query ($n: String) { Person_findOne(name: $n) { name } }"),
            None,
        )
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({"Person_findOne": {"name": "Val"}})
    );

    let response = api
        .execute(
            Request::new("query ($age: NumberFilter) { Person_findByAge(age: $age) { name } }"),
            None,
        )
        .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);
    assert_eq!(
        response.data.into_json().unwrap(),
        json!({"Person_findByAge": [{"name": "Val"}]})
    );
}

#[tokio::test]
async fn find_one_and_missing_record() {
    let api = GeneratedApi::build(PERSON_SCHEMA, Arc::new(MemoryStore::new())).unwrap();
    api.insert("Person", obj(json!({"name": "Val", "age": 31, "mood": "HAPPY"})))
        .await
        .unwrap();

    let found = data(&api, r#"{ Person_findOne(name: "Val") { age mood } }"#, None).await;
    assert_eq!(found, json!({"Person_findOne": {"age": 31, "mood": "HAPPY"}}));

    let missing = data(&api, r#"{ Person_findOne(name: "Nobody") { age } }"#, None).await;
    assert_eq!(missing, json!({"Person_findOne": null}));
}

#[tokio::test]
async fn delete_returns_removed_record() {
    let store = Arc::new(MemoryStore::new());
    let api = GeneratedApi::build(PERSON_SCHEMA, store.clone()).unwrap();
    let person = api
        .insert("Person", obj(json!({"name": "Val", "age": 31})))
        .await
        .unwrap();
    let id = person["_id"].as_str().unwrap();

    let deleted = data(
        &api,
        &format!(r#"mutation {{ Person_delete(_id: "{id}") {{ name }} }}"#),
        None,
    )
    .await;
    assert_eq!(deleted, json!({"Person_delete": {"name": "Val"}}));
    assert_eq!(store.count("Person").await, 0);

    let again = data(
        &api,
        &format!(r#"mutation {{ Person_delete(_id: "{id}") {{ name }} }}"#),
        None,
    )
    .await;
    assert_eq!(again, json!({"Person_delete": null}));
}

// ── scenario B: owner-restricted todos ───────────────────────────

#[tokio::test]
async fn subject_sees_only_own_todos() {
    let t = todos().await;
    let found = data(
        &t.api,
        "{ Todo_find { done, description } }",
        Some("testtoken"),
    )
    .await;
    assert_eq!(
        found,
        json!({"Todo_find": [{"done": false, "description": "write blog post"}]})
    );
}

#[tokio::test]
async fn subject_updates_own_todo() {
    let t = todos().await;
    let query = format!(
        r#"mutation {{ Todo_update(_id: "{}", update: {{done: true}}) {{ done, description }} }}"#,
        t.mine
    );
    let updated = data(&t.api, &query, Some("Bearer testtoken")).await;
    assert_eq!(
        updated,
        json!({"Todo_update": {"done": true, "description": "write blog post"}})
    );
}

#[tokio::test]
async fn cross_subject_update_is_null_and_harmless() {
    let t = todos().await;
    let query = format!(
        r#"mutation {{ Todo_update(_id: "{}", update: {{done: false}}) {{ done }} }}"#,
        t.theirs
    );
    let updated = data(&t.api, &query, Some("testtoken")).await;
    assert_eq!(updated, json!({"Todo_update": null}));

    let stored = t
        .store
        .find_one("Todo", &obj(json!({"_id": t.theirs})))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["done"], json!(true));
}

// ── anonymous access to annotated types ──────────────────────────

#[tokio::test]
async fn anonymous_query_is_empty_not_error() {
    let t = todos().await;
    for credential in [None, Some("wrong-token")] {
        let found = data(&t.api, "{ Todo_find { description } }", credential).await;
        assert_eq!(found, json!({"Todo_find": []}), "{credential:?}");
    }
}

#[tokio::test]
async fn anonymous_update_and_delete_are_null() {
    let t = todos().await;
    for id in [&t.mine, &t.theirs] {
        let update = format!(
            r#"mutation {{ Todo_update(_id: "{id}", update: {{done: true}}) {{ done }} }}"#
        );
        assert_eq!(
            data(&t.api, &update, None).await,
            json!({"Todo_update": null})
        );

        let delete = format!(r#"mutation {{ Todo_delete(_id: "{id}") {{ done }} }}"#);
        assert_eq!(
            data(&t.api, &delete, None).await,
            json!({"Todo_delete": null})
        );
    }
    assert_eq!(t.store.count("Todo").await, 2);
}

#[tokio::test]
async fn owner_deletes_own_todo() {
    let t = todos().await;
    let delete = format!(
        r#"mutation {{ Todo_delete(_id: "{}") {{ description }} }}"#,
        t.mine
    );
    assert_eq!(
        data(&t.api, &delete, Some("testtoken")).await,
        json!({"Todo_delete": {"description": "write blog post"}})
    );
    assert_eq!(t.store.count("Todo").await, 1);
}

#[tokio::test]
async fn create_does_not_consult_access_hook() {
    let t = todos().await;
    let created = data(
        &t.api,
        r#"mutation { Todo_create(data: {userId: "someone", done: false, description: "x"}) { description } }"#,
        None,
    )
    .await;
    assert_eq!(created, json!({"Todo_create": {"description": "x"}}));
    assert_eq!(t.store.count("Todo").await, 3);
}

// ── scenario C: validation before storage ────────────────────────

#[tokio::test]
async fn missing_required_field_fails_before_storage() {
    let store = Arc::new(MemoryStore::new());
    let api = GeneratedApi::build(PERSON_SCHEMA, store.clone()).unwrap();

    let response = execute(
        &api,
        r#"mutation { Person_create(data: {name: "X"}) { name } }"#,
        None,
    )
    .await;
    assert_eq!(response.errors.len(), 1);
    assert!(
        response.errors[0].message.contains("`age` is required"),
        "{}",
        response.errors[0].message
    );
    assert_eq!(store.count("Person").await, 0);
}

#[tokio::test]
async fn patch_cannot_unset_required_field() {
    let t = todos().await;
    let query = format!(
        r#"mutation {{ Todo_update(_id: "{}", update: {{description: null}}) {{ done }} }}"#,
        t.mine
    );
    let response = execute(&t.api, &query, Some("testtoken")).await;
    assert_eq!(response.errors.len(), 1);

    let stored = t
        .store
        .find_one("Todo", &obj(json!({"_id": t.mine})))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["description"], json!("write blog post"));
}

#[tokio::test]
async fn graphql_layer_rejects_unknown_arguments() {
    let api = GeneratedApi::build(PERSON_SCHEMA, Arc::new(MemoryStore::new())).unwrap();
    let response = execute(&api, r#"{ Person_findOne(nickname: "V") { name } }"#, None).await;
    assert!(!response.errors.is_empty());
}

// ── direct invocation ────────────────────────────────────────────

#[tokio::test]
async fn invoke_bypasses_graphql() {
    let t = todos().await;
    let identity = t.api.resolve_identity(Some("testtoken")).await;
    let output = t
        .api
        .invoke("Todo_find", Document::new(), identity)
        .await
        .unwrap();
    let records = output.into_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["_id"], json!(t.mine));

    let anonymous = t
        .api
        .invoke("Todo_find", Document::new(), IdentityContext::anonymous())
        .await
        .unwrap();
    assert_eq!(anonymous, HandlerOutput::Records(vec![]));

    let err = t
        .api
        .invoke("Todo_archive", Document::new(), IdentityContext::anonymous())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownOperation(_)));
}

#[tokio::test]
async fn introspection_surface() {
    let t = todos().await;
    assert!(t.api.access().is_protected("Todo"));
    assert_eq!(t.api.operations().len(), 4);
    assert!(t.api.binding("Todo_update").is_some());
    assert!(t.api.storage_schema("User").is_some());

    let sdl = t.api.sdl();
    assert!(sdl.contains("Todo_find"), "{sdl}");
    assert!(sdl.contains("input TodoUpdate"), "{sdl}");
}

// ── entities without a declared _id ──────────────────────────────

const NOTE_SCHEMA: &str = r#"
    type Query {
      Note_findById(_id: ID!): Note
    }
    type Mutation {
      Note_create(data: NoteInput!): Note
      Note_update(_id: ID!, update: NoteInput!): Note
      Note_delete(_id: ID!): Note
    }

    type Note {
      title: String!
      body: String
    }
    input NoteInput {
      title: String
      body: String
    }
"#;

#[tokio::test]
async fn implicit_id_is_readable_and_addressable() {
    let store = Arc::new(MemoryStore::new());
    let api = GeneratedApi::build(NOTE_SCHEMA, store.clone()).unwrap();

    let created = data(
        &api,
        r#"mutation { Note_create(data: {title: "groceries"}) { _id title } }"#,
        None,
    )
    .await;
    let id = created["Note_create"]["_id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());

    let found = data(
        &api,
        &format!(r#"{{ Note_findById(_id: "{id}") {{ _id title }} }}"#),
        None,
    )
    .await;
    assert_eq!(found, json!({"Note_findById": {"_id": id, "title": "groceries"}}));

    let updated = data(
        &api,
        &format!(r#"mutation {{ Note_update(_id: "{id}", update: {{body: "milk"}}) {{ body }} }}"#),
        None,
    )
    .await;
    assert_eq!(updated, json!({"Note_update": {"body": "milk"}}));

    let deleted = data(
        &api,
        &format!(r#"mutation {{ Note_delete(_id: "{id}") {{ _id }} }}"#),
        None,
    )
    .await;
    assert_eq!(deleted, json!({"Note_delete": {"_id": id}}));
    assert_eq!(store.count("Note").await, 0);
}

#[tokio::test]
async fn find_by_id_through_invoke() {
    let api = GeneratedApi::build(NOTE_SCHEMA, Arc::new(MemoryStore::new())).unwrap();
    let note = api
        .insert("Note", obj(json!({"title": "groceries"})))
        .await
        .unwrap();

    let output = api
        .invoke(
            "Note_findById",
            obj(json!({"_id": note["_id"]})),
            IdentityContext::anonymous(),
        )
        .await
        .unwrap();
    assert_eq!(output.record(), Some(&note));

    let missing = api
        .invoke(
            "Note_findById",
            obj(json!({"_id": "nope"})),
            IdentityContext::anonymous(),
        )
        .await
        .unwrap();
    assert_eq!(missing.record(), None);
}
