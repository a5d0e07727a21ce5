//! End-to-end coverage of the public surface: declaring a class chain,
//! introspecting metadata, and the full instance lifecycle.

use tydel::{
    prelude::*,
    props,
};

fn profile_class() -> ModelClass {
    ModelClass::define("Profile")
        .required_with("name", |s| s.text())
        .optional_with("age", |s| s.number().default_value(1i64))
        .build()
        .expect("class builds")
}

#[test]
fn inheritance_chain_resolves_in_declaration_order() {
    let first = ModelClass::define("First")
        .required_with("id", |s| s.text().uuid_v4())
        .optional_with("name", |s| s.text())
        .build()
        .expect("class builds");
    let second = ModelClass::define("Second")
        .extends(&first)
        .build()
        .expect("class builds");
    let third = ModelClass::define("Third")
        .extends(&second)
        .required_with("name", |s| s.text().min(5.0).max(40.0))
        .optional_with("age", |s| s.number().min(1.0).max(199.0))
        .optional("active", FieldType::Bool)
        .build()
        .expect("class builds");

    assert_eq!(first.metadata().keys(), vec!["id", "name"]);
    assert_eq!(second.metadata().keys(), vec!["id", "name"]);
    assert_eq!(third.metadata().keys(), vec!["id", "name", "age", "active"]);
}

#[test]
fn metadata_serializes_for_tooling() {
    let profile = profile_class();
    let user = ModelClass::define("User")
        .required_with("id", |s| s.text())
        .reference("profile", Reference::to(&profile))
        .build()
        .expect("class builds");

    let json = serde_json::to_value(user.metadata()).expect("metadata serializes");
    assert_eq!(
        json,
        serde_json::json!({
            "fields": [
                { "name": "id", "required": true, "spec": { "kind": "text", "required": true } },
                { "name": "profile", "required": false, "reference": { "model": "Profile", "cardinality": "one" } },
            ]
        })
    );
}

#[test]
fn lifecycle_round_trip() {
    let profile = profile_class();
    let pet = ModelClass::define("Pet")
        .optional_with("name", |s| s.text())
        .build()
        .expect("class builds");
    let user = ModelClass::define("User")
        .required_with("id", |s| s.text())
        .reference("profile", Reference::to(&profile))
        .reference("pets", Reference::to_array(&pet))
        .build()
        .expect("class builds");

    let instance = user.build(
        Some(&props! {
            "id" => "1",
            "profile" => props! { "name" => "Joe" },
            "pets" => vec![FieldValue::from(props! { "name" => "qq" })],
        }),
        &ParseOptions::default(),
    );

    let result = instance
        .validate(&ValidateOptions::default())
        .expect("validator compiles");
    assert!(result.is_ok());

    let portable = instance.attempt().expect("instance is valid");
    assert_eq!(
        serde_json::to_value(portable).expect("portable serializes"),
        serde_json::json!({
            "id": "1",
            "profile": { "name": "Joe", "age": 1 },
            "pets": [{ "name": "qq" }],
        })
    );
}

#[test]
fn named_references_resolve_after_definition() {
    // The referrer is declared before its target exists; the lookup is
    // late-bound through the registry.
    let team = ModelClass::define("FacadeTeam")
        .reference("members", Reference::to_array_named("FacadeMember"))
        .build()
        .expect("class builds");

    let member = ModelClass::define("FacadeMember")
        .optional_with("name", |s| s.text())
        .build()
        .expect("class builds");
    tydel::core::registry::register(&member).expect("name is unique");

    let instance = team.build(
        Some(&props! {
            "members" => vec![FieldValue::from(props! { "name" => "ann" })],
        }),
        &ParseOptions::default(),
    );

    assert!(instance.validate(&ValidateOptions::default()).expect("compiles").is_ok());
}

#[test]
fn declared_type_table_is_narrow() {
    // Dates, blobs, and lists intentionally fall through to
    // accept-anything; only number/text/bool/func get typed validators.
    let thing = ModelClass::define("TypedThing")
        .required("count", FieldType::Number)
        .optional("when", FieldType::Date)
        .optional("payload", FieldType::Blob)
        .build()
        .expect("class builds");

    let instance = thing.build(
        Some(&props! {
            "count" => 3i64,
            "when" => "not-a-date",
            "payload" => Value::List(vec![Value::Int(0)]),
        }),
        &ParseOptions::default(),
    );

    assert!(instance.validate(&ValidateOptions::default()).expect("compiles").is_ok());
}

#[test]
fn version_is_exposed() {
    assert!(!tydel::VERSION.is_empty());
}
