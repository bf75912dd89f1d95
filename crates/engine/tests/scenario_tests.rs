//! Scenario tests for trellis-engine
//!
//! End-to-end flows through the public API:
//!
//! 1. Unique equality + range indexes across updates
//! 2. Composite equality keys
//! 3. Prefix queries
//! 4. Snapshot / remove / rollback
//! 5. Serialize / deserialize round trip
//! 6. Constraint failures leave every index unchanged

use serde_json::json;
use trellis_engine::{
    Collection, CollectionConfig, Error, IndexDefinition, KeySpec, KeyValue, RangeOptions,
    Record, RecordId,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn record(value: serde_json::Value) -> Record {
    Record::from_json(value).unwrap()
}

fn id_set(records: &[&Record]) -> Vec<i64> {
    let mut ids: Vec<i64> = records.iter().map(|r| r["id"].as_i64().unwrap()).collect();
    ids.sort();
    ids
}

fn users() -> Collection {
    let mut users = Collection::default();
    users
        .define_index(IndexDefinition::equality("byEmail", "email").unique(true))
        .unwrap()
        .define_index(IndexDefinition::range("byAge", "age"))
        .unwrap();
    users
        .insert(record(json!({"id": 1, "email": "a@x.com", "age": 24})))
        .unwrap();
    users
        .insert(record(json!({"id": 2, "email": "b@x.com", "age": 31})))
        .unwrap();
    users
        .insert(record(json!({"id": 3, "email": "c@x.com", "age": 29})))
        .unwrap();
    users
}

// ============================================================================
// Module 1: Equality + range
// ============================================================================

#[test]
fn range_query_follows_update() {
    let mut users = users();

    let found = users
        .between("byAge", 25, 35, RangeOptions::default())
        .unwrap();
    assert_eq!(id_set(&found), vec![2, 3]);

    users
        .update(&RecordId::from(3), record(json!({"age": 33})))
        .unwrap();

    let found = users
        .between("byAge", 25, 35, RangeOptions::default())
        .unwrap();
    assert_eq!(id_set(&found), vec![2, 3]);
    assert_eq!(users.get(&RecordId::from(3)).unwrap()["age"], json!(33));
}

#[test]
fn unique_email_lookup() {
    let users = users();
    let found = users.get_one("byEmail", "c@x.com").unwrap().unwrap();
    assert_eq!(found["id"], json!(3));
    assert!(users.get_one("byEmail", "z@x.com").unwrap().is_none());
    assert_eq!(users.get_all("byEmail", "a@x.com").unwrap().len(), 1);
}

#[test]
fn int_and_float_keys_are_distinct_for_equality_but_equal_for_range() {
    let mut c = Collection::default();
    c.define_index(IndexDefinition::equality("byScore", "score"))
        .unwrap()
        .define_index(IndexDefinition::range("byScoreRange", "score"))
        .unwrap();
    c.insert(record(json!({"id": 1, "score": 5}))).unwrap();
    c.insert(record(json!({"id": 2, "score": 5.0}))).unwrap();

    assert_eq!(id_set(&c.get_all("byScore", 5).unwrap()), vec![1]);
    assert_eq!(id_set(&c.get_all("byScore", 5.0).unwrap()), vec![2]);

    let found = c
        .between("byScoreRange", 5, 5, RangeOptions::default())
        .unwrap();
    assert_eq!(id_set(&found), vec![1, 2]);
}

// ============================================================================
// Module 2: Composite keys
// ============================================================================

#[test]
fn composite_equality_lookup() {
    let mut c = Collection::default();
    c.define_index(IndexDefinition::equality("byCityAge", ["city", "age"]))
        .unwrap();
    c.insert(record(json!({"id": 1, "city": "Ankara", "age": 28})))
        .unwrap();
    c.insert(record(json!({"id": 2, "city": "Ankara", "age": 31})))
        .unwrap();

    let found = c.get_all("byCityAge", json!(["Ankara", 31])).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], json!(2));

    assert!(c
        .get_all("byCityAge", json!(["Istanbul", 30]))
        .unwrap()
        .is_empty());
}

#[test]
fn composite_range_orders_lexicographically() {
    let mut c = Collection::default();
    c.define_index(IndexDefinition::range("byCityAge", ["city", "age"]))
        .unwrap();
    for (id, city, age) in [(1, "Bursa", 20), (2, "Ankara", 31), (3, "Ankara", 28)] {
        c.insert(record(json!({"id": id, "city": city, "age": age})))
            .unwrap();
    }

    let ordered: Vec<i64> = c
        .ordered("byCityAge")
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ordered, vec![3, 2, 1]);

    let found = c
        .between(
            "byCityAge",
            KeyValue::composite(["Ankara"]),
            KeyValue::composite(["Ankara", "~"]),
            RangeOptions::default(),
        )
        .unwrap();
    // Numbers sort before strings, so every Ankara entry lies below "~"
    assert_eq!(id_set(&found), vec![2, 3]);
}

// ============================================================================
// Module 3: Prefix queries
// ============================================================================

#[test]
fn prefix_lookup() {
    let mut c = Collection::default();
    c.define_index(IndexDefinition::prefix("byName", "name"))
        .unwrap();
    for (id, name) in [(1, "firat"), (2, "fidan"), (3, "faruk")] {
        c.insert(record(json!({"id": id, "name": name}))).unwrap();
    }

    let mut names: Vec<&str> = c
        .starts_with("byName", "fi")
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, vec!["fidan", "firat"]);
    assert!(c.starts_with("byName", "xyz").unwrap().is_empty());
    assert_eq!(c.starts_with("byName", "").unwrap().len(), 3);
}

#[test]
fn prefix_on_composite_key_joins_with_space() {
    let mut c = Collection::default();
    c.define_index(IndexDefinition::prefix("byFullName", ["first", "last"]))
        .unwrap();
    c.insert(record(json!({"id": 1, "first": "ada", "last": "lovelace"})))
        .unwrap();
    c.insert(record(json!({"id": 2, "first": "ada", "last": "byron"})))
        .unwrap();

    assert_eq!(id_set(&c.starts_with("byFullName", "ada l").unwrap()), vec![1]);
    assert_eq!(id_set(&c.starts_with("byFullName", "ada ").unwrap()), vec![1, 2]);
}

#[test]
fn prefix_entries_move_on_update() {
    let mut c = Collection::default();
    c.define_index(IndexDefinition::prefix("byName", "name"))
        .unwrap();
    c.insert(record(json!({"id": 1, "name": "firat"}))).unwrap();
    c.update(&RecordId::from(1), record(json!({"name": "faruk"})))
        .unwrap();
    assert!(c.starts_with("byName", "fi").unwrap().is_empty());
    assert_eq!(id_set(&c.starts_with("byName", "fa").unwrap()), vec![1]);
}

// ============================================================================
// Module 4: Snapshot / rollback
// ============================================================================

#[test]
fn rollback_restores_removed_record() {
    let mut users = users();
    let before: Vec<Record> = users.all().into_iter().cloned().collect();

    users.snapshot().unwrap();
    assert!(users.remove(&RecordId::from(2)));
    assert_eq!(users.len(), 2);

    assert!(users.rollback().unwrap());
    assert_eq!(users.len(), 3);
    let after: Vec<Record> = users.all().into_iter().cloned().collect();
    assert_eq!(after, before);
    assert!(users.get_one("byEmail", "b@x.com").unwrap().is_some());
}

#[test]
fn rollback_is_last_in_first_out() {
    let mut users = users();
    users.snapshot().unwrap();
    users.remove(&RecordId::from(1));
    users.snapshot().unwrap();
    users.remove(&RecordId::from(2));

    assert!(users.rollback().unwrap());
    assert_eq!(users.len(), 2);
    assert!(users.rollback().unwrap());
    assert_eq!(users.len(), 3);
    assert!(!users.rollback().unwrap());
}

#[test]
fn rollback_restores_index_set() {
    let mut users = users();
    users.snapshot().unwrap();
    users
        .define_index(IndexDefinition::prefix("byEmailPrefix", "email"))
        .unwrap();
    assert!(users.rollback().unwrap());
    assert!(!users.has_index("byEmailPrefix"));
    assert!(users.has_index("byAge"));
}

// ============================================================================
// Module 5: Round trip
// ============================================================================

#[test]
fn serialize_round_trip_preserves_queries() {
    let mut users = users();
    users
        .define_index(IndexDefinition::prefix("byEmailPrefix", "email"))
        .unwrap();

    let restored = Collection::deserialize(&users.serialize().unwrap()).unwrap();
    assert_eq!(restored.len(), users.len());
    assert_eq!(restored.all(), users.all());
    assert_eq!(restored.index_names(), users.index_names());

    for (min, max) in [(0, 100), (25, 30), (31, 31)] {
        assert_eq!(
            restored.between("byAge", min, max, RangeOptions::default()).unwrap(),
            users.between("byAge", min, max, RangeOptions::default()).unwrap()
        );
    }
    for prefix in ["", "a", "b@", "z"] {
        assert_eq!(
            restored.starts_with("byEmailPrefix", prefix).unwrap(),
            users.starts_with("byEmailPrefix", prefix).unwrap()
        );
    }
    assert_eq!(
        restored.get_one("byEmail", "a@x.com").unwrap(),
        users.get_one("byEmail", "a@x.com").unwrap()
    );
}

#[test]
fn extractor_index_cannot_round_trip() {
    let mut c = users();
    c.define_index(IndexDefinition::range(
        "byDomain",
        KeySpec::extractor(|r: &Record| {
            let email = r.get("email").and_then(|v| v.as_str()).unwrap_or_default();
            KeyValue::from(email.split('@').nth(1).unwrap_or_default())
        }),
    ))
    .unwrap();

    let err = Collection::deserialize(&c.serialize().unwrap()).unwrap_err();
    assert!(matches!(err, Error::NonSerializableKeySpec { ref index } if index == "byDomain"));
}

#[test]
fn config_defined_collection_round_trips() {
    let config = CollectionConfig::from_toml_str(
        r#"
primary_key = "sku"

[[index]]
name = "byCategory"
kind = "eq"
field = "category"
"#,
    )
    .unwrap();
    let mut c = Collection::from_config(&config).unwrap();
    c.insert(record(json!({"sku": "A-1", "category": "tools"})))
        .unwrap();

    let restored = Collection::deserialize(&c.serialize().unwrap()).unwrap();
    assert_eq!(restored.primary_key(), "sku");
    assert_eq!(restored.count("byCategory", "tools").unwrap(), 1);
}

// ============================================================================
// Module 6: Constraint failures
// ============================================================================

#[test]
fn unique_violation_changes_nothing() {
    let mut users = users();
    users
        .define_index(IndexDefinition::prefix("byEmailPrefix", "email"))
        .unwrap();
    let before = users.serialize().unwrap();

    let err = users
        .insert(record(json!({"id": 4, "email": "b@x.com", "age": 50})))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UniqueConstraintViolation { ref index, ref existing, .. }
            if index == "byEmail" && *existing == RecordId::from(2)
    ));

    assert_eq!(users.serialize().unwrap(), before);
    assert!(users
        .between("byAge", 50, 50, RangeOptions::default())
        .unwrap()
        .is_empty());
    assert_eq!(users.starts_with("byEmailPrefix", "b@").unwrap().len(), 1);
}

#[test]
fn unique_composite_violation() {
    let mut c = Collection::default();
    c.define_index(IndexDefinition::equality("byCityAge", ["city", "age"]).unique(true))
        .unwrap();
    c.insert(record(json!({"id": 1, "city": "Ankara", "age": 28})))
        .unwrap();
    let err = c
        .insert(record(json!({"id": 2, "city": "Ankara", "age": 28})))
        .unwrap_err();
    assert!(err.is_constraint_violation());
    assert_eq!(c.len(), 1);
    assert_eq!(c.count("byCityAge", json!(["Ankara", 28])).unwrap(), 1);
}

#[test]
fn errors_on_unknown_index_and_kind() {
    let users = users();
    assert!(matches!(
        users.starts_with("byNothing", "a").unwrap_err(),
        Error::IndexNotFound { .. }
    ));
    assert!(matches!(
        users.get_all("byAge", 24).unwrap_err(),
        Error::IndexKindMismatch { expected: "eq", actual: "range", .. }
    ));
    assert!(IndexDefinition::with_kind("x", "a", "hash").is_err());
}
