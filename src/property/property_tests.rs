//! Property tests for property module
//!
//! Flattening of nested resource JSON into dotted keys, and the coercions
//! the evaluator relies on.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use crate::property::{PropertyBag, PropertyValue};

// ═══════════════════════════════════════════════════════════════════════════
// Strategy generators for property tests
// ═══════════════════════════════════════════════════════════════════════════

/// Keys without dots so every flattened path is unambiguous
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z_]{1,8}"
}

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1000..=1000i64).prop_map(|n| json!(n)),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
        prop::collection::vec("[a-z]{0,6}", 0..=4).prop_map(|items| json!(items)),
    ]
}

/// Nested objects with scalar leaves
fn document_strategy() -> impl Strategy<Value = Value> {
    let leaf = scalar_strategy();
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop::collection::btree_map(key_strategy(), inner, 0..=4)
            .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>()))
    })
}

fn object_strategy() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(key_strategy(), document_strategy(), 0..=4)
        .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>()))
}

/// Count scalar leaves, descending into objects only
fn count_leaves(value: &Value) -> usize {
    match value {
        Value::Object(map) => map.values().map(count_leaves).sum(),
        _ => 1,
    }
}

/// Follow a dotted path through nested objects
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| current.get(key))
}

// ═══════════════════════════════════════════════════════════════════════════
// Property Tests
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// Every scalar leaf becomes exactly one bag entry
    #[test]
    fn prop_flatten_keeps_every_leaf(document in object_strategy()) {
        let bag = PropertyBag::from_json(&document).unwrap();
        prop_assert_eq!(bag.len(), count_leaves(&document));
    }

    /// Each dotted key resolves back to the value it came from
    #[test]
    fn prop_flatten_paths_resolve(document in object_strategy()) {
        let bag = PropertyBag::from_json(&document).unwrap();
        for (path, value) in bag.iter() {
            let original = lookup(&document, path);
            prop_assert!(original.is_some(), "Path {} not in source", path);
            let converted = PropertyValue::from_json(original.unwrap());
            prop_assert_eq!(converted.as_ref(), Some(value));
        }
    }

    /// Non-objects are rejected at the top level
    #[test]
    fn prop_non_object_rejected(value in scalar_strategy()) {
        prop_assert!(PropertyBag::from_json(&value).is_err());
    }

    /// Integers survive the trip through strings for numeric comparison
    #[test]
    fn prop_numeric_strings_coerce(n in -1_000_000..=1_000_000i64) {
        let value = PropertyValue::String(n.to_string());
        prop_assert_eq!(value.as_number(), Some(n as f64));
    }

    /// Emptiness agrees with the JSON source
    #[test]
    fn prop_is_empty_matches_source(value in scalar_strategy()) {
        let expected = match &value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        };
        let converted = PropertyValue::from_json(&value).unwrap();
        prop_assert_eq!(converted.is_empty_value(), expected);
    }
}
