//! Test helpers: reading a store back into a result tree.

use apollo_cache_normalizer::Selection;
use apollo_cache_normalizer::Store;
use apollo_cache_normalizer::json_ext::Object;
use apollo_cache_normalizer::json_ext::Value;

pub fn object(value: Value) -> Object {
    value
        .as_object()
        .cloned()
        .expect("fixture should be an object")
}

/// Rebuilds the tree selected by `selection_set` from the record stored under `id`,
/// following identity pointers. Panics on a dangling pointer.
pub fn denormalize(store: &Store, selection_set: &[Selection], id: &str) -> Value {
    let record = store
        .get(id)
        .unwrap_or_else(|| panic!("dangling reference to {id}"));
    let mut output = Object::new();
    for selection in selection_set {
        let key = selection.response_key();
        let value = record
            .get(key.as_str())
            .unwrap_or_else(|| panic!("record {id} has no field {}", key.as_str()));
        let value = match &selection.selection_set {
            None => value.clone(),
            Some(selection_set) => follow(store, selection_set, value),
        };
        output.insert(key.clone(), value);
    }
    Value::Object(output)
}

fn follow(store: &Store, selection_set: &[Selection], value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(id) => denormalize(store, selection_set, id.as_str()),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| follow(store, selection_set, item))
                .collect(),
        ),
        other => panic!("expected an identity, found {other:?}"),
    }
}
