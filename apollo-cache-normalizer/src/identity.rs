//! Data identities: the keys under which entities are stored.

use std::fmt;
use std::fmt::Write;

use serde::Serialize;

use crate::json_ext::ByteString;
use crate::json_ext::Object;
use crate::json_ext::ValueExt;

/// Default key of the result object holding its identity.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Default identity of a root object without an identity of its own.
pub const ROOT_QUERY: &str = "ROOT_QUERY";

/// Where a [`DataId`] comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    /// Read from the object itself.
    Real,
    /// Derived from the position of the object under its parent.
    Synthetic,
    /// Assigned by the caller to the top-level object.
    Root,
}

/// The unique key of one logical entity in a [`Store`](crate::Store).
///
/// Two identities are the same entity when their keys are equal, whatever their kind. The kind
/// is kept so that a real id that happens to spell out a synthetic path can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataId {
    key: ByteString,
    kind: IdentityKind,
}

impl DataId {
    /// An identity read from the object.
    pub fn real(key: impl Into<ByteString>) -> Self {
        Self {
            key: key.into(),
            kind: IdentityKind::Real,
        }
    }

    /// A caller-assigned root identity.
    pub fn root(key: impl Into<ByteString>) -> Self {
        Self {
            key: key.into(),
            kind: IdentityKind::Root,
        }
    }

    /// `<parent>.<field_name>` followed by one `.<index>` per enclosing list.
    pub fn from_path(parent: &DataId, field_name: &str, indexes: &[usize]) -> Self {
        let mut key = format!("{}.{field_name}", parent.key.as_str());
        for index in indexes {
            let _ = write!(&mut key, ".{index}");
        }
        Self::synthetic(key)
    }

    pub(crate) fn synthetic(key: impl Into<ByteString>) -> Self {
        Self {
            key: key.into(),
            kind: IdentityKind::Synthetic,
        }
    }

    pub fn as_str(&self) -> &str {
        self.key.as_str()
    }

    pub fn kind(&self) -> IdentityKind {
        self.kind
    }
}

impl fmt::Display for DataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key.as_str())
    }
}

impl From<DataId> for ByteString {
    fn from(id: DataId) -> Self {
        id.key
    }
}

/// Finds the identity an object carries by itself, if any.
pub trait IdentityResolver {
    /// Returns the real identity of `object`, or `None` when a synthetic one must be derived.
    fn real_identity(&self, object: &Object) -> Option<ByteString>;
}

/// Reads the identity from a fixed key of the result object.
///
/// The key is looked up literally in the result: aliases in the selection play no part, so an
/// object selected with `{ id key: id }` is stored under the value of its `id` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdField {
    field: ByteString,
}

impl IdField {
    pub fn new(field: impl Into<ByteString>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl Default for IdField {
    fn default() -> Self {
        Self::new(DEFAULT_ID_FIELD)
    }
}

impl IdentityResolver for IdField {
    fn real_identity(&self, object: &Object) -> Option<ByteString> {
        object
            .get(self.field.as_str())
            .and_then(|value| value.to_key_string())
    }
}

/// Decides the identity of `object`, reached through `field_name` under `parent`.
///
/// `indexes` holds the position of the object in each list enclosing it, outermost first, and
/// is empty for a singular field.
pub fn resolve_identity(
    resolver: &impl IdentityResolver,
    object: &Object,
    parent: &DataId,
    field_name: &str,
    indexes: &[usize],
) -> DataId {
    match resolver.real_identity(object) {
        Some(id) => DataId::real(id),
        None => DataId::from_path(parent, field_name, indexes),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json_bytes::Value;
    use serde_json_bytes::json;

    use super::*;

    fn object(value: Value) -> Object {
        value.as_object().cloned().unwrap()
    }

    #[rstest]
    #[case::string(json!({"id": "abcde"}), "abcde")]
    #[case::number(json!({"id": 42}), "42")]
    #[case::boolean(json!({"id": true}), "true")]
    fn real_identity_wins(#[case] value: Value, #[case] expected: &str) {
        let parent = DataId::real("abcd");
        let id = resolve_identity(&IdField::default(), &object(value), &parent, "nestedObj", &[]);
        assert_eq!(id.as_str(), expected);
        assert_eq!(id.kind(), IdentityKind::Real);
    }

    #[rstest]
    #[case::missing(json!({"stringField": "x"}), &[], "abcd.nestedObj")]
    #[case::null(json!({"id": null}), &[], "abcd.nestedObj")]
    #[case::list_element(json!({}), &[1], "abcd.nestedObj.1")]
    #[case::nested_list_element(json!({}), &[0, 2], "abcd.nestedObj.0.2")]
    fn synthetic_identity(
        #[case] value: Value,
        #[case] indexes: &[usize],
        #[case] expected: &str,
    ) {
        let parent = DataId::real("abcd");
        let id = resolve_identity(
            &IdField::default(),
            &object(value),
            &parent,
            "nestedObj",
            indexes,
        );
        assert_eq!(id.as_str(), expected);
        assert_eq!(id.kind(), IdentityKind::Synthetic);
    }

    #[test]
    fn aliased_id_key_is_not_an_identity() {
        // `{ otherId: id }` puts the identity under `otherId`, which is not consulted
        let parent = DataId::root(ROOT_QUERY);
        let id = resolve_identity(
            &IdField::default(),
            &object(json!({"otherId": "abcd"})),
            &parent,
            "item",
            &[],
        );
        assert_eq!(id.to_string(), "ROOT_QUERY.item");
    }

    #[test]
    fn custom_id_field() {
        let parent = DataId::root(ROOT_QUERY);
        let resolver = IdField::new("uuid");
        let value = object(json!({"id": "ignored", "uuid": "u-1"}));
        assert_eq!(
            resolve_identity(&resolver, &value, &parent, "item", &[]).as_str(),
            "u-1"
        );
    }
}
