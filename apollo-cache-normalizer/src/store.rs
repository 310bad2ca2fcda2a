//! The flat identity to record mapping produced by normalization.

use std::collections::HashMap;

use indexmap::IndexMap;
use indexmap::map::Entry;
use itertools::Itertools;
use serde::Serialize;
use serde::Serializer;

use crate::identity::DataId;
use crate::identity::IdentityKind;
use crate::json_ext::ByteString;
use crate::json_ext::Object;
use crate::json_ext::Value;

/// Normalized records keyed by data identity.
///
/// Records are kept in the order their identity was first stored. A store built by one
/// normalization pass has no dangling references: every identity used as a pointer inside a
/// record is also a key of the store.
#[derive(Debug, Clone, Default)]
pub struct Store {
    records: IndexMap<ByteString, Object>,
    kinds: HashMap<ByteString, IdentityKind>,
    collisions: usize,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Object> {
        self.records.get(id)
    }

    pub fn contains_key(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// The kind of identity a record was stored under, as first seen.
    pub fn kind(&self, id: &str) -> Option<IdentityKind> {
        self.kinds.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Object)> {
        self.records.iter().map(|(id, record)| (id.as_str(), record))
    }

    /// Identities that were written more than once with different field sets, or by both a
    /// real and a derived identity.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Stores `record` under `id`.
    ///
    /// If the identity is already present the records are merged shallowly: every field of
    /// `record` overwrites the existing one, fields it does not carry are kept, and pointers are
    /// not followed.
    pub fn insert(&mut self, id: DataId, record: Object) {
        let kind = id.kind();
        let key: ByteString = id.into();
        match self.records.entry(key.clone()) {
            Entry::Vacant(entry) => {
                tracing::trace!(id = key.as_str(), fields = record.len(), "storing record");
                entry.insert(record);
                self.kinds.insert(key, kind);
            }
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                let previous_kind = self.kinds.get(&key).copied().unwrap_or(kind);
                if is_real(previous_kind) != is_real(kind) {
                    self.collisions += 1;
                    tracing::warn!(
                        id = key.as_str(),
                        ?previous_kind,
                        ?kind,
                        "a real identity and a derived identity resolve to the same key"
                    );
                } else if !same_fields(existing, &record) {
                    self.collisions += 1;
                    tracing::warn!(
                        id = key.as_str(),
                        existing = %existing.keys().map(|k| k.as_str()).join(","),
                        incoming = %record.keys().map(|k| k.as_str()).join(","),
                        "identity collision: merging records with different fields, check the identity field configuration"
                    );
                }
                for (field, value) in record {
                    existing.insert(field, value);
                }
            }
        }
    }

    /// Folds `other` into this store, record by record, in `other`'s order.
    pub fn merge(&mut self, other: Store) {
        let Store {
            records,
            kinds,
            collisions,
        } = other;
        self.collisions += collisions;
        for (key, record) in records {
            let id = match kinds.get(&key).copied() {
                Some(IdentityKind::Synthetic) => DataId::synthetic(key),
                Some(IdentityKind::Root) => DataId::root(key),
                Some(IdentityKind::Real) | None => DataId::real(key),
            };
            self.insert(id, record);
        }
    }

    /// The store as a JSON object of records.
    pub fn into_object(self) -> Object {
        self.records
            .into_iter()
            .map(|(id, record)| (id, Value::Object(record)))
            .collect()
    }
}

fn is_real(kind: IdentityKind) -> bool {
    matches!(kind, IdentityKind::Real)
}

fn same_fields(left: &Object, right: &Object) -> bool {
    left.len() == right.len() && left.keys().all(|key| right.contains_key(key.as_str()))
}

impl PartialEq for Store {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl Serialize for Store {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.records.iter())
    }
}
