//! Result normalization.
//!
//! Walks a selection set and the matching result value together. Every object reached through
//! a field with sub-selections is stored once under its data identity, and the field is
//! rewritten to hold that identity (or a list of identities) instead of the object.
//!
//! Fields are processed in selection order, depth first. Fragments returned by the children of
//! a record are merged before the record itself is stored, so the record is the last write for
//! its own identity.

use crate::configuration::Configuration;
use crate::configuration::RecordKeys;
use crate::error::Error;
use crate::error::NormalizeError;
use crate::error::Shape;
use crate::identity::DataId;
use crate::identity::IdField;
use crate::identity::IdentityResolver;
use crate::identity::resolve_identity;
use crate::json_ext::ByteString;
use crate::json_ext::Object;
use crate::json_ext::Path;
use crate::json_ext::PathElement;
use crate::json_ext::Value;
use crate::json_ext::ValueExt;
use crate::spec::Query;
use crate::spec::Selection;
use crate::store::Store;

/// Flattens results into a [`Store`].
///
/// Holds no state between calls: every normalization starts from an empty store.
#[derive(Debug, Clone)]
pub struct Normalizer<R = IdField> {
    resolver: R,
    root_id: ByteString,
    record_keys: RecordKeys,
    max_depth: usize,
}

impl Normalizer<IdField> {
    pub fn new(configuration: &Configuration) -> Self {
        Self::with_resolver(configuration, IdField::new(configuration.id_field()))
    }
}

impl Default for Normalizer<IdField> {
    fn default() -> Self {
        Self::new(&Configuration::default())
    }
}

/// How a field is normalized, decided once from the selection and the value.
enum FieldShape<'a> {
    Leaf,
    Null,
    Object(&'a [Selection], &'a Object),
    List(&'a [Selection], &'a [Value]),
}

impl<'a> FieldShape<'a> {
    fn classify(
        selection: &'a Selection,
        value: &'a Value,
        path: &Path,
    ) -> Result<Self, NormalizeError> {
        match (&selection.selection_set, value) {
            (None, value) if value.contains_object() => Err(NormalizeError::ShapeMismatch {
                path: path.clone(),
                expected: Shape::Scalar,
                found: Shape::of(value),
            }),
            (None, _) => Ok(FieldShape::Leaf),
            (Some(_), Value::Null) => Ok(FieldShape::Null),
            (Some(selection_set), Value::Object(object)) => {
                Ok(FieldShape::Object(selection_set, object))
            }
            (Some(selection_set), Value::Array(items)) => Ok(FieldShape::List(selection_set, items)),
            (Some(_), value) => Err(NormalizeError::ShapeMismatch {
                path: path.clone(),
                expected: Shape::Composite,
                found: Shape::of(value),
            }),
        }
    }
}

impl<R> Normalizer<R>
where
    R: IdentityResolver,
{
    /// Uses `resolver` to find the identity of objects instead of the configured `id_field`.
    pub fn with_resolver(configuration: &Configuration, resolver: R) -> Self {
        Self {
            resolver,
            root_id: configuration.root_id().into(),
            record_keys: configuration.record_keys(),
            max_depth: configuration.max_depth(),
        }
    }

    /// Normalizes a whole result.
    ///
    /// The root record is stored under the result's own identity if it has one, and under the
    /// configured root identity otherwise.
    #[tracing::instrument(skip_all, level = "trace")]
    pub fn normalize_result(
        &self,
        selection_set: &[Selection],
        result: &Value,
    ) -> Result<Store, NormalizeError> {
        let object = root_object(result)?;
        let root = match self.resolver.real_identity(object) {
            Some(id) => DataId::real(id),
            None => DataId::root(self.root_id.clone()),
        };
        self.normalize_root(selection_set, object, &root)
    }

    /// Normalizes a whole result, storing the root record under `root`.
    #[tracing::instrument(skip_all, level = "trace", fields(root = %root))]
    pub fn normalize_result_with_id(
        &self,
        selection_set: &[Selection],
        result: &Value,
        root: &DataId,
    ) -> Result<Store, NormalizeError> {
        let object = root_object(result)?;
        self.normalize_root(selection_set, object, root)
    }

    /// Parses `source` (see [`Query::parse`]) and normalizes `result` against it.
    pub fn normalize_document(&self, source: &str, result: &Value) -> Result<Store, Error> {
        let query = Query::parse(source)?;
        Ok(self.normalize_result(&query.selection_set, result)?)
    }

    /// Normalizes `object`, identified by `current`.
    ///
    /// Returns the rewritten record, which is also stored under `current`, and the store of
    /// every record found in the subtree.
    pub fn normalize(
        &self,
        selection_set: &[Selection],
        object: &Object,
        current: &DataId,
    ) -> Result<(Object, Store), NormalizeError> {
        self.normalize_selection_set(selection_set, object, current, &mut Path::default(), 0)
    }

    fn normalize_root(
        &self,
        selection_set: &[Selection],
        object: &Object,
        root: &DataId,
    ) -> Result<Store, NormalizeError> {
        let (_, store) = self.normalize(selection_set, object, root)?;
        tracing::debug!(
            root = root.as_str(),
            records = store.len(),
            collisions = store.collisions(),
            "normalized result"
        );
        Ok(store)
    }

    fn normalize_selection_set(
        &self,
        selection_set: &[Selection],
        input: &Object,
        current: &DataId,
        path: &mut Path,
        depth: usize,
    ) -> Result<(Object, Store), NormalizeError> {
        self.check_depth(path, depth)?;

        let mut record = Object::new();
        let mut store = Store::new();
        for selection in selection_set {
            let response_key = selection.response_key();
            let Some(value) = input.get(response_key.as_str()) else {
                if selection.conditional {
                    continue;
                }
                return Err(NormalizeError::MissingField {
                    path: path.join(PathElement::Key(response_key.as_str().to_string())),
                });
            };

            path.push(PathElement::Key(response_key.as_str().to_string()));
            let (value, fragment) = self.normalize_field(selection, value, current, path, depth)?;
            path.pop();

            store.merge(fragment);
            record.insert(self.record_key(selection).clone(), value);
        }

        store.insert(current.clone(), record.clone());
        Ok((record, store))
    }

    fn normalize_field(
        &self,
        selection: &Selection,
        value: &Value,
        parent: &DataId,
        path: &mut Path,
        depth: usize,
    ) -> Result<(Value, Store), NormalizeError> {
        match FieldShape::classify(selection, value, path)? {
            FieldShape::Leaf => Ok((value.clone(), Store::new())),
            FieldShape::Null => Ok((Value::Null, Store::new())),
            FieldShape::Object(selection_set, object) => {
                let (id, store) = self.normalize_entity(
                    selection_set,
                    &selection.name,
                    object,
                    parent,
                    &[],
                    path,
                    depth,
                )?;
                Ok((Value::String(id.into()), store))
            }
            FieldShape::List(selection_set, items) => self.normalize_list(
                selection_set,
                &selection.name,
                items,
                parent,
                &mut Vec::new(),
                path,
                depth + 1,
            ),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn normalize_entity(
        &self,
        selection_set: &[Selection],
        field_name: &ByteString,
        object: &Object,
        parent: &DataId,
        indexes: &[usize],
        path: &mut Path,
        depth: usize,
    ) -> Result<(DataId, Store), NormalizeError> {
        let id = resolve_identity(
            &self.resolver,
            object,
            parent,
            field_name.as_str(),
            indexes,
        );
        let (_, store) =
            self.normalize_selection_set(selection_set, object, &id, path, depth + 1)?;
        Ok((id, store))
    }

    #[allow(clippy::too_many_arguments)]
    fn normalize_list(
        &self,
        selection_set: &[Selection],
        field_name: &ByteString,
        items: &[Value],
        parent: &DataId,
        indexes: &mut Vec<usize>,
        path: &mut Path,
        depth: usize,
    ) -> Result<(Value, Store), NormalizeError> {
        self.check_depth(path, depth)?;

        let mut store = Store::new();
        let mut output = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            indexes.push(index);
            path.push(PathElement::Index(index));
            let value = match item {
                Value::Null => Value::Null,
                Value::Object(object) => {
                    let (id, fragment) = self.normalize_entity(
                        selection_set,
                        field_name,
                        object,
                        parent,
                        indexes,
                        path,
                        depth,
                    )?;
                    store.merge(fragment);
                    Value::String(id.into())
                }
                Value::Array(inner) => {
                    let (value, fragment) = self.normalize_list(
                        selection_set,
                        field_name,
                        inner,
                        parent,
                        indexes,
                        path,
                        depth + 1,
                    )?;
                    store.merge(fragment);
                    value
                }
                other => {
                    return Err(NormalizeError::ShapeMismatch {
                        path: path.clone(),
                        expected: Shape::Object,
                        found: Shape::of(other),
                    });
                }
            };
            path.pop();
            indexes.pop();
            output.push(value);
        }
        Ok((Value::Array(output), store))
    }

    fn record_key<'s>(&self, selection: &'s Selection) -> &'s ByteString {
        match self.record_keys {
            RecordKeys::ResponseKey => selection.response_key(),
            RecordKeys::FieldName => &selection.name,
        }
    }

    fn check_depth(&self, path: &Path, depth: usize) -> Result<(), NormalizeError> {
        if depth > self.max_depth {
            tracing::error!(
                "normalization recursion limit({}) exceeded at {path}",
                self.max_depth
            );
            return Err(NormalizeError::RecursionLimitExceeded { path: path.clone() });
        }
        Ok(())
    }
}

fn root_object(result: &Value) -> Result<&Object, NormalizeError> {
    result
        .as_object()
        .ok_or_else(|| NormalizeError::ShapeMismatch {
            path: Path::default(),
            expected: Shape::Object,
            found: Shape::of(result),
        })
}
