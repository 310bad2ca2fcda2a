//! Performance oriented JSON manipulation.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
pub use serde_json_bytes::ByteString;
pub use serde_json_bytes::Value;

/// A JSON object.
pub type Object = serde_json_bytes::Map<ByteString, Value>;

/// A path into a result value, made of object keys and list indexes.
///
/// Displayed as `/hero/friends/1/name`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<PathElement>);

/// One step of a [`Path`].
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathElement {
    /// A list index.
    Index(usize),

    /// An object key.
    Key(String),
}

impl Path {
    pub(crate) fn push(&mut self, element: PathElement) {
        self.0.push(element)
    }

    pub(crate) fn pop(&mut self) -> Option<PathElement> {
        self.0.pop()
    }

    /// Returns a copy of this path with `element` appended.
    pub(crate) fn join(&self, element: PathElement) -> Path {
        let mut path = self.clone();
        path.push(element);
        path
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&PathElement> {
        self.0.last()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for element in &self.0 {
            write!(f, "/")?;
            match element {
                PathElement::Index(index) => write!(f, "{index}")?,
                PathElement::Key(key) => write!(f, "{key}")?,
            }
        }
        Ok(())
    }
}

/// Extension trait for [`serde_json_bytes::Value`].
pub(crate) trait ValueExt {
    /// Returns `true` if the value is an object, or a list that contains an object at any depth.
    fn contains_object(&self) -> bool;

    /// Renders a scalar the way it is written in JSON, strings excluded.
    fn to_key_string(&self) -> Option<ByteString>;
}

impl ValueExt for Value {
    fn contains_object(&self) -> bool {
        match self {
            Value::Object(_) => true,
            Value::Array(items) => items.iter().any(|item| item.contains_object()),
            _ => false,
        }
    }

    fn to_key_string(&self) -> Option<ByteString> {
        match self {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string().into()),
            Value::Bool(b) => Some(b.to_string().into()),
            other => serde_json::to_string(other).ok().map(ByteString::from),
        }
    }
}
