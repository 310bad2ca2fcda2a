//! Normalization errors.
use displaydoc::Display;
use serde::Serialize;
use thiserror::Error;

use crate::json_ext::Path;
use crate::json_ext::Value;
use crate::json_ext::ValueExt;
use crate::spec::SpecError;

/// The shape of a value, as expected by a selection or as observed in a result.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// a scalar
    Scalar,
    /// null
    Null,
    /// an object
    Object,
    /// a list
    List,
    /// a list of objects
    ObjectList,
    /// an object or a list of objects
    Composite,
}

impl Shape {
    pub(crate) fn of(value: &Value) -> Self {
        match value {
            Value::Null => Shape::Null,
            Value::Object(_) => Shape::Object,
            Value::Array(_) if value.contains_object() => Shape::ObjectList,
            Value::Array(_) => Shape::List,
            _ => Shape::Scalar,
        }
    }
}

/// Error types for normalization.
///
/// Every variant is a contract violation between the selection and the result: nothing is
/// retried and the partially built store is discarded.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum NormalizeError {
    /// expected {expected} at '{path}' but found {found}
    ShapeMismatch {
        /// Where in the result the mismatch was found.
        path: Path,
        /// What the selection requires.
        expected: Shape,
        /// What the result holds.
        found: Shape,
    },

    /// selected field '{path}' is missing from the result
    MissingField {
        /// The selected field.
        path: Path,
    },

    /// normalization recursion limit exceeded at '{path}'
    RecursionLimitExceeded {
        /// Where the limit was reached.
        path: Path,
    },
}

impl NormalizeError {
    /// Machine readable code, in the style of GraphQL error extensions.
    pub fn extension_code(&self) -> &'static str {
        match self {
            NormalizeError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            NormalizeError::MissingField { .. } => "MISSING_FIELD",
            NormalizeError::RecursionLimitExceeded { .. } => "RECURSION_LIMIT_EXCEEDED",
        }
    }

    /// The path of the offending value.
    pub fn path(&self) -> &Path {
        match self {
            NormalizeError::ShapeMismatch { path, .. }
            | NormalizeError::MissingField { path }
            | NormalizeError::RecursionLimitExceeded { path } => path,
        }
    }
}

/// Errors of normalizing a result against GraphQL source text.
#[derive(Error, Display, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// {0}
    Spec(#[from] SpecError),
    /// {0}
    Normalize(#[from] NormalizeError),
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;
    use serde_json_bytes::json;

    use super::*;
    use crate::json_ext::PathElement;

    fn path() -> Path {
        Path(vec![
            PathElement::Key("nestedArray".to_string()),
            PathElement::Index(1),
        ])
    }

    #[test]
    fn display() {
        let error = NormalizeError::ShapeMismatch {
            path: path(),
            expected: Shape::Composite,
            found: Shape::Scalar,
        };
        assert_snapshot!(error.to_string(), @"expected an object or a list of objects at '/nestedArray/1' but found a scalar");

        let error = NormalizeError::MissingField { path: path() };
        assert_snapshot!(error.to_string(), @"selected field '/nestedArray/1' is missing from the result");
    }

    #[test]
    fn codes() {
        let error = NormalizeError::RecursionLimitExceeded { path: path() };
        assert_eq!(error.extension_code(), "RECURSION_LIMIT_EXCEEDED");
        assert_eq!(error.path(), &path());
    }

    #[test]
    fn shape_of_values() {
        assert_eq!(Shape::of(&json!(null)), Shape::Null);
        assert_eq!(Shape::of(&json!(1.5)), Shape::Scalar);
        assert_eq!(Shape::of(&json!({})), Shape::Object);
        assert_eq!(Shape::of(&json!([])), Shape::List);
        assert_eq!(Shape::of(&json!([null, {}])), Shape::ObjectList);
    }
}
