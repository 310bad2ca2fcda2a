//! Selection model and GraphQL document handling.
//!
//! Normalization only needs, for every selected field, its name, its alias and the fields
//! selected below it. Type conditions are irrelevant and fragments are flattened away.

mod fragments;
mod query;
mod selection;

use displaydoc::Display;
pub(crate) use fragments::*;
pub use query::Query;
pub use selection::Selection;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// GraphQL parsing errors.
#[derive(Error, Debug, Display, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SpecError {
    /// parsing error: {0}
    ParsingError(String),
    /// the document has no operation or fragment definition
    NoDefinition,
    /// unknown operation or fragment named "{0}"
    UnknownDefinition(String),
    /// unknown fragment named "{0}"
    UnknownFragment(String),
    /// fragment "{0}" spreads itself
    FragmentCycle(String),
    /// selection processing recursion limit exceeded
    RecursionLimitExceeded,
}

impl SpecError {
    pub fn extension_code(&self) -> &'static str {
        match self {
            SpecError::ParsingError(_) => "PARSING_ERROR",
            SpecError::NoDefinition => "GRAPHQL_VALIDATION_FAILED",
            SpecError::UnknownDefinition(_) => "GRAPHQL_UNKNOWN_OPERATION_NAME",
            SpecError::UnknownFragment(_) => "GRAPHQL_VALIDATION_FAILED",
            SpecError::FragmentCycle(_) => "GRAPHQL_VALIDATION_FAILED",
            SpecError::RecursionLimitExceeded => "RECURSION_LIMIT_EXCEEDED",
        }
    }
}
