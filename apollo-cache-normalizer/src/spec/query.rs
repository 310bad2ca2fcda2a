//! Query processing.
//!
//! Turns GraphQL source text into the flat field tree normalization walks.

use apollo_compiler::ast;

use super::Fragments;
use super::Selection;
use super::SpecError;

/// The selection of one operation or fragment of a GraphQL document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub name: Option<String>,
    pub selection_set: Vec<Selection>,
}

impl Query {
    /// Parses a document and selects its first operation, or its first fragment when it has no
    /// operation.
    pub fn parse(source: impl Into<String>) -> Result<Self, SpecError> {
        Self::parse_named(source, None)
    }

    /// Parses a document and selects the operation or fragment called `name`.
    #[tracing::instrument(skip_all, level = "trace")]
    pub fn parse_named(source: impl Into<String>, name: Option<&str>) -> Result<Self, SpecError> {
        let document = ast::Document::parse(source, "query.graphql").map_err(|invalid| {
            let errors = invalid.errors.to_string();
            tracing::debug!("parsing error(s): {}", errors);
            SpecError::ParsingError(errors)
        })?;
        let fragments = Fragments::from_ast(&document);

        let (name, selection_set, mut spreads) = match name {
            Some(name) => find_named(&document, name)
                .ok_or_else(|| SpecError::UnknownDefinition(name.to_string()))?,
            None => find_first(&document).ok_or(SpecError::NoDefinition)?,
        };

        let selection_set = Selection::from_ast(selection_set, &fragments, 0, &mut spreads)?;
        Ok(Query {
            name,
            selection_set,
        })
    }
}

type Definition<'a> = (Option<String>, &'a [ast::Selection], Vec<String>);

fn operation(operation: &ast::OperationDefinition) -> Definition<'_> {
    (
        operation.name.as_ref().map(|name| name.to_string()),
        operation.selection_set.as_slice(),
        Vec::new(),
    )
}

// a fragment is on the spread stack while its own selections are expanded
fn fragment(fragment: &ast::FragmentDefinition) -> Definition<'_> {
    (
        Some(fragment.name.to_string()),
        fragment.selection_set.as_slice(),
        vec![fragment.name.to_string()],
    )
}

fn find_named<'a>(document: &'a ast::Document, name: &str) -> Option<Definition<'a>> {
    document
        .definitions
        .iter()
        .find_map(|definition| match definition {
            ast::Definition::OperationDefinition(def)
                if def.name.as_ref().is_some_and(|n| n.as_str() == name) =>
            {
                Some(operation(def))
            }
            ast::Definition::FragmentDefinition(def) if def.name.as_str() == name => {
                Some(fragment(def))
            }
            _ => None,
        })
}

fn find_first(document: &ast::Document) -> Option<Definition<'_>> {
    document
        .definitions
        .iter()
        .find_map(|definition| match definition {
            ast::Definition::OperationDefinition(def) => Some(operation(def)),
            _ => None,
        })
        .or_else(|| {
            document
                .definitions
                .iter()
                .find_map(|definition| match definition {
                    ast::Definition::FragmentDefinition(def) => Some(fragment(def)),
                    _ => None,
                })
        })
}
