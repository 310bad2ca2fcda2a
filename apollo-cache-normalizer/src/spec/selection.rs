use apollo_compiler::ast;
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::ByteString;

use super::Fragments;
use super::SpecError;

/// One selected field: its schema name, the key it appears under in the result, and the
/// fields selected below it when it is an object or a list of objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub name: ByteString,
    pub alias: Option<ByteString>,
    pub selection_set: Option<Vec<Selection>>,
    /// Set when a `@skip` or `@include` condition depends on a variable: the field may then be
    /// absent from the result.
    #[serde(default)]
    pub conditional: bool,
}

impl Selection {
    /// A leaf field.
    pub fn field(name: impl Into<ByteString>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            selection_set: None,
            conditional: false,
        }
    }

    /// A field with nested selections.
    pub fn object(name: impl Into<ByteString>, selection_set: Vec<Selection>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            selection_set: Some(selection_set),
            conditional: false,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<ByteString>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_conditional(mut self, conditional: bool) -> Self {
        self.conditional = conditional;
        self
    }

    /// The key under which this field appears in the result.
    pub fn response_key(&self) -> &ByteString {
        self.alias.as_ref().unwrap_or(&self.name)
    }

    pub fn is_leaf(&self) -> bool {
        self.selection_set.is_none()
    }

    /// Converts an AST selection set, flattening fragment spreads and inline fragments into the
    /// enclosing field list. Fields sharing a response key are merged into one.
    pub(crate) fn from_ast(
        selection_set: &[ast::Selection],
        fragments: &Fragments<'_>,
        mut count: usize,
        spreads: &mut Vec<String>,
    ) -> Result<Vec<Self>, SpecError> {
        // The RECURSION_LIMIT is chosen to be:
        //   < # expected to cause stack overflow &&
        //   > # expected in a legitimate query
        const RECURSION_LIMIT: usize = 512;
        if count > RECURSION_LIMIT {
            tracing::error!("selection processing recursion limit({RECURSION_LIMIT}) exceeded");
            return Err(SpecError::RecursionLimitExceeded);
        }
        count += 1;

        let mut output = Vec::with_capacity(selection_set.len());
        for selection in selection_set {
            match selection {
                ast::Selection::Field(field) => {
                    let inclusion = Inclusion::parse(&field.directives);
                    if inclusion == Inclusion::Never {
                        continue;
                    }
                    let selection_set = if field.selection_set.is_empty() {
                        None
                    } else {
                        Some(Self::from_ast(
                            &field.selection_set,
                            fragments,
                            count,
                            spreads,
                        )?)
                    };
                    output.push(Self {
                        name: field.name.as_str().into(),
                        alias: field.alias.as_ref().map(|alias| alias.as_str().into()),
                        selection_set,
                        conditional: inclusion == Inclusion::Conditional,
                    });
                }
                ast::Selection::InlineFragment(inline_fragment) => {
                    let inclusion = Inclusion::parse(&inline_fragment.directives);
                    if inclusion == Inclusion::Never {
                        continue;
                    }
                    let expanded = Self::from_ast(
                        &inline_fragment.selection_set,
                        fragments,
                        count,
                        spreads,
                    )?;
                    output.extend(inclusion.apply(expanded));
                }
                ast::Selection::FragmentSpread(fragment_spread) => {
                    let inclusion = Inclusion::parse(&fragment_spread.directives);
                    if inclusion == Inclusion::Never {
                        continue;
                    }
                    let name = fragment_spread.fragment_name.as_str();
                    if spreads.iter().any(|spread| spread == name) {
                        return Err(SpecError::FragmentCycle(name.to_string()));
                    }
                    let fragment = fragments
                        .get(name)
                        .ok_or_else(|| SpecError::UnknownFragment(name.to_string()))?;
                    spreads.push(name.to_string());
                    let expanded =
                        Self::from_ast(&fragment.selection_set, fragments, count, spreads);
                    spreads.pop();
                    output.extend(inclusion.apply(expanded?));
                }
            }
        }
        Ok(merge_fields(output))
    }

    /// Merges a field selected again under the same response key: the sub-selections are
    /// combined and the field is conditional only if every occurrence is.
    fn merge(&mut self, other: Selection) {
        self.conditional &= other.conditional;
        if let (Some(selection_set), Some(other)) = (&mut self.selection_set, other.selection_set)
        {
            let mut combined = std::mem::take(selection_set);
            combined.extend(other);
            *selection_set = merge_fields(combined);
        }
    }
}

fn merge_fields(selections: Vec<Selection>) -> Vec<Selection> {
    let mut merged: IndexMap<ByteString, Selection> = IndexMap::with_capacity(selections.len());
    for selection in selections {
        match merged.entry(selection.response_key().clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().merge(selection),
            Entry::Vacant(entry) => {
                entry.insert(selection);
            }
        }
    }
    merged.into_values().collect()
}

/// Whether `@skip` and `@include` keep a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inclusion {
    Always,
    Never,
    /// Decided by a variable, which is not known when normalizing.
    Conditional,
}

impl Inclusion {
    fn parse(directives: &ast::DirectiveList) -> Self {
        let mut inclusion = Inclusion::Always;
        for directive in &directives.0 {
            let skip = match directive.name.as_str() {
                "skip" => true,
                "include" => false,
                _ => continue,
            };
            let condition = directive
                .arguments
                .iter()
                .find(|argument| argument.name == "if")
                .map(|argument| &*argument.value);
            match condition {
                Some(ast::Value::Boolean(value)) if *value == skip => return Inclusion::Never,
                Some(ast::Value::Variable(_)) => inclusion = Inclusion::Conditional,
                _ => {}
            }
        }
        inclusion
    }

    /// Fields pulled out of a conditional fragment become conditional themselves.
    fn apply(self, selections: Vec<Selection>) -> impl Iterator<Item = Selection> {
        selections.into_iter().map(move |selection| {
            if self == Inclusion::Conditional {
                selection.with_conditional(true)
            } else {
                selection
            }
        })
    }
}
