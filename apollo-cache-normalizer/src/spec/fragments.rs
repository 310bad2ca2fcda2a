use std::collections::HashMap;

use apollo_compiler::ast;

/// Fragment definitions of a document, by name.
#[derive(Debug, Default)]
pub(crate) struct Fragments<'a> {
    map: HashMap<&'a str, &'a ast::FragmentDefinition>,
}

impl<'a> Fragments<'a> {
    pub(crate) fn from_ast(document: &'a ast::Document) -> Self {
        let map = document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                ast::Definition::FragmentDefinition(fragment) => {
                    Some((fragment.name.as_str(), &**fragment))
                }
                _ => None,
            })
            .collect();
        Fragments { map }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&'a ast::FragmentDefinition> {
        self.map.get(name).copied()
    }
}
