//! Rules about fragment definitions and spreads.

use gqlkit_core::diagnostics::codes;
use gqlkit_core::{Diagnostic, Span};
use gqlkit_syntax::{FragmentDefinition, FragmentSpread, Node, OperationDefinition, VisitAction, Visitor};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::validation::ValidationContext;

struct UniqueFragmentNames<'a> {
    context: &'a ValidationContext<'a>,
    known: FxHashMap<&'a str, Span>,
}

impl<'a> Visitor<'a> for UniqueFragmentNames<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::FragmentDefinition(fragment) => {
                let name = &fragment.name;
                if let Some(first) = self.known.get(name.as_str()) {
                    self.context.report(
                        Diagnostic::error(
                            codes::UNIQUE_FRAGMENT_NAMES,
                            format!("There can be only one fragment named \"{}\".", name.as_str()),
                        )
                        .with_spans([*first, name.span]),
                    );
                } else {
                    self.known.insert(name.as_str(), name.span);
                }
                VisitAction::Skip
            }
            Node::OperationDefinition(_) => VisitAction::Skip,
            _ => VisitAction::Continue,
        }
    }
}

pub fn unique_fragment_names<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(UniqueFragmentNames {
        context,
        known: FxHashMap::default(),
    })
}

struct KnownFragmentNames<'a> {
    context: &'a ValidationContext<'a>,
}

impl<'a> Visitor<'a> for KnownFragmentNames<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        if let Node::FragmentSpread(spread) = node {
            if self.context.fragment(spread.name.as_str()).is_none() {
                self.context.report(
                    Diagnostic::error(
                        codes::KNOWN_FRAGMENT_NAMES,
                        format!("Unknown fragment \"{}\".", spread.name.as_str()),
                    )
                    .with_span(spread.name.span),
                );
            }
        }
        VisitAction::Continue
    }
}

pub fn known_fragment_names<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(KnownFragmentNames { context })
}

struct NoUnusedFragments<'a> {
    context: &'a ValidationContext<'a>,
    operations: Vec<&'a OperationDefinition>,
    fragments: Vec<&'a FragmentDefinition>,
}

impl<'a> Visitor<'a> for NoUnusedFragments<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::Document(_) => return VisitAction::Continue,
            Node::OperationDefinition(op) => self.operations.push(op),
            Node::FragmentDefinition(fragment) => self.fragments.push(fragment),
            _ => {}
        }
        VisitAction::Skip
    }

    fn leave(&mut self, node: Node<'a>) -> VisitAction {
        if let Node::Document(_) = node {
            let used: FxHashSet<&str> = self
                .operations
                .iter()
                .copied()
                .flat_map(|op| self.context.recursively_referenced_fragments(op))
                .map(|fragment| fragment.name.as_str())
                .collect();
            for fragment in &self.fragments {
                let name = fragment.name.as_str();
                if !used.contains(name) {
                    self.context.report(
                        Diagnostic::error(codes::NO_UNUSED_FRAGMENTS, format!("Fragment \"{name}\" is never used."))
                            .with_span(fragment.span),
                    );
                }
            }
        }
        VisitAction::Continue
    }
}

/// Every fragment must be reachable from some operation.
pub fn no_unused_fragments<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(NoUnusedFragments {
        context,
        operations: Vec::new(),
        fragments: Vec::new(),
    })
}

struct PossibleFragmentSpreads<'a> {
    context: &'a ValidationContext<'a>,
}

impl PossibleFragmentSpreads<'_> {
    /// The parent and fragment types, if both are composite and disjoint.
    fn disjoint(&self, fragment_type: &str) -> Option<(String, String)> {
        let schema = self.context.schema();
        let type_info = self.context.type_info();
        let parent = type_info.parent_type()?;
        let is_composite = schema.get_type(fragment_type)?.is_composite();
        if !is_composite || schema.do_types_overlap(fragment_type, parent) {
            return None;
        }
        Some((parent.to_string(), fragment_type.to_string()))
    }
}

impl<'a> Visitor<'a> for PossibleFragmentSpreads<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::InlineFragment(fragment) => {
                let Some(condition) = &fragment.type_condition else {
                    return VisitAction::Continue;
                };
                if let Some((parent, frag)) = self.disjoint(condition.as_str()) {
                    self.context.report(
                        Diagnostic::error(
                            codes::POSSIBLE_FRAGMENT_SPREADS,
                            format!(
                                "Fragment cannot be spread here as objects of type \"{parent}\" can never be of type \"{frag}\"."
                            ),
                        )
                        .with_span(fragment.span),
                    );
                }
            }
            Node::FragmentSpread(spread) => {
                let name = spread.name.as_str();
                let Some(definition) = self.context.fragment(name) else {
                    return VisitAction::Continue;
                };
                if let Some((parent, frag)) = self.disjoint(definition.type_condition.as_str()) {
                    self.context.report(
                        Diagnostic::error(
                            codes::POSSIBLE_FRAGMENT_SPREADS,
                            format!(
                                "Fragment \"{name}\" cannot be spread here as objects of type \"{parent}\" can never be of type \"{frag}\"."
                            ),
                        )
                        .with_span(spread.span),
                    );
                }
            }
            _ => {}
        }
        VisitAction::Continue
    }
}

/// A fragment may only be spread where its type can overlap the parent type.
pub fn possible_fragment_spreads<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(PossibleFragmentSpreads { context })
}

struct NoFragmentCycles<'a> {
    context: &'a ValidationContext<'a>,
    visited: FxHashSet<&'a str>,
    spread_path: Vec<&'a FragmentSpread>,
    path_index: FxHashMap<&'a str, usize>,
}

impl<'a> NoFragmentCycles<'a> {
    fn detect_cycles(&mut self, fragment: &'a FragmentDefinition) {
        let name = fragment.name.as_str();
        if !self.visited.insert(name) {
            return;
        }
        let spreads = self.context.fragment_spreads(&fragment.selection_set);
        if spreads.is_empty() {
            return;
        }

        self.path_index.insert(name, self.spread_path.len());
        for spread in spreads {
            let spread_name = spread.name.as_str();
            let cycle_index = self.path_index.get(spread_name).copied();
            self.spread_path.push(spread);
            match cycle_index {
                None => {
                    if let Some(target) = self.context.fragment(spread_name) {
                        self.detect_cycles(target);
                    }
                }
                Some(index) => {
                    let cycle = &self.spread_path[index..];
                    let via = cycle[..cycle.len() - 1]
                        .iter()
                        .map(|s| format!("\"{}\"", s.name.as_str()))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let message = if via.is_empty() {
                        format!("Cannot spread fragment \"{spread_name}\" within itself.")
                    } else {
                        format!("Cannot spread fragment \"{spread_name}\" within itself via {via}.")
                    };
                    self.context.report(
                        Diagnostic::error(codes::NO_FRAGMENT_CYCLES, message)
                            .with_spans(cycle.iter().map(|s| s.span)),
                    );
                }
            }
            self.spread_path.pop();
        }
        self.path_index.remove(name);
    }
}

impl<'a> Visitor<'a> for NoFragmentCycles<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::Document(_) => VisitAction::Continue,
            Node::FragmentDefinition(fragment) => {
                self.detect_cycles(fragment);
                VisitAction::Skip
            }
            _ => VisitAction::Skip,
        }
    }
}

/// Fragments must not spread themselves, directly or through others.
pub fn no_fragment_cycles<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(NoFragmentCycles {
        context,
        visited: FxHashSet::default(),
        spread_path: Vec::new(),
        path_index: FxHashMap::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::test_harness::{located, messages};

    #[test]
    fn test_unique_fragment_names() {
        assert!(messages(unique_fragment_names, "{ dog { ...A ...B } } fragment A on Dog { name } fragment B on Dog { barks }").is_empty());
        assert_eq!(
            located(
                unique_fragment_names,
                "fragment A on Dog { name }\nfragment A on Dog { barks }",
            ),
            [(r#"There can be only one fragment named "A"."#.to_string(), vec![(1, 10), (2, 10)])]
        );
    }

    #[test]
    fn test_known_fragment_names() {
        assert_eq!(
            located(
                known_fragment_names,
                "{\n  dog { ...Known ...Unknown }\n}\nfragment Known on Dog { ...Missing }",
            ),
            [
                (r#"Unknown fragment "Unknown"."#.to_string(), vec![(2, 21)]),
                (r#"Unknown fragment "Missing"."#.to_string(), vec![(4, 28)]),
            ]
        );
    }

    #[test]
    fn test_no_unused_fragments() {
        assert_eq!(
            messages(
                no_unused_fragments,
                "query A { dog { ...Used } }
                 fragment Used on Dog { ...Nested }
                 fragment Nested on Dog { name }
                 fragment Orphan on Dog { ...Orphan2 }
                 fragment Orphan2 on Dog { name }",
            ),
            [
                r#"Fragment "Orphan" is never used."#,
                r#"Fragment "Orphan2" is never used."#,
            ]
        );
    }

    #[test]
    fn test_possible_fragment_spreads() {
        assert!(messages(
            possible_fragment_spreads,
            "fragment A on Dog { ... on Pet { name } ...C }
             fragment B on Pet { ... on Dog { barks } ... on CatOrDog { __typename } }
             fragment C on CatOrDog { __typename }
             fragment D on DogOrHuman { ... on Pet { name } }",
        )
        .is_empty());
        assert_eq!(
            messages(
                possible_fragment_spreads,
                "fragment A on Dog { ... on Cat { meows } ...H }
                 fragment B on CatOrDog { ... on HumanOrAlien { __typename } }
                 fragment H on Human { iq }",
            ),
            [
                r#"Fragment cannot be spread here as objects of type "Dog" can never be of type "Cat"."#,
                r#"Fragment "H" cannot be spread here as objects of type "Dog" can never be of type "Human"."#,
                r#"Fragment cannot be spread here as objects of type "CatOrDog" can never be of type "HumanOrAlien"."#,
            ]
        );
    }

    #[test]
    fn test_no_fragment_cycles() {
        assert!(messages(
            no_fragment_cycles,
            "fragment A on Dog { ...B ...B } fragment B on Dog { name }",
        )
        .is_empty());
        assert_eq!(
            located(no_fragment_cycles, "fragment A on Dog { ...A }"),
            [(r#"Cannot spread fragment "A" within itself."#.to_string(), vec![(1, 21)])]
        );
        assert_eq!(
            messages(
                no_fragment_cycles,
                "fragment A on Dog { ...B } fragment B on Dog { ...C } fragment C on Dog { ...A }",
            ),
            [r#"Cannot spread fragment "A" within itself via "B", "C"."#]
        );
    }
}
