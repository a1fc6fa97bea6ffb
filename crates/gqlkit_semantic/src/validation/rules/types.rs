//! Rules about type references.

use gqlkit_core::diagnostics::codes;
use gqlkit_core::Diagnostic;
use gqlkit_syntax::{Definition, Name, Node, Type, VisitAction, Visitor};
use rustc_hash::FxHashSet;

use crate::schema::TypeDef;
use crate::validation::ValidationContext;

struct KnownTypeNames<'a> {
    context: &'a ValidationContext<'a>,
    defined: FxHashSet<&'a str>,
}

impl<'a> KnownTypeNames<'a> {
    fn check(&self, name: &Name) {
        let name_str = name.as_str();
        if self.context.schema().get_type(name_str).is_some() || self.defined.contains(name_str) {
            return;
        }
        self.context.report(
            Diagnostic::error(codes::KNOWN_TYPE_NAMES, format!("Unknown type \"{name_str}\"."))
                .with_span(name.span),
        );
    }
}

impl<'a> Visitor<'a> for KnownTypeNames<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::Document(document) => {
                self.defined = document
                    .definitions
                    .iter()
                    .filter_map(|def| match def {
                        Definition::Type(ty) => Some(ty.name().as_str()),
                        _ => None,
                    })
                    .collect();
            }
            Node::FragmentDefinition(fragment) => self.check(&fragment.type_condition),
            Node::InlineFragment(fragment) => {
                if let Some(condition) = &fragment.type_condition {
                    self.check(condition);
                }
            }
            Node::Type(Type::Named(name)) => self.check(name),
            _ => {}
        }
        VisitAction::Continue
    }
}

/// Every referenced type must exist in the schema or the document.
pub fn known_type_names<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(KnownTypeNames {
        context,
        defined: FxHashSet::default(),
    })
}

struct FragmentsOnCompositeTypes<'a> {
    context: &'a ValidationContext<'a>,
}

impl FragmentsOnCompositeTypes<'_> {
    fn is_non_composite(&self, condition: &Name) -> bool {
        self.context
            .schema()
            .get_type(condition.as_str())
            .is_some_and(|ty| !ty.is_composite())
    }
}

impl<'a> Visitor<'a> for FragmentsOnCompositeTypes<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::InlineFragment(fragment) => {
                if let Some(condition) = &fragment.type_condition {
                    if self.is_non_composite(condition) {
                        self.context.report(
                            Diagnostic::error(
                                codes::FRAGMENTS_ON_COMPOSITE_TYPES,
                                format!(
                                    "Fragment cannot condition on non composite type \"{}\".",
                                    condition.as_str()
                                ),
                            )
                            .with_span(condition.span),
                        );
                    }
                }
            }
            Node::FragmentDefinition(fragment) => {
                let condition = &fragment.type_condition;
                if self.is_non_composite(condition) {
                    self.context.report(
                        Diagnostic::error(
                            codes::FRAGMENTS_ON_COMPOSITE_TYPES,
                            format!(
                                "Fragment \"{}\" cannot condition on non composite type \"{}\".",
                                fragment.name.as_str(),
                                condition.as_str()
                            ),
                        )
                        .with_span(condition.span),
                    );
                }
            }
            _ => {}
        }
        VisitAction::Continue
    }
}

/// Fragment type conditions must name unions, interfaces or objects.
pub fn fragments_on_composite_types<'a>(
    context: &'a ValidationContext<'a>,
) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(FragmentsOnCompositeTypes { context })
}

struct VariablesAreInputTypes<'a> {
    context: &'a ValidationContext<'a>,
}

impl<'a> Visitor<'a> for VariablesAreInputTypes<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        if let Node::VariableDefinition(var) = node {
            let is_output_only = self
                .context
                .schema()
                .get_type(var.ty.name().as_str())
                .is_some_and(|ty| !TypeDef::is_input_type(ty));
            if is_output_only {
                self.context.report(
                    Diagnostic::error(
                        codes::VARIABLES_ARE_INPUT_TYPES,
                        format!(
                            "Variable \"${}\" cannot be non-input type \"{}\".",
                            var.variable.as_str(),
                            var.ty
                        ),
                    )
                    .with_span(var.ty.span()),
                );
            }
            return VisitAction::Skip;
        }
        VisitAction::Continue
    }
}

/// Variables can only be declared with scalar, enum or input object types.
pub fn variables_are_input_types<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(VariablesAreInputTypes { context })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::test_harness::{located, messages};

    #[test]
    fn test_known_type_names() {
        assert!(messages(
            known_type_names,
            "query Q($var: String, $required: [String!]!) { dog { ... on Dog { name } ...F } } fragment F on Pet { name }",
        )
        .is_empty());
        assert_eq!(
            located(
                known_type_names,
                "query Q($var: JumbledUpLetters) {\n  dog { ... on Badger { name } ...F }\n}\nfragment F on Peettt { name }",
            ),
            [
                (r#"Unknown type "JumbledUpLetters"."#.to_string(), vec![(1, 15)]),
                (r#"Unknown type "Badger"."#.to_string(), vec![(2, 16)]),
                (r#"Unknown type "Peettt"."#.to_string(), vec![(4, 15)]),
            ]
        );
    }

    #[test]
    fn test_fragments_on_composite_types() {
        assert!(messages(
            fragments_on_composite_types,
            "fragment A on Dog { ... on Being { name } } fragment B on CatOrDog { ... { __typename } }",
        )
        .is_empty());
        assert_eq!(
            messages(
                fragments_on_composite_types,
                "fragment F on Boolean { x } fragment G on Dog { ... on FurColor { x } }",
            ),
            [
                r#"Fragment "F" cannot condition on non composite type "Boolean"."#,
                r#"Fragment cannot condition on non composite type "FurColor"."#,
            ]
        );
    }

    #[test]
    fn test_variables_are_input_types() {
        assert!(messages(
            variables_are_input_types,
            "query Q($a: String, $b: [Boolean!]!, $c: ComplexInput, $d: FurColor) { dog { name } }",
        )
        .is_empty());
        assert_eq!(
            located(
                variables_are_input_types,
                "query Q($a: Dog, $b: [[CatOrDog!]]!, $c: Pet) { dog { name } }",
            ),
            [
                (r#"Variable "$a" cannot be non-input type "Dog"."#.to_string(), vec![(1, 13)]),
                (r#"Variable "$b" cannot be non-input type "[[CatOrDog!]]!"."#.to_string(), vec![(1, 22)]),
                (r#"Variable "$c" cannot be non-input type "Pet"."#.to_string(), vec![(1, 42)]),
            ]
        );
    }
}
