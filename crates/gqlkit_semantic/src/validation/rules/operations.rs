//! Document-level rules about operations and definitions.

use gqlkit_core::diagnostics::codes;
use gqlkit_core::{Diagnostic, Span};
use gqlkit_syntax::{Definition, Node, VisitAction, Visitor};
use rustc_hash::FxHashMap;

use crate::validation::ValidationContext;

struct ExecutableDefinitions<'a> {
    context: &'a ValidationContext<'a>,
}

impl<'a> Visitor<'a> for ExecutableDefinitions<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        let Node::Document(document) = node else {
            return VisitAction::Continue;
        };
        for definition in &document.definitions {
            let name = match definition {
                Definition::Operation(_) | Definition::Fragment(_) => continue,
                Definition::Schema(_) => "schema".to_string(),
                Definition::Type(def) => format!("\"{}\"", def.name().as_str()),
                Definition::Directive(def) => format!("\"{}\"", def.name.as_str()),
            };
            self.context.report(
                Diagnostic::error(
                    codes::EXECUTABLE_DEFINITIONS,
                    format!("The {name} definition is not executable."),
                )
                .with_span(definition.span()),
            );
        }
        VisitAction::Skip
    }
}

/// Only operations and fragments may appear in an executable document.
pub fn executable_definitions<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(ExecutableDefinitions { context })
}

struct UniqueOperationNames<'a> {
    context: &'a ValidationContext<'a>,
    known: FxHashMap<&'a str, Span>,
}

impl<'a> Visitor<'a> for UniqueOperationNames<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::OperationDefinition(op) => {
                if let Some(name) = &op.name {
                    if let Some(first) = self.known.get(name.as_str()) {
                        self.context.report(
                            Diagnostic::error(
                                codes::UNIQUE_OPERATION_NAMES,
                                format!("There can be only one operation named \"{}\".", name.as_str()),
                            )
                            .with_spans([*first, name.span]),
                        );
                    } else {
                        self.known.insert(name.as_str(), name.span);
                    }
                }
                VisitAction::Skip
            }
            Node::FragmentDefinition(_) => VisitAction::Skip,
            _ => VisitAction::Continue,
        }
    }
}

pub fn unique_operation_names<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(UniqueOperationNames {
        context,
        known: FxHashMap::default(),
    })
}

struct LoneAnonymousOperation<'a> {
    context: &'a ValidationContext<'a>,
    operations: usize,
}

impl<'a> Visitor<'a> for LoneAnonymousOperation<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::Document(document) => {
                self.operations = document.operations().count();
                VisitAction::Continue
            }
            Node::OperationDefinition(op) => {
                if op.name.is_none() && self.operations > 1 {
                    self.context.report(
                        Diagnostic::error(
                            codes::LONE_ANONYMOUS_OPERATION,
                            "This anonymous operation must be the only defined operation.",
                        )
                        .with_span(op.span),
                    );
                }
                VisitAction::Skip
            }
            _ => VisitAction::Skip,
        }
    }
}

/// An anonymous operation must be alone in its document.
pub fn lone_anonymous_operation<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(LoneAnonymousOperation {
        context,
        operations: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::test_harness::{located, messages};

    #[test]
    fn test_executable_definitions() {
        assert!(messages(executable_definitions, "query Q { dog { name } } fragment F on Dog { name }").is_empty());
        assert_eq!(
            located(
                executable_definitions,
                "query Q { dog { name } }\ntype Cow { name: String }\nschema { query: QueryRoot }\ndirective @d on FIELD",
            ),
            [
                (r#"The "Cow" definition is not executable."#.to_string(), vec![(2, 1)]),
                ("The schema definition is not executable.".to_string(), vec![(3, 1)]),
                (r#"The "d" definition is not executable."#.to_string(), vec![(4, 1)]),
            ]
        );
    }

    #[test]
    fn test_unique_operation_names() {
        assert!(messages(unique_operation_names, "query A { dog { name } } query B { dog { name } }").is_empty());
        assert!(messages(unique_operation_names, "query A { dog { name } } mutation B { rename(name: \"x\") { name } }").is_empty());
        assert_eq!(
            located(
                unique_operation_names,
                "query Foo { dog { name } }\nmutation Foo { rename(name: \"x\") { name } }",
            ),
            [(
                r#"There can be only one operation named "Foo"."#.to_string(),
                vec![(1, 7), (2, 10)]
            )]
        );
    }

    #[test]
    fn test_lone_anonymous_operation() {
        assert!(messages(lone_anonymous_operation, "{ dog { name } } fragment F on Dog { name }").is_empty());
        assert!(messages(lone_anonymous_operation, "query A { dog { name } } query B { dog { name } }").is_empty());
        assert_eq!(
            messages(lone_anonymous_operation, "query { dog { name } } query B { dog { name } }"),
            ["This anonymous operation must be the only defined operation."]
        );
    }
}
