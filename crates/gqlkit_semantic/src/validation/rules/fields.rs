use gqlkit_core::diagnostics::codes;
use gqlkit_core::Diagnostic;
use gqlkit_syntax::{Node, VisitAction, Visitor};

use crate::validation::ValidationContext;

struct ScalarLeafs<'a> {
    context: &'a ValidationContext<'a>,
}

impl<'a> Visitor<'a> for ScalarLeafs<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        let Node::Field(field) = node else {
            return VisitAction::Continue;
        };
        let type_info = self.context.type_info();
        let Some(ty) = type_info.output_type() else {
            return VisitAction::Continue;
        };
        let Some(named) = self.context.schema().named_type(ty) else {
            return VisitAction::Continue;
        };
        let name = field.name.as_str();
        match (&field.selection_set, named.is_leaf()) {
            (Some(selection_set), true) => self.context.report(
                Diagnostic::error(
                    codes::SCALAR_LEAFS,
                    format!("Field \"{name}\" must not have a selection since type \"{ty}\" has no subfields."),
                )
                .with_span(selection_set.span),
            ),
            (None, false) => self.context.report(
                Diagnostic::error(
                    codes::SCALAR_LEAFS,
                    format!(
                        "Field \"{name}\" of type \"{ty}\" must have a selection of subfields. Did you mean \"{name} {{ ... }}\"?"
                    ),
                )
                .with_span(field.span),
            ),
            _ => {}
        }
        VisitAction::Continue
    }
}

/// Leaf fields take no selection set and composite fields require one.
pub fn scalar_leafs<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(ScalarLeafs { context })
}

struct FieldsOnCorrectType<'a> {
    context: &'a ValidationContext<'a>,
}

impl<'a> Visitor<'a> for FieldsOnCorrectType<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        let Node::Field(field) = node else {
            return VisitAction::Continue;
        };
        let type_info = self.context.type_info();
        if let (Some(parent), None) = (type_info.parent_type(), type_info.field_def()) {
            self.context.report(
                Diagnostic::error(
                    codes::FIELDS_ON_CORRECT_TYPE,
                    format!("Cannot query field \"{}\" on type \"{parent}\".", field.name.as_str()),
                )
                .with_span(field.span),
            );
        }
        VisitAction::Continue
    }
}

/// Selected fields must be defined on the enclosing type.
pub fn fields_on_correct_type<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(FieldsOnCorrectType { context })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::test_harness::{located, messages};

    #[test]
    fn test_scalar_leafs() {
        assert!(messages(
            scalar_leafs,
            "{ dog { barks name @include(if: true) } human { pets { name } } catOrDog { __typename } }",
        )
        .is_empty());
        assert_eq!(
            located(scalar_leafs, "{\n  human { pets }\n  dog { barks { sinceWhen } }\n}"),
            [
                (
                    r#"Field "pets" of type "[Pet]" must have a selection of subfields. Did you mean "pets { ... }"?"#
                        .to_string(),
                    vec![(2, 11)]
                ),
                (
                    r#"Field "barks" must not have a selection since type "Boolean" has no subfields."#
                        .to_string(),
                    vec![(3, 15)]
                ),
            ]
        );
        assert_eq!(
            messages(scalar_leafs, "query Q { human }"),
            [r#"Field "human" of type "Human" must have a selection of subfields. Did you mean "human { ... }"?"#]
        );
    }

    #[test]
    fn test_fields_on_correct_type() {
        assert!(messages(
            fields_on_correct_type,
            "fragment F on Pet { __typename name ... on Dog { barks } } fragment G on CatOrDog { __typename }",
        )
        .is_empty());
        assert_eq!(
            located(
                fields_on_correct_type,
                "fragment F on Dog {\n  meowVolume\n  unknown { deeper }\n}\nfragment G on CatOrDog { name }",
            ),
            [
                (r#"Cannot query field "meowVolume" on type "Dog"."#.to_string(), vec![(2, 3)]),
                (r#"Cannot query field "unknown" on type "Dog"."#.to_string(), vec![(3, 3)]),
                (r#"Cannot query field "name" on type "CatOrDog"."#.to_string(), vec![(5, 26)]),
            ]
        );
    }
}
