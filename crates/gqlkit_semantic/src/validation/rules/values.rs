use gqlkit_core::diagnostics::codes;
use gqlkit_core::Diagnostic;
use gqlkit_syntax::{print_value, Node, ObjectField, Value, VisitAction, Visitor};

use crate::scalars;
use crate::schema::{TypeDef, TypeRef};
use crate::type_info::TypeInfo;
use crate::validation::ValidationContext;

struct ValuesOfCorrectType<'a> {
    context: &'a ValidationContext<'a>,
}

impl ValuesOfCorrectType<'_> {
    fn report(&self, value: &Value, message: String) {
        self.context
            .report(Diagnostic::error(codes::VALUES_OF_CORRECT_TYPE, message).with_span(value.span()));
    }

    /// Checks a value that is not a list or input object against the
    /// expected leaf type.
    fn check_leaf(&self, type_info: &TypeInfo, value: &Value) {
        let Some(location) = type_info.input_type() else {
            return;
        };
        let Some(named) = self.context.schema().named_type(location) else {
            return;
        };
        let printed = print_value(value);
        let reason = match named {
            TypeDef::Scalar(scalar) => match scalars::parse_literal(&scalar.name, value) {
                Ok(_) => return,
                Err(err) => Some(err.0),
            },
            TypeDef::Enum(def) => match value {
                Value::Enum(name) if def.value(name.as_str()).is_some() => return,
                Value::Enum(name) => Some(format!(
                    "Value \"{}\" does not exist in \"{}\" enum.",
                    name.as_str(),
                    def.name
                )),
                _ => Some(format!(
                    "Enum \"{}\" cannot represent non-enum value: {printed}.",
                    def.name
                )),
            },
            _ => None,
        };
        let message = match reason {
            Some(reason) => format!("Expected value of type \"{location}\", found {printed}; {reason}"),
            None => format!("Expected value of type \"{location}\", found {printed}."),
        };
        self.report(value, message);
    }

    fn check_value(&self, value: &Value) -> VisitAction {
        let schema = self.context.schema();
        let type_info = self.context.type_info();
        match value {
            Value::Variable(_) => {}
            Value::Null(_) => {
                if let Some(ty) = type_info.input_type().filter(|ty| ty.is_non_null()) {
                    self.report(value, format!("Expected value of type \"{ty}\", found null."));
                }
            }
            // Entering a list already moved the type context to the item
            // type, so the list's own type is the parent.
            Value::List(..) => {
                let is_list = type_info
                    .parent_input_type()
                    .is_some_and(|ty| matches!(ty.nullable(), TypeRef::List(_)));
                if !is_list {
                    self.check_leaf(&type_info, value);
                    return VisitAction::Skip;
                }
            }
            Value::Object(fields, _) => {
                let input = type_info.input_type().and_then(|ty| schema.named_type(ty));
                let Some(TypeDef::InputObject(def)) = input else {
                    self.check_leaf(&type_info, value);
                    return VisitAction::Skip;
                };
                for field in def.fields.values() {
                    let required = field.ty.is_non_null() && field.default_value.is_none();
                    if required && !fields.iter().any(|f| f.name.value == field.name) {
                        self.report(
                            value,
                            format!(
                                "Field \"{}.{}\" of required type \"{}\" was not provided.",
                                def.name, field.name, field.ty
                            ),
                        );
                    }
                }
            }
            _ => self.check_leaf(&type_info, value),
        }
        VisitAction::Continue
    }

    fn check_object_field(&self, field: &ObjectField) {
        let type_info = self.context.type_info();
        if type_info.input_type().is_some() {
            return;
        }
        let parent = type_info
            .parent_input_type()
            .and_then(|ty| self.context.schema().named_type(ty));
        if let Some(TypeDef::InputObject(def)) = parent {
            self.context.report(
                Diagnostic::error(
                    codes::VALUES_OF_CORRECT_TYPE,
                    format!(
                        "Field \"{}\" is not defined by type \"{}\".",
                        field.name.as_str(),
                        def.name
                    ),
                )
                .with_span(field.span),
            );
        }
    }
}

impl<'a> Visitor<'a> for ValuesOfCorrectType<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::Value(value) => self.check_value(value),
            Node::ObjectField(field) => {
                self.check_object_field(field);
                VisitAction::Continue
            }
            _ => VisitAction::Continue,
        }
    }
}

/// Literal values must be coercible to the type expected where they
/// appear.
pub fn values_of_correct_type<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(ValuesOfCorrectType { context })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::test_harness::{located, messages};

    #[test]
    fn test_valid_literals() {
        assert!(messages(
            values_of_correct_type,
            r#"query Q($v: Int = 3, $l: [String] = ["a", null]) {
                complicatedArgs {
                    intArgField(intArg: 2)
                    floatArgField(floatArg: 1)
                    idArgField(idArg: 1)
                    enumArgField(enumArg: BROWN)
                    stringListArgField(stringListArg: "single")
                    complexArgField(complexArg: { requiredField: true, intField: $v, stringListField: ["x"] })
                    nonNullIntArgField(nonNullIntArg: $v)
                }
            }"#,
        )
        .is_empty());
    }

    #[test]
    fn test_invalid_scalars_and_enums() {
        assert_eq!(
            messages(
                values_of_correct_type,
                r#"{
                    complicatedArgs {
                        intArgField(intArg: "3")
                        booleanArgField(booleanArg: 1)
                        intArgField(intArg: 3000000000)
                        enumArgField(enumArg: "BROWN")
                        enumArgField(enumArg: PURPLE)
                        stringListNonNullArgField(stringListNonNullArg: ["a", null])
                        nonNullIntArgField(nonNullIntArg: null)
                    }
                }"#,
            ),
            [
                r#"Expected value of type "Int", found "3"; Int cannot represent value: "3""#,
                r#"Expected value of type "Boolean", found 1; Boolean cannot represent value: 1"#,
                r#"Expected value of type "Int", found 3000000000; Int cannot represent non 32-bit signed integer value: 3000000000"#,
                r#"Expected value of type "FurColor", found "BROWN"; Enum "FurColor" cannot represent non-enum value: "BROWN"."#,
                r#"Expected value of type "FurColor", found PURPLE; Value "PURPLE" does not exist in "FurColor" enum."#,
                r#"Expected value of type "String!", found null."#,
                r#"Expected value of type "Int!", found null."#,
            ]
        );
    }

    #[test]
    fn test_input_objects() {
        assert_eq!(
            located(
                values_of_correct_type,
                "{\n  complicatedArgs {\n    complexArgField(complexArg: { intField: 4, unknownField: true })\n    stringArgField(stringArg: { a: 1 })\n  }\n}",
            ),
            [
                (
                    r#"Field "ComplexInput.requiredField" of required type "Boolean!" was not provided."#
                        .to_string(),
                    vec![(3, 33)]
                ),
                (
                    r#"Field "unknownField" is not defined by type "ComplexInput"."#.to_string(),
                    vec![(3, 48)]
                ),
                (
                    r#"Expected value of type "String", found {a: 1}; String cannot represent value: {a: 1}"#
                        .to_string(),
                    vec![(4, 31)]
                ),
            ]
        );
    }

    #[test]
    fn test_list_into_scalar_position() {
        assert_eq!(
            messages(values_of_correct_type, "{ complicatedArgs { intArgField(intArg: [1, 2]) } }"),
            [r#"Expected value of type "Int", found [1, 2]; Int cannot represent value: [1, 2]"#]
        );
    }
}
