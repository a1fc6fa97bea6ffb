//! Argument and variable coercion.
//!
//! Literals from the document and JSON variables are both coerced into
//! `serde_json::Value`s of the shape the schema expects. Input objects
//! become JSON objects, enum values become strings, lists stay lists.

use gqlkit_core::Span;
use gqlkit_syntax::{ast, print_value};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value as JsonValue};
use thiserror::Error;

use crate::scalars;
use crate::schema::{DirectiveDef, FieldDef, InputValueDef, Schema, TypeDef, TypeRef};

/// Coerced variable or argument values keyed by name.
pub type Variables = Map<String, JsonValue>;

/// A failed argument or variable coercion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CoercionError {
    pub message: String,
    /// Document locations the error points at.
    pub spans: Vec<Span>,
}

impl CoercionError {
    fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            spans: vec![span],
        }
    }
}

/// Anything that declares arguments: fields and directives.
pub trait ArgumentsDefinition {
    /// How the owner is named in error messages, e.g. `field "name"`.
    fn describe(&self) -> String;
    fn arguments(&self) -> &IndexMap<String, InputValueDef>;
}

impl ArgumentsDefinition for FieldDef {
    fn describe(&self) -> String {
        format!("field \"{}\"", self.name)
    }

    fn arguments(&self) -> &IndexMap<String, InputValueDef> {
        &self.arguments
    }
}

impl ArgumentsDefinition for DirectiveDef {
    fn describe(&self) -> String {
        format!("directive \"@{}\"", self.name)
    }

    fn arguments(&self) -> &IndexMap<String, InputValueDef> {
        &self.arguments
    }
}

/// Coerces the arguments written at `node_span` against `definition`.
///
/// Arguments that are absent and have no default are left out of the
/// result. A missing non-null argument or a literal the type cannot accept
/// fails the whole coercion.
pub fn coerce_argument_values(
    schema: &Schema,
    definition: &impl ArgumentsDefinition,
    arguments: &[ast::Argument],
    node_span: Span,
    variables: &Variables,
) -> Result<Variables, CoercionError> {
    let mut coerced = Variables::new();
    for (name, arg_def) in definition.arguments() {
        let arg_node = arguments.iter().find(|a| a.name.value == *name);
        let ty = &arg_def.ty;

        let provided = match arg_node {
            None => None,
            Some(node) => match &node.value {
                ast::Value::Variable(var) => match variables.get(&var.value) {
                    Some(value) => Some(value.clone()),
                    None if arg_def.default_value.is_none() && ty.is_non_null() => {
                        return Err(CoercionError::new(
                            format!(
                                "Argument \"{name}\" of required type \"{ty}\" was provided the variable \"${}\" which was not provided a runtime value.",
                                var.value
                            ),
                            node.value.span(),
                        ));
                    }
                    None => None,
                },
                literal => match value_from_ast(schema, literal, ty, Some(variables)) {
                    Some(value) => Some(value),
                    None => {
                        return Err(CoercionError::new(
                            format!(
                                "Argument \"{name}\" of {} has invalid value {}.",
                                definition.describe(),
                                print_value(literal)
                            ),
                            literal.span(),
                        ));
                    }
                },
            },
        };

        match provided {
            Some(JsonValue::Null) if ty.is_non_null() => {
                let span = arg_node.map_or(node_span, |n| n.value.span());
                return Err(CoercionError::new(
                    format!("Argument \"{name}\" of non-null type \"{ty}\" must not be null."),
                    span,
                ));
            }
            Some(value) => {
                coerced.insert(name.clone(), value);
            }
            None => {
                if let Some(default) = &arg_def.default_value {
                    if let Some(value) = value_from_ast(schema, default, ty, None) {
                        coerced.insert(name.clone(), value);
                    }
                } else if ty.is_non_null() {
                    return Err(CoercionError::new(
                        format!("Argument \"{name}\" of required type \"{ty}\" was not provided."),
                        node_span,
                    ));
                }
            }
        }
    }
    Ok(coerced)
}

/// Coerces the arguments of the first `directives` entry named like
/// `directive`. Returns `Ok(None)` when the directive is not present.
pub fn coerce_directive_values(
    schema: &Schema,
    directive: &DirectiveDef,
    directives: &[ast::Directive],
    variables: &Variables,
) -> Result<Option<Variables>, CoercionError> {
    directives
        .iter()
        .find(|d| d.name.value == directive.name)
        .map(|node| coerce_argument_values(schema, directive, &node.arguments, node.span, variables))
        .transpose()
}

/// Coerces request variables against an operation's definitions.
///
/// Every problem is reported, not only the first.
pub fn coerce_variable_values(
    schema: &Schema,
    definitions: &[ast::VariableDefinition],
    inputs: &Variables,
) -> Result<Variables, Vec<CoercionError>> {
    let mut coerced = Variables::new();
    let mut errors = Vec::new();

    for definition in definitions {
        let name = &definition.variable.value;
        let ty = TypeRef::from_ast(&definition.ty);
        let span = definition.span;

        if !schema.named_type(&ty).is_some_and(TypeDef::is_input_type) {
            errors.push(CoercionError::new(
                format!(
                    "Variable \"${name}\" expected value of type \"{}\" which cannot be used as an input type.",
                    definition.ty
                ),
                definition.ty.span(),
            ));
            continue;
        }

        match inputs.get(name) {
            None => {
                if let Some(default) = &definition.default_value {
                    if let Some(value) = value_from_ast(schema, default, &ty, None) {
                        coerced.insert(name.clone(), value);
                    }
                } else if ty.is_non_null() {
                    errors.push(CoercionError::new(
                        format!("Variable \"${name}\" of required type \"{ty}\" was not provided."),
                        span,
                    ));
                }
            }
            Some(JsonValue::Null) if ty.is_non_null() => {
                errors.push(CoercionError::new(
                    format!("Variable \"${name}\" of non-null type \"{ty}\" must not be null."),
                    span,
                ));
            }
            Some(value) => match coerce_value(schema, value, &ty) {
                Ok(value) => {
                    coerced.insert(name.clone(), value);
                }
                Err(reason) => errors.push(CoercionError::new(
                    format!("Variable \"${name}\" got invalid value {value}; {reason}"),
                    span,
                )),
            },
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

/// Coerces an external JSON value to `ty`. The error is a human readable
/// reason.
pub fn coerce_value(schema: &Schema, value: &JsonValue, ty: &TypeRef) -> Result<JsonValue, String> {
    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                Err(format!("Expected non-nullable type \"{ty}\" not to be null."))
            } else {
                coerce_value(schema, value, inner)
            }
        }
        _ if value.is_null() => Ok(JsonValue::Null),
        TypeRef::List(item) => match value {
            JsonValue::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    coerce_value(schema, v, item).map_err(|e| format!("In element #{i}: {e}"))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array),
            single => coerce_value(schema, single, item).map(|v| JsonValue::Array(vec![v])),
        },
        TypeRef::Named(name) => match schema.get_type(name) {
            Some(TypeDef::Scalar(_)) => scalars::parse_value(name, value)
                .map_err(|e| format!("Expected type \"{name}\". {e}")),
            Some(TypeDef::Enum(def)) => match value {
                JsonValue::String(s) if def.value(s).is_some() => Ok(value.clone()),
                _ => Err(format!("Value {value} does not exist in \"{name}\" enum.")),
            },
            Some(TypeDef::InputObject(def)) => {
                let JsonValue::Object(fields) = value else {
                    return Err(format!("Expected type \"{name}\" to be an object."));
                };
                if let Some(unknown) = fields.keys().find(|k| !def.fields.contains_key(*k)) {
                    return Err(format!("Field \"{unknown}\" is not defined by type \"{name}\"."));
                }
                let mut coerced = Map::new();
                for (field_name, field) in &def.fields {
                    match fields.get(field_name) {
                        Some(v) => {
                            let v = coerce_value(schema, v, &field.ty)
                                .map_err(|e| format!("In field \"{field_name}\": {e}"))?;
                            coerced.insert(field_name.clone(), v);
                        }
                        None => {
                            if let Some(default) = &field.default_value {
                                if let Some(v) = value_from_ast(schema, default, &field.ty, None) {
                                    coerced.insert(field_name.clone(), v);
                                }
                            } else if field.ty.is_non_null() {
                                return Err(format!(
                                    "Field \"{field_name}\" of required type \"{}\" was not provided.",
                                    field.ty
                                ));
                            }
                        }
                    }
                }
                Ok(JsonValue::Object(coerced))
            }
            _ => Err(format!("Type \"{name}\" is not an input type.")),
        },
    }
}

/// Coerces a literal to `ty`, substituting `variables`.
///
/// Returns `None` when the literal is invalid for the type, including a
/// reference to a variable that was not supplied where a value is needed.
pub fn value_from_ast(
    schema: &Schema,
    value: &ast::Value,
    ty: &TypeRef,
    variables: Option<&Variables>,
) -> Option<JsonValue> {
    if let ast::Value::Variable(name) = value {
        let variable = variables?.get(&name.value)?;
        if variable.is_null() && ty.is_non_null() {
            return None;
        }
        // Variables were already coerced against their definition.
        return Some(variable.clone());
    }

    match ty {
        TypeRef::NonNull(inner) => {
            if value.is_null() {
                return None;
            }
            value_from_ast(schema, value, inner, variables)
        }
        _ if value.is_null() => Some(JsonValue::Null),
        TypeRef::List(item) => match value {
            ast::Value::List(items, _) => {
                let mut coerced = Vec::with_capacity(items.len());
                for node in items {
                    if is_missing_variable(node, variables) {
                        if item.is_non_null() {
                            return None;
                        }
                        coerced.push(JsonValue::Null);
                    } else {
                        coerced.push(value_from_ast(schema, node, item, variables)?);
                    }
                }
                Some(JsonValue::Array(coerced))
            }
            single => {
                value_from_ast(schema, single, item, variables).map(|v| JsonValue::Array(vec![v]))
            }
        },
        TypeRef::Named(name) => match schema.get_type(name)? {
            TypeDef::Scalar(_) => {
                if contains_variables(value) {
                    Some(value_from_ast_untyped(value, variables))
                } else {
                    scalars::parse_literal(name, value).ok()
                }
            }
            TypeDef::Enum(def) => match value {
                ast::Value::Enum(v) if def.value(&v.value).is_some() => {
                    Some(JsonValue::String(v.value.clone()))
                }
                _ => None,
            },
            TypeDef::InputObject(def) => {
                let ast::Value::Object(fields, _) = value else {
                    return None;
                };
                let mut coerced = Map::new();
                for (field_name, field) in &def.fields {
                    let node = fields.iter().find(|f| f.name.value == *field_name);
                    match node {
                        Some(node) if !is_missing_variable(&node.value, variables) => {
                            let v = value_from_ast(schema, &node.value, &field.ty, variables)?;
                            coerced.insert(field_name.clone(), v);
                        }
                        _ => {
                            if let Some(default) = &field.default_value {
                                let v = value_from_ast(schema, default, &field.ty, None)?;
                                coerced.insert(field_name.clone(), v);
                            } else if field.ty.is_non_null() {
                                return None;
                            }
                        }
                    }
                }
                Some(JsonValue::Object(coerced))
            }
            _ => None,
        },
    }
}

/// Converts a literal to JSON without a type. Enum values become strings,
/// unknown variables become null.
pub fn value_from_ast_untyped(value: &ast::Value, variables: Option<&Variables>) -> JsonValue {
    match value {
        ast::Value::Variable(name) => variables
            .and_then(|vars| vars.get(&name.value))
            .cloned()
            .unwrap_or(JsonValue::Null),
        ast::Value::Int(text, _) => text
            .parse::<i64>()
            .map(JsonValue::from)
            .or_else(|_| text.parse::<f64>().map(JsonValue::from))
            .unwrap_or(JsonValue::Null),
        ast::Value::Float(text, _) => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map_or(JsonValue::Null, JsonValue::Number),
        ast::Value::String(s) => JsonValue::String(s.value.clone()),
        ast::Value::Boolean(b, _) => JsonValue::Bool(*b),
        ast::Value::Null(_) => JsonValue::Null,
        ast::Value::Enum(name) => JsonValue::String(name.value.clone()),
        ast::Value::List(items, _) => JsonValue::Array(
            items
                .iter()
                .map(|item| value_from_ast_untyped(item, variables))
                .collect(),
        ),
        ast::Value::Object(fields, _) => JsonValue::Object(
            fields
                .iter()
                .map(|f| (f.name.value.clone(), value_from_ast_untyped(&f.value, variables)))
                .collect(),
        ),
    }
}

fn is_missing_variable(value: &ast::Value, variables: Option<&Variables>) -> bool {
    match value {
        ast::Value::Variable(name) => variables.map_or(true, |vars| !vars.contains_key(&name.value)),
        _ => false,
    }
}

fn contains_variables(value: &ast::Value) -> bool {
    match value {
        ast::Value::Variable(_) => true,
        ast::Value::List(items, _) => items.iter().any(contains_variables),
        ast::Value::Object(fields, _) => fields.iter().any(|f| contains_variables(&f.value)),
        _ => false,
    }
}
