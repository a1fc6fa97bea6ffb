//! Rules about variable definitions and usages.

use gqlkit_core::diagnostics::codes;
use gqlkit_core::{Diagnostic, Span};
use gqlkit_syntax::{Node, OperationDefinition, Value, VariableDefinition, VisitAction, Visitor};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::schema::{Schema, TypeRef};
use crate::validation::ValidationContext;

struct UniqueVariableNames<'a> {
    context: &'a ValidationContext<'a>,
}

impl<'a> Visitor<'a> for UniqueVariableNames<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::Document(_) => VisitAction::Continue,
            Node::OperationDefinition(op) => {
                let mut known: FxHashMap<&str, Span> = FxHashMap::default();
                for var in &op.variable_definitions {
                    let name = &var.variable;
                    if let Some(first) = known.get(name.as_str()) {
                        self.context.report(
                            Diagnostic::error(
                                codes::UNIQUE_VARIABLE_NAMES,
                                format!("There can be only one variable named \"${}\".", name.as_str()),
                            )
                            .with_spans([*first, name.span]),
                        );
                    } else {
                        known.insert(name.as_str(), name.span);
                    }
                }
                VisitAction::Skip
            }
            _ => VisitAction::Skip,
        }
    }
}

pub fn unique_variable_names<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(UniqueVariableNames { context })
}

/// `operation "Name"` for named operations, nothing for anonymous ones.
fn operation_suffix(op: &OperationDefinition, prefix: &str) -> String {
    match &op.name {
        Some(name) => format!(" {prefix} operation \"{}\"", name.as_str()),
        None => String::new(),
    }
}

struct NoUndefinedVariables<'a> {
    context: &'a ValidationContext<'a>,
}

impl<'a> Visitor<'a> for NoUndefinedVariables<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::Document(_) => VisitAction::Continue,
            Node::OperationDefinition(op) => {
                let defined: FxHashSet<&str> = op
                    .variable_definitions
                    .iter()
                    .map(|var| var.variable.as_str())
                    .collect();
                for usage in self.context.recursive_variable_usages(op) {
                    let name = usage.name.as_str();
                    if !defined.contains(name) {
                        self.context.report(
                            Diagnostic::error(
                                codes::NO_UNDEFINED_VARIABLES,
                                format!("Variable \"${name}\" is not defined{}.", operation_suffix(op, "by")),
                            )
                            .with_spans([usage.name.span, op.span]),
                        );
                    }
                }
                VisitAction::Skip
            }
            _ => VisitAction::Skip,
        }
    }
}

/// Every variable used by an operation, or by the fragments it spreads,
/// must be defined by that operation.
pub fn no_undefined_variables<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(NoUndefinedVariables { context })
}

struct NoUnusedVariables<'a> {
    context: &'a ValidationContext<'a>,
}

impl<'a> Visitor<'a> for NoUnusedVariables<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::Document(_) => VisitAction::Continue,
            Node::OperationDefinition(op) => {
                let used: FxHashSet<&str> = self
                    .context
                    .recursive_variable_usages(op)
                    .into_iter()
                    .map(|usage| usage.name.as_str())
                    .collect();
                for var in &op.variable_definitions {
                    let name = var.variable.as_str();
                    if !used.contains(name) {
                        self.context.report(
                            Diagnostic::error(
                                codes::NO_UNUSED_VARIABLES,
                                format!("Variable \"${name}\" is never used{}.", operation_suffix(op, "in")),
                            )
                            .with_span(var.span),
                        );
                    }
                }
                VisitAction::Skip
            }
            _ => VisitAction::Skip,
        }
    }
}

pub fn no_unused_variables<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(NoUnusedVariables { context })
}

struct VariablesInAllowedPosition<'a> {
    context: &'a ValidationContext<'a>,
}

impl<'a> Visitor<'a> for VariablesInAllowedPosition<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::Document(_) => VisitAction::Continue,
            Node::OperationDefinition(op) => {
                let schema = self.context.schema();
                let definitions: FxHashMap<&str, &VariableDefinition> = op
                    .variable_definitions
                    .iter()
                    .map(|var| (var.variable.as_str(), var))
                    .collect();
                for usage in self.context.recursive_variable_usages(op) {
                    let Some(location_type) = &usage.ty else {
                        continue;
                    };
                    let Some(definition) = definitions.get(usage.name.as_str()) else {
                        continue;
                    };
                    let var_type = TypeRef::from_ast(&definition.ty);
                    if schema.named_type(&var_type).is_none() {
                        continue;
                    }
                    if !allowed_variable_usage(
                        schema,
                        &var_type,
                        definition.default_value.as_ref(),
                        location_type,
                        usage.has_location_default,
                    ) {
                        self.context.report(
                            Diagnostic::error(
                                codes::VARIABLES_IN_ALLOWED_POSITION,
                                format!(
                                    "Variable \"${}\" of type \"{var_type}\" used in position expecting type \"{location_type}\".",
                                    usage.name.as_str()
                                ),
                            )
                            .with_spans([definition.span, usage.name.span]),
                        );
                    }
                }
                VisitAction::Skip
            }
            _ => VisitAction::Skip,
        }
    }
}

/// A nullable variable may flow into a non-null position only when a
/// non-null default exists on either side.
fn allowed_variable_usage(
    schema: &Schema,
    var_type: &TypeRef,
    var_default: Option<&Value>,
    location_type: &TypeRef,
    has_location_default: bool,
) -> bool {
    if location_type.is_non_null() && !var_type.is_non_null() {
        let has_non_null_var_default = var_default.is_some_and(|value| !value.is_null());
        if !has_non_null_var_default && !has_location_default {
            return false;
        }
        return schema.is_type_sub_type_of(var_type, location_type.nullable());
    }
    schema.is_type_sub_type_of(var_type, location_type)
}

/// Variables must be compatible with every position they are used in.
pub fn variables_in_allowed_position<'a>(
    context: &'a ValidationContext<'a>,
) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(VariablesInAllowedPosition { context })
}
