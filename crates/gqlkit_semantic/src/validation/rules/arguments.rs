use gqlkit_core::diagnostics::codes;
use gqlkit_core::{Diagnostic, Span};
use gqlkit_syntax::{Argument, Node, VisitAction, Visitor};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::schema::InputValueDef;
use crate::validation::ValidationContext;

struct KnownArgumentNames<'a> {
    context: &'a ValidationContext<'a>,
    in_directive: bool,
}

impl<'a> Visitor<'a> for KnownArgumentNames<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::Directive(_) => self.in_directive = true,
            Node::Argument(arg) => {
                let type_info = self.context.type_info();
                if type_info.argument().is_some() {
                    return VisitAction::Continue;
                }
                let name = arg.name.as_str();
                let message = if self.in_directive {
                    type_info
                        .directive()
                        .map(|d| format!("Unknown argument \"{name}\" on directive \"@{}\".", d.name))
                } else {
                    type_info.field_def().zip(type_info.parent_type()).map(|(field, parent)| {
                        format!("Unknown argument \"{name}\" on field \"{parent}.{}\".", field.name)
                    })
                };
                if let Some(message) = message {
                    self.context.report(
                        Diagnostic::error(codes::KNOWN_ARGUMENT_NAMES, message).with_span(arg.span),
                    );
                }
            }
            _ => {}
        }
        VisitAction::Continue
    }

    fn leave(&mut self, node: Node<'a>) -> VisitAction {
        if let Node::Directive(_) = node {
            self.in_directive = false;
        }
        VisitAction::Continue
    }
}

/// Arguments must be defined by the field or directive they are passed to.
pub fn known_argument_names<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(KnownArgumentNames {
        context,
        in_directive: false,
    })
}

struct UniqueArgumentNames<'a> {
    context: &'a ValidationContext<'a>,
}

impl UniqueArgumentNames<'_> {
    fn check(&self, arguments: &[Argument]) {
        let mut seen: FxHashMap<&str, Span> = FxHashMap::default();
        for arg in arguments {
            let name = arg.name.as_str();
            if let Some(first) = seen.get(name) {
                self.context.report(
                    Diagnostic::error(
                        codes::UNIQUE_ARGUMENT_NAMES,
                        format!("There can be only one argument named \"{name}\"."),
                    )
                    .with_spans([*first, arg.name.span]),
                );
            } else {
                seen.insert(name, arg.name.span);
            }
        }
    }
}

impl<'a> Visitor<'a> for UniqueArgumentNames<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::Field(field) => self.check(&field.arguments),
            Node::Directive(directive) => self.check(&directive.arguments),
            _ => {}
        }
        VisitAction::Continue
    }
}

pub fn unique_argument_names<'a>(context: &'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(UniqueArgumentNames { context })
}

struct ProvidedRequiredArguments<'a> {
    context: &'a ValidationContext<'a>,
}

/// Required arguments of `definitions` that `provided` does not mention.
fn missing_required<'d>(
    definitions: &'d IndexMap<String, InputValueDef>,
    provided: &[Argument],
) -> impl Iterator<Item = &'d InputValueDef> + 'd {
    let provided: Vec<String> = provided.iter().map(|arg| arg.name.value.clone()).collect();
    definitions.values().filter(move |def| {
        def.ty.is_non_null() && def.default_value.is_none() && !provided.contains(&def.name)
    })
}

impl<'a> Visitor<'a> for ProvidedRequiredArguments<'a> {
    fn enter(&mut self, node: Node<'a>) -> VisitAction {
        match node {
            Node::Field(field) => {
                let type_info = self.context.type_info();
                let Some(def) = type_info.field_def() else {
                    return VisitAction::Continue;
                };
                for arg in missing_required(&def.arguments, &field.arguments) {
                    self.context.report(
                        Diagnostic::error(
                            codes::PROVIDED_REQUIRED_ARGUMENTS,
                            format!(
                                "Field \"{}\" argument \"{}\" of type \"{}\" is required, but it was not provided.",
                                def.name, arg.name, arg.ty
                            ),
                        )
                        .with_span(field.span),
                    );
                }
            }
            Node::Directive(directive) => {
                let Some(def) = self.context.schema().directive(directive.name.as_str()) else {
                    return VisitAction::Continue;
                };
                for arg in missing_required(&def.arguments, &directive.arguments) {
                    self.context.report(
                        Diagnostic::error(
                            codes::PROVIDED_REQUIRED_ARGUMENTS,
                            format!(
                                "Directive \"@{}\" argument \"{}\" of type \"{}\" is required, but it was not provided.",
                                def.name, arg.name, arg.ty
                            ),
                        )
                        .with_span(directive.span),
                    );
                }
            }
            _ => {}
        }
        VisitAction::Continue
    }
}

/// Non-null arguments without a default must be passed.
pub fn provided_required_arguments<'a>(
    context: &'a ValidationContext<'a>,
) -> Box<dyn Visitor<'a> + 'a> {
    Box::new(ProvidedRequiredArguments { context })
}
