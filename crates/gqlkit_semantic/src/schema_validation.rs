//! Structural schema validation.
//!
//! [`validate_schema`] runs every check once per schema and caches the
//! result. [`assert_valid`] turns a non-empty result into an error, and is
//! what document validation and execution call before doing any work.

use gqlkit_core::diagnostics::codes;
use gqlkit_core::{Diagnostic, DiagnosticBag, Span};
use gqlkit_syntax::OperationType;
use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::schema::{FieldDef, InputValueDef, Schema, TypeDef, TypeRef};

/// The schema failed [`validate_schema`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_messages(.errors))]
pub struct SchemaValidationError {
    pub errors: Vec<Diagnostic>,
}

fn join_messages(errors: &[Diagnostic]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fails if `schema` has structural errors. Schemas built with
/// `assume_valid` always pass.
pub fn assert_valid(schema: &Schema) -> Result<(), SchemaValidationError> {
    if schema.assume_valid {
        return Ok(());
    }
    let errors = validate_schema(schema);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaValidationError {
            errors: errors.to_vec(),
        })
    }
}

/// Returns every structural error in `schema`. Computed on first call.
pub fn validate_schema(schema: &Schema) -> &[Diagnostic] {
    schema.validation.get_or_init(|| {
        let mut checker = SchemaChecker {
            schema,
            errors: DiagnosticBag::new(),
        };
        checker.check_root_types();
        checker.check_directives();
        checker.check_types();
        debug!(errors = checker.errors.len(), "validated schema");
        checker.errors.into_vec()
    })
}

struct SchemaChecker<'s> {
    schema: &'s Schema,
    errors: DiagnosticBag,
}

impl<'s> SchemaChecker<'s> {
    fn report(&mut self, code: &'static str, message: String, spans: impl IntoIterator<Item = Option<Span>>) {
        self.errors
            .add(Diagnostic::error(code, message).with_spans(spans.into_iter().flatten()));
    }

    fn check_root_types(&mut self) {
        for operation in [
            OperationType::Query,
            OperationType::Mutation,
            OperationType::Subscription,
        ] {
            let root = self.schema.root_type(operation);
            let title = match operation {
                OperationType::Query => "Query",
                OperationType::Mutation => "Mutation",
                OperationType::Subscription => "Subscription",
            };

            match root {
                None if operation == OperationType::Query => {
                    let span = self.schema.origin.as_ref().and_then(|o| o.schema_definition);
                    self.report(
                        codes::ROOT_TYPES,
                        format!("{title} root type must be provided."),
                        [span],
                    );
                }
                Some(ty) if !matches!(ty, TypeDef::Object(_)) => {
                    let message = if operation == OperationType::Query {
                        format!("{title} root type must be Object type, it cannot be {}.", ty.name())
                    } else {
                        format!(
                            "{title} root type must be Object type if provided, it cannot be {}.",
                            ty.name()
                        )
                    };
                    let span = self.operation_type_location(operation, ty);
                    self.report(codes::ROOT_TYPES, message, [span]);
                }
                _ => {}
            }
        }
    }

    /// The type name in the schema definition if there is one, otherwise the
    /// type's own definition.
    fn operation_type_location(&self, operation: OperationType, ty: &TypeDef) -> Option<Span> {
        match &self.schema.origin {
            Some(origin) if origin.schema_definition.is_some() => {
                origin.operation_type_span(operation)
            }
            _ => ty.span(),
        }
    }

    fn check_directives(&mut self) {
        for directive in self.schema.directives.values() {
            self.check_name(&directive.name, directive.span);
            for arg in directive.arguments.values() {
                self.check_name(&arg.name, arg.span);
                if !self.is_input_type(&arg.ty) {
                    self.report(
                        codes::DIRECTIVE_DEFINITION,
                        format!(
                            "The type of @{}({}:) must be Input Type but got: {}.",
                            directive.name, arg.name, arg.ty
                        ),
                        [arg.span],
                    );
                }
            }
        }
    }

    fn check_types(&mut self) {
        for ty in self.schema.types.values() {
            self.check_name(ty.name(), ty.span());
            match ty {
                TypeDef::Object(o) => {
                    self.check_fields(&o.name, &o.fields, o.span);
                    self.check_interfaces(ty);
                }
                TypeDef::Interface(i) => {
                    self.check_fields(&i.name, &i.fields, i.span);
                    self.check_interfaces(ty);
                }
                TypeDef::Union(u) => {
                    if u.members.is_empty() {
                        self.report(
                            codes::UNION_MEMBER,
                            format!("Union type {} must define one or more member types.", u.name),
                            [u.span],
                        );
                    }
                    let mut seen: Vec<&str> = Vec::new();
                    for member in &u.members {
                        if seen.contains(&member.as_str()) {
                            self.report(
                                codes::UNION_MEMBER,
                                format!("Union type {} can only include type {member} once.", u.name),
                                [u.span],
                            );
                            continue;
                        }
                        seen.push(member);
                        if !matches!(self.schema.get_type(member), Some(TypeDef::Object(_))) {
                            self.report(
                                codes::UNION_MEMBER,
                                format!(
                                    "Union type {} can only include Object types, it cannot include {member}.",
                                    u.name
                                ),
                                [u.span],
                            );
                        }
                    }
                }
                TypeDef::Enum(e) => {
                    if e.values.is_empty() {
                        self.report(
                            codes::ENUM_VALUES,
                            format!("Enum type {} must define one or more values.", e.name),
                            [e.span],
                        );
                    }
                    for value in &e.values {
                        self.check_name(&value.name, value.span);
                        if matches!(value.name.as_str(), "true" | "false" | "null") {
                            self.report(
                                codes::ENUM_VALUES,
                                format!("Enum type {} cannot include value: {}.", e.name, value.name),
                                [value.span],
                            );
                        }
                    }
                }
                TypeDef::InputObject(input) => {
                    if input.fields.is_empty() {
                        self.report(
                            codes::TYPE_FIELDS,
                            format!("Input Object type {} must define one or more fields.", input.name),
                            [input.span],
                        );
                    }
                    for field in input.fields.values() {
                        self.check_name(&field.name, field.span);
                        if !self.is_input_type(&field.ty) {
                            self.report(
                                codes::INPUT_TYPE,
                                format!(
                                    "The type of {}.{} must be Input Type but got: {}.",
                                    input.name, field.name, field.ty
                                ),
                                [field.span],
                            );
                        }
                    }
                }
                TypeDef::Scalar(_) => {}
            }
        }
    }

    fn check_fields(&mut self, type_name: &str, fields: &IndexMap<String, FieldDef>, span: Option<Span>) {
        if fields.is_empty() {
            self.report(
                codes::TYPE_FIELDS,
                format!("Type {type_name} must define one or more fields."),
                [span],
            );
        }
        for field in fields.values() {
            self.check_name(&field.name, field.span);
            if !self.is_output_type(&field.ty) {
                self.report(
                    codes::OUTPUT_TYPE,
                    format!(
                        "The type of {type_name}.{} must be Output Type but got: {}.",
                        field.name, field.ty
                    ),
                    [field.span],
                );
            }
            for arg in field.arguments.values() {
                self.check_name(&arg.name, arg.span);
                if !self.is_input_type(&arg.ty) {
                    self.report(
                        codes::INPUT_TYPE,
                        format!(
                            "The type of {type_name}.{}({}:) must be Input Type but got: {}.",
                            field.name, arg.name, arg.ty
                        ),
                        [arg.span],
                    );
                }
            }
        }
    }

    fn check_interfaces(&mut self, ty: &TypeDef) {
        let type_name = ty.name();
        let mut seen: Vec<&str> = Vec::new();
        for iface_name in ty.interfaces() {
            if seen.contains(&iface_name.as_str()) {
                self.report(
                    codes::INTERFACE_IMPLEMENTATION,
                    format!("Type {type_name} can only implement {iface_name} once."),
                    [ty.span()],
                );
                continue;
            }
            seen.push(iface_name);
            let Some(TypeDef::Interface(iface)) = self.schema.get_type(iface_name) else {
                self.report(
                    codes::INTERFACE_IMPLEMENTATION,
                    format!(
                        "Type {type_name} must only implement Interface types, it cannot implement {iface_name}."
                    ),
                    [ty.span()],
                );
                continue;
            };
            let Some(fields) = ty.fields() else { continue };

            for (field_name, iface_field) in &iface.fields {
                let Some(field) = fields.get(field_name) else {
                    self.report(
                        codes::INTERFACE_IMPLEMENTATION,
                        format!(
                            "Interface field {iface_name}.{field_name} expected but {type_name} does not provide it."
                        ),
                        [iface_field.span, ty.span()],
                    );
                    continue;
                };
                if !self.schema.is_type_sub_type_of(&field.ty, &iface_field.ty) {
                    self.report(
                        codes::INTERFACE_IMPLEMENTATION,
                        format!(
                            "Interface field {iface_name}.{field_name} expects type {} but {type_name}.{field_name} is type {}.",
                            iface_field.ty, field.ty
                        ),
                        [iface_field.span, field.span],
                    );
                }
                self.check_implemented_arguments(type_name, iface_name, field, iface_field);
            }
        }
    }

    fn check_implemented_arguments(
        &mut self,
        type_name: &str,
        iface_name: &str,
        field: &FieldDef,
        iface_field: &FieldDef,
    ) {
        let field_name = &field.name;
        for (arg_name, iface_arg) in &iface_field.arguments {
            match field.arguments.get(arg_name) {
                None => self.report(
                    codes::INTERFACE_IMPLEMENTATION,
                    format!(
                        "Interface field argument {iface_name}.{field_name}({arg_name}:) expected but {type_name}.{field_name} does not provide it."
                    ),
                    [iface_arg.span, field.span],
                ),
                Some(arg) if arg.ty != iface_arg.ty => self.report(
                    codes::INTERFACE_IMPLEMENTATION,
                    format!(
                        "Interface field argument {iface_name}.{field_name}({arg_name}:) expects type {} but {type_name}.{field_name}({arg_name}:) is type {}.",
                        iface_arg.ty, arg.ty
                    ),
                    [iface_arg.span, arg.span],
                ),
                Some(_) => {}
            }
        }
        for (arg_name, arg) in &field.arguments {
            if !iface_field.arguments.contains_key(arg_name) && is_required(arg) {
                self.report(
                    codes::INTERFACE_IMPLEMENTATION,
                    format!(
                        "Object field argument {type_name}.{field_name}({arg_name}:) is of required type {} but is not also provided by the Interface field {iface_name}.{field_name}.",
                        arg.ty
                    ),
                    [arg.span, iface_field.span],
                );
            }
        }
    }

    fn check_name(&mut self, name: &str, span: Option<Span>) {
        if name.starts_with("__") {
            self.report(
                codes::RESERVED_NAME,
                format!(
                    "Name \"{name}\" must not begin with \"__\", which is reserved by GraphQL introspection."
                ),
                [span],
            );
        }
    }

    fn is_input_type(&self, ty: &TypeRef) -> bool {
        self.schema.named_type(ty).is_some_and(TypeDef::is_input_type)
    }

    fn is_output_type(&self, ty: &TypeRef) -> bool {
        self.schema.named_type(ty).is_some_and(TypeDef::is_output_type)
    }
}

fn is_required(arg: &InputValueDef) -> bool {
    arg.ty.is_non_null() && arg.default_value.is_none()
}
