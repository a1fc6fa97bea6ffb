//! Builds a [`Schema`] from type-system definitions.
//!
//! Building happens in two passes. The first collects the schema
//! definition, every named type and every directive, rejecting duplicates.
//! The second converts each definition, resolving type references by name
//! against the collected set, so forward and circular references need no
//! ordering.

use gqlkit_core::Span;
use gqlkit_syntax::{ast, Definition, Document, OperationType, TypeDefinition};
use indexmap::IndexMap;
use thiserror::Error;
use tracing::debug;

use crate::directives::DEFAULT_DEPRECATION_REASON;
use crate::scalars::is_builtin_scalar;
use crate::schema::{
    DirectiveDef, EnumDef, EnumValueDef, FieldDef, InputObjectDef, InputValueDef, InterfaceDef,
    ObjectDef, ScalarDef, Schema, SchemaBuilder, SchemaOrigin, TypeDef, TypeRef, UnionDef,
};

/// Options for [`build_schema`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildSchemaOptions {
    /// Mark the built schema as valid so `assert_valid` is skipped.
    pub assume_valid: bool,
}

/// Errors that make a document unusable as a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Must provide only one schema definition.")]
    DuplicateSchemaDefinition { span: Span },

    #[error("Type \"{name}\" was defined more than once.")]
    DuplicateType { name: String, span: Span },

    #[error("Directive \"@{name}\" was defined more than once.")]
    DuplicateDirective { name: String, span: Span },

    #[error("Must provide only one {operation} type in schema.")]
    DuplicateOperationType {
        operation: OperationType,
        span: Span,
    },

    #[error("Specified {operation} type {name} not found in document.")]
    MissingOperationType {
        operation: OperationType,
        name: String,
        span: Span,
    },

    #[error("Type \"{name}\" not found in document.")]
    UnknownType { name: String, span: Span },
}

impl SchemaError {
    /// Location of the offending definition.
    pub fn span(&self) -> Span {
        match self {
            Self::DuplicateSchemaDefinition { span }
            | Self::DuplicateType { span, .. }
            | Self::DuplicateDirective { span, .. }
            | Self::DuplicateOperationType { span, .. }
            | Self::MissingOperationType { span, .. }
            | Self::UnknownType { span, .. } => *span,
        }
    }
}

/// Builds a schema from the type-system definitions in `document`.
/// Executable definitions are ignored.
///
/// Root types come from the `schema` definition when there is one, and
/// otherwise from types named `Query`, `Mutation` and `Subscription`.
pub fn build_schema(document: &Document, options: BuildSchemaOptions) -> Result<Schema, SchemaError> {
    let mut schema_def: Option<&ast::SchemaDefinition> = None;
    let mut type_defs: IndexMap<&str, &TypeDefinition> = IndexMap::new();
    let mut directive_defs: IndexMap<&str, &ast::DirectiveDefinition> = IndexMap::new();

    for definition in &document.definitions {
        match definition {
            Definition::Schema(def) => {
                if schema_def.is_some() {
                    return Err(SchemaError::DuplicateSchemaDefinition { span: def.span });
                }
                schema_def = Some(def);
            }
            Definition::Type(def) => {
                let name = def.name().as_str();
                if type_defs.insert(name, def).is_some() {
                    return Err(SchemaError::DuplicateType {
                        name: name.to_string(),
                        span: def.span(),
                    });
                }
            }
            Definition::Directive(def) => {
                let name = def.name.as_str();
                if directive_defs.insert(name, def).is_some() {
                    return Err(SchemaError::DuplicateDirective {
                        name: name.to_string(),
                        span: def.span,
                    });
                }
            }
            Definition::Operation(_) | Definition::Fragment(_) => {}
        }
    }

    let mut origin = SchemaOrigin {
        source: document.source.clone(),
        schema_definition: schema_def.map(|def| def.span),
        operation_types: Vec::new(),
    };
    let mut builder = SchemaBuilder::new().assume_valid(options.assume_valid);

    if let Some(def) = schema_def {
        for op_type in &def.operation_types {
            let operation = op_type.operation;
            if origin.operation_type_span(operation).is_some() {
                return Err(SchemaError::DuplicateOperationType {
                    operation,
                    span: op_type.span,
                });
            }
            let name = op_type.type_name.as_str();
            if !type_defs.contains_key(name) {
                return Err(SchemaError::MissingOperationType {
                    operation,
                    name: name.to_string(),
                    span: op_type.type_name.span,
                });
            }
            origin.operation_types.push((operation, op_type.type_name.span));
            builder = builder.root_type(operation, name);
        }
        builder = match &def.description {
            Some(desc) => builder.description(desc.value.clone()),
            None => builder,
        };
    } else {
        for operation in [
            OperationType::Query,
            OperationType::Mutation,
            OperationType::Subscription,
        ] {
            let name = operation.default_type_name();
            if type_defs.contains_key(name) {
                builder = builder.root_type(operation, name);
            }
        }
    }

    let resolver = TypeResolver { known: &type_defs };
    for def in type_defs.values() {
        builder = builder.add_type(resolver.type_def(def)?);
    }
    for def in directive_defs.values() {
        builder = builder.add_directive(resolver.directive_def(def)?);
    }

    let schema = builder.origin(origin).build();
    debug!(
        types = schema.types.len(),
        directives = schema.directives.len(),
        "built schema"
    );
    Ok(schema)
}

/// Converts AST definitions, checking every type reference by name.
struct TypeResolver<'d> {
    known: &'d IndexMap<&'d str, &'d TypeDefinition>,
}

impl TypeResolver<'_> {
    fn type_ref(&self, ty: &ast::Type) -> Result<TypeRef, SchemaError> {
        let name = ty.name();
        if !self.known.contains_key(name.as_str()) && !is_builtin_scalar(name.as_str()) {
            return Err(SchemaError::UnknownType {
                name: name.value.clone(),
                span: name.span,
            });
        }
        Ok(TypeRef::from_ast(ty))
    }

    fn named(&self, name: &ast::Name) -> Result<String, SchemaError> {
        if self.known.contains_key(name.as_str()) || is_builtin_scalar(name.as_str()) {
            Ok(name.value.clone())
        } else {
            Err(SchemaError::UnknownType {
                name: name.value.clone(),
                span: name.span,
            })
        }
    }

    fn type_def(&self, def: &TypeDefinition) -> Result<TypeDef, SchemaError> {
        Ok(match def {
            TypeDefinition::Scalar(d) => TypeDef::Scalar(ScalarDef {
                name: d.name.value.clone(),
                description: description(d.description.as_ref()),
                span: Some(d.span),
            }),
            TypeDefinition::Object(d) => TypeDef::Object(ObjectDef {
                name: d.name.value.clone(),
                description: description(d.description.as_ref()),
                fields: self.fields(&d.fields)?,
                implements: self.names(&d.interfaces)?,
                span: Some(d.span),
            }),
            TypeDefinition::Interface(d) => TypeDef::Interface(InterfaceDef {
                name: d.name.value.clone(),
                description: description(d.description.as_ref()),
                fields: self.fields(&d.fields)?,
                implements: self.names(&d.interfaces)?,
                span: Some(d.span),
            }),
            TypeDefinition::Union(d) => TypeDef::Union(UnionDef {
                name: d.name.value.clone(),
                description: description(d.description.as_ref()),
                members: self.names(&d.members)?,
                span: Some(d.span),
            }),
            TypeDefinition::Enum(d) => TypeDef::Enum(EnumDef {
                name: d.name.value.clone(),
                description: description(d.description.as_ref()),
                values: d
                    .values
                    .iter()
                    .map(|v| {
                        let reason = deprecation_reason(&v.directives);
                        EnumValueDef {
                            name: v.name.value.clone(),
                            description: description(v.description.as_ref()),
                            deprecated: reason.is_some(),
                            deprecation_reason: reason,
                            span: Some(v.span),
                        }
                    })
                    .collect(),
                span: Some(d.span),
            }),
            TypeDefinition::InputObject(d) => TypeDef::InputObject(InputObjectDef {
                name: d.name.value.clone(),
                description: description(d.description.as_ref()),
                fields: self.input_values(&d.fields)?,
                span: Some(d.span),
            }),
        })
    }

    fn names(&self, names: &[ast::Name]) -> Result<Vec<String>, SchemaError> {
        names.iter().map(|n| self.named(n)).collect()
    }

    fn fields(
        &self,
        fields: &[ast::FieldDefinition],
    ) -> Result<IndexMap<String, FieldDef>, SchemaError> {
        fields
            .iter()
            .map(|f| {
                let reason = deprecation_reason(&f.directives);
                let field = FieldDef {
                    name: f.name.value.clone(),
                    description: description(f.description.as_ref()),
                    ty: self.type_ref(&f.ty)?,
                    arguments: self.input_values(&f.arguments)?,
                    deprecated: reason.is_some(),
                    deprecation_reason: reason,
                    span: Some(f.span),
                };
                Ok((field.name.clone(), field))
            })
            .collect()
    }

    fn input_values(
        &self,
        values: &[ast::InputValueDefinition],
    ) -> Result<IndexMap<String, InputValueDef>, SchemaError> {
        values
            .iter()
            .map(|v| {
                let value = InputValueDef {
                    name: v.name.value.clone(),
                    description: description(v.description.as_ref()),
                    ty: self.type_ref(&v.ty)?,
                    default_value: v.default_value.clone(),
                    span: Some(v.span),
                };
                Ok((value.name.clone(), value))
            })
            .collect()
    }

    fn directive_def(&self, def: &ast::DirectiveDefinition) -> Result<DirectiveDef, SchemaError> {
        Ok(DirectiveDef {
            name: def.name.value.clone(),
            description: description(def.description.as_ref()),
            arguments: self.input_values(&def.arguments)?,
            locations: def.locations.clone(),
            repeatable: def.repeatable,
            span: Some(def.span),
        })
    }
}

fn description(value: Option<&ast::StringValue>) -> Option<String> {
    value.map(|s| s.value.clone())
}

/// The `@deprecated` reason, if the directive is present.
fn deprecation_reason(directives: &[ast::Directive]) -> Option<String> {
    let directive = directives.iter().find(|d| d.name.value == "deprecated")?;
    let reason = directive
        .arguments
        .iter()
        .find(|a| a.name.value == "reason")
        .and_then(|a| match &a.value {
            ast::Value::String(s) => Some(s.value.clone()),
            _ => None,
        });
    Some(reason.unwrap_or_else(|| DEFAULT_DEPRECATION_REASON.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqlkit_syntax::parse;

    fn build(sdl: &str) -> Result<Schema, SchemaError> {
        build_schema(&parse(sdl).unwrap(), BuildSchemaOptions::default())
    }

    #[test]
    fn test_build_by_convention() {
        let schema = build(
            r#"
            "The root"
            type Query { user(id: ID!): User }
            type User { id: ID!, friends: [User!]! @deprecated(reason: "use links") }
            type Mutation { noop: Boolean }
            "#,
        )
        .unwrap();

        assert_eq!(schema.query_type.as_deref(), Some("Query"));
        assert_eq!(schema.mutation_type.as_deref(), Some("Mutation"));
        assert_eq!(schema.subscription_type, None);
        assert_eq!(schema.get_type("Query").unwrap().description(), Some("The root"));

        let friends = schema.field("User", "friends").unwrap();
        assert_eq!(friends.ty.to_string(), "[User!]!");
        assert!(friends.deprecated);
        assert_eq!(friends.deprecation_reason.as_deref(), Some("use links"));

        let user = schema.field("Query", "user").unwrap();
        assert_eq!(user.arguments["id"].ty.to_string(), "ID!");
        assert!(schema.directive("skip").is_some());
    }

    #[test]
    fn test_explicit_schema_definition() {
        let schema = build(
            "schema { query: Root mutation: Changes } type Root { a: Int } type Changes { b: Int } type Query { c: Int }",
        )
        .unwrap();
        assert_eq!(schema.query_type.as_deref(), Some("Root"));
        assert_eq!(schema.mutation_type.as_deref(), Some("Changes"));
        let origin = schema.origin.as_ref().unwrap();
        assert!(origin.schema_definition.is_some());
        assert!(origin.operation_type_span(OperationType::Query).is_some());
        assert!(origin.operation_type_span(OperationType::Subscription).is_none());
    }

    #[test]
    fn test_duplicate_type() {
        let err = build("type Query { a: Int } type Query { b: Int }").unwrap_err();
        assert_eq!(err.to_string(), "Type \"Query\" was defined more than once.");
    }

    #[test]
    fn test_duplicate_schema_definition() {
        let err = build("schema { query: Query } schema { query: Query } type Query { a: Int }")
            .unwrap_err();
        assert_eq!(err.to_string(), "Must provide only one schema definition.");
    }

    #[test]
    fn test_duplicate_operation_type() {
        let err = build("schema { query: Query query: Query } type Query { a: Int }").unwrap_err();
        assert_eq!(err.to_string(), "Must provide only one query type in schema.");
    }

    #[test]
    fn test_missing_operation_type() {
        let err = build("schema { query: Query mutation: Missing } type Query { a: Int }")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Specified mutation type Missing not found in document."
        );
    }

    #[test]
    fn test_unknown_type_reference() {
        let err = build("type Query { a: Nope }").unwrap_err();
        assert_eq!(err.to_string(), "Type \"Nope\" not found in document.");
    }

    #[test]
    fn test_user_directive_replaces_builtin() {
        let schema = build("directive @skip(when: Boolean) on FIELD type Query { a: Int }").unwrap();
        let skip = schema.directive("skip").unwrap();
        assert!(skip.arguments.contains_key("when"));
        assert!(schema.directive("include").is_some());
    }

    #[test]
    fn test_circular_references() {
        let schema = build(
            "type Query { node: Node } interface Node { parent: Node } type A implements Node { parent: Node, self: A }",
        )
        .unwrap();
        assert_eq!(schema.field("A", "self").unwrap().ty.named_type(), "A");
        assert_eq!(schema.get_type("A").unwrap().interfaces(), ["Node".to_string()]);
    }
}
