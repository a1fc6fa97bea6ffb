//! Schema model.
//!
//! A [`Schema`] is plain data: named types keyed by name, directive
//! definitions, and the names of the root operation types. Types refer to
//! each other by name, so mutually recursive types need no special handling.
//! Spans point back into the SDL source the schema was built from (if any)
//! and are only used to locate validation errors.

use std::fmt;
use std::sync::{Arc, OnceLock};

use gqlkit_core::{Diagnostic, Source, Span};
use gqlkit_syntax::{ast, DirectiveLocation, OperationType};
use indexmap::IndexMap;

use crate::directives::specified_directives;
use crate::scalars::BUILTIN_SCALARS;

/// A GraphQL schema.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub description: Option<String>,
    pub query_type: Option<String>,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    pub types: IndexMap<String, TypeDef>,
    pub directives: IndexMap<String, DirectiveDef>,
    /// Where the schema came from, for error locations.
    pub origin: Option<SchemaOrigin>,
    /// Skip [`assert_valid`](crate::assert_valid) checks for this schema.
    pub assume_valid: bool,
    pub(crate) validation: OnceLock<Vec<Diagnostic>>,
}

/// The SDL document a schema was built from.
#[derive(Debug, Clone)]
pub struct SchemaOrigin {
    pub source: Arc<Source>,
    /// Span of the `schema { ... }` definition, if the document had one.
    pub schema_definition: Option<Span>,
    /// Spans of the type names in the `query: T` entries of the schema
    /// definition.
    pub operation_types: Vec<(OperationType, Span)>,
}

impl SchemaOrigin {
    /// Span of the type named for `operation` in the schema definition.
    pub fn operation_type_span(&self, operation: OperationType) -> Option<Span> {
        self.operation_types
            .iter()
            .find(|(op, _)| *op == operation)
            .map(|(_, span)| *span)
    }
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets a type by name.
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Returns all types.
    pub fn types(&self) -> impl Iterator<Item = (&String, &TypeDef)> {
        self.types.iter()
    }

    /// Gets a directive definition by name.
    pub fn directive(&self, name: &str) -> Option<&DirectiveDef> {
        self.directives.get(name)
    }

    /// The source the schema was built from.
    pub fn source(&self) -> Option<&Arc<Source>> {
        self.origin.as_ref().map(|o| &o.source)
    }

    /// Name of the root type for `operation`.
    pub fn root_type_name(&self, operation: OperationType) -> Option<&str> {
        match operation {
            OperationType::Query => self.query_type.as_deref(),
            OperationType::Mutation => self.mutation_type.as_deref(),
            OperationType::Subscription => self.subscription_type.as_deref(),
        }
    }

    /// Root type for `operation`, if it is declared and exists.
    pub fn root_type(&self, operation: OperationType) -> Option<&TypeDef> {
        self.root_type_name(operation)
            .and_then(|name| self.types.get(name))
    }

    /// Gets an object type by name.
    pub fn object(&self, name: &str) -> Option<&ObjectDef> {
        match self.types.get(name) {
            Some(TypeDef::Object(o)) => Some(o),
            _ => None,
        }
    }

    /// Looks up `field_name` on an object or interface type.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        self.types.get(type_name)?.fields()?.get(field_name)
    }

    /// Like [`Schema::field`], but also resolves the `__typename` meta field
    /// on composite types.
    pub fn field_def(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        if field_name == "__typename" && self.types.get(type_name).is_some_and(TypeDef::is_composite) {
            return Some(typename_field());
        }
        self.field(type_name, field_name)
    }

    /// Resolves the named type at the bottom of `ty`.
    pub fn named_type(&self, ty: &TypeRef) -> Option<&TypeDef> {
        self.types.get(ty.named_type())
    }
}

/// The kind of a named type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "Scalar",
            Self::Object => "Object",
            Self::Interface => "Interface",
            Self::Union => "Union",
            Self::Enum => "Enum",
            Self::InputObject => "Input Object",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A type definition.
#[derive(Debug, Clone)]
pub enum TypeDef {
    Scalar(ScalarDef),
    Object(ObjectDef),
    Interface(InterfaceDef),
    Union(UnionDef),
    Enum(EnumDef),
    InputObject(InputObjectDef),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(d) => &d.name,
            Self::Object(d) => &d.name,
            Self::Interface(d) => &d.name,
            Self::Union(d) => &d.name,
            Self::Enum(d) => &d.name,
            Self::InputObject(d) => &d.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Scalar(d) => d.description.as_deref(),
            Self::Object(d) => d.description.as_deref(),
            Self::Interface(d) => d.description.as_deref(),
            Self::Union(d) => d.description.as_deref(),
            Self::Enum(d) => d.description.as_deref(),
            Self::InputObject(d) => d.description.as_deref(),
        }
    }

    /// Span of the SDL definition, if built from a document.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Scalar(d) => d.span,
            Self::Object(d) => d.span,
            Self::Interface(d) => d.span,
            Self::Union(d) => d.span,
            Self::Enum(d) => d.span,
            Self::InputObject(d) => d.span,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Scalar(_) => TypeKind::Scalar,
            Self::Object(_) => TypeKind::Object,
            Self::Interface(_) => TypeKind::Interface,
            Self::Union(_) => TypeKind::Union,
            Self::Enum(_) => TypeKind::Enum,
            Self::InputObject(_) => TypeKind::InputObject,
        }
    }

    /// Output fields of an object or interface type.
    pub fn fields(&self) -> Option<&IndexMap<String, FieldDef>> {
        match self {
            Self::Object(d) => Some(&d.fields),
            Self::Interface(d) => Some(&d.fields),
            _ => None,
        }
    }

    /// Interfaces declared by an object or interface type.
    pub fn interfaces(&self) -> &[String] {
        match self {
            Self::Object(d) => &d.implements,
            Self::Interface(d) => &d.implements,
            _ => &[],
        }
    }

    /// Scalars, enums and input objects.
    pub fn is_input_type(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_) | Self::InputObject(_))
    }

    /// Everything but input objects.
    pub fn is_output_type(&self) -> bool {
        !matches!(self, Self::InputObject(_))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_))
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Interface(_) | Self::Union(_))
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface(_) | Self::Union(_))
    }
}

/// Scalar type definition.
#[derive(Debug, Clone)]
pub struct ScalarDef {
    pub name: String,
    pub description: Option<String>,
    pub span: Option<Span>,
}

/// Object type definition.
#[derive(Debug, Clone)]
pub struct ObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
    pub implements: Vec<String>,
    pub span: Option<Span>,
}

/// Interface type definition.
#[derive(Debug, Clone)]
pub struct InterfaceDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
    pub implements: Vec<String>,
    pub span: Option<Span>,
}

/// Union type definition.
#[derive(Debug, Clone)]
pub struct UnionDef {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
    pub span: Option<Span>,
}

/// Enum type definition.
#[derive(Debug, Clone)]
pub struct EnumDef {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValueDef>,
    pub span: Option<Span>,
}

impl EnumDef {
    pub fn value(&self, name: &str) -> Option<&EnumValueDef> {
        self.values.iter().find(|v| v.name == name)
    }
}

/// Enum value definition.
#[derive(Debug, Clone)]
pub struct EnumValueDef {
    pub name: String,
    pub description: Option<String>,
    pub deprecated: bool,
    pub deprecation_reason: Option<String>,
    pub span: Option<Span>,
}

/// Input object type definition.
#[derive(Debug, Clone)]
pub struct InputObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputValueDef>,
    pub span: Option<Span>,
}

/// Field definition.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: IndexMap<String, InputValueDef>,
    pub deprecated: bool,
    pub deprecation_reason: Option<String>,
    pub span: Option<Span>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            arguments: IndexMap::new(),
            deprecated: false,
            deprecation_reason: None,
            span: None,
        }
    }

    #[must_use]
    pub fn argument(mut self, arg: InputValueDef) -> Self {
        self.arguments.insert(arg.name.clone(), arg);
        self
    }
}

/// The `__typename: String!` meta field available on every composite type.
pub fn typename_field() -> &'static FieldDef {
    static TYPENAME: OnceLock<FieldDef> = OnceLock::new();
    TYPENAME.get_or_init(|| FieldDef {
        description: Some("The name of the current Object type at runtime.".into()),
        ..FieldDef::new("__typename", TypeRef::non_null(TypeRef::named("String")))
    })
}

/// An argument or input object field.
#[derive(Debug, Clone)]
pub struct InputValueDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    /// Default as a constant literal.
    pub default_value: Option<ast::Value>,
    pub span: Option<Span>,
}

impl InputValueDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            default_value: None,
            span: None,
        }
    }

    #[must_use]
    pub fn default_value(mut self, value: ast::Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Directive definition.
#[derive(Debug, Clone)]
pub struct DirectiveDef {
    pub name: String,
    pub description: Option<String>,
    pub arguments: IndexMap<String, InputValueDef>,
    pub locations: Vec<DirectiveLocation>,
    pub repeatable: bool,
    pub span: Option<Span>,
}

/// Type reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn non_null(inner: TypeRef) -> Self {
        Self::NonNull(Box::new(inner))
    }

    /// Converts an AST type reference.
    pub fn from_ast(ty: &ast::Type) -> Self {
        match ty {
            ast::Type::Named(name) => Self::Named(name.value.clone()),
            ast::Type::List(inner, _) => Self::list(Self::from_ast(inner)),
            ast::Type::NonNull(inner, _) => Self::non_null(Self::from_ast(inner)),
        }
    }

    /// Name of the innermost named type.
    pub fn named_type(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    pub fn is_list(&self) -> bool {
        match self {
            Self::List(_) => true,
            Self::NonNull(inner) => inner.is_list(),
            Self::Named(_) => false,
        }
    }

    /// Strips one `NonNull` wrapper, if present.
    pub fn nullable(&self) -> &TypeRef {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }

    /// Item type of a (possibly non-null) list.
    pub fn list_item(&self) -> Option<&TypeRef> {
        match self.nullable() {
            Self::List(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// Schema builder for programmatic schemas.
#[derive(Debug)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    /// Creates a new schema builder with the built-in scalars registered.
    pub fn new() -> Self {
        let mut schema = Schema::new();
        for name in BUILTIN_SCALARS {
            schema.types.insert(
                name.to_string(),
                TypeDef::Scalar(ScalarDef {
                    name: name.to_string(),
                    description: None,
                    span: None,
                }),
            );
        }
        Self { schema }
    }

    /// Sets the schema description.
    #[must_use]
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.schema.description = Some(desc.into());
        self
    }

    /// Sets the query type.
    #[must_use]
    pub fn query_type(mut self, name: impl Into<String>) -> Self {
        self.schema.query_type = Some(name.into());
        self
    }

    /// Sets the mutation type.
    #[must_use]
    pub fn mutation_type(mut self, name: impl Into<String>) -> Self {
        self.schema.mutation_type = Some(name.into());
        self
    }

    /// Sets the subscription type.
    #[must_use]
    pub fn subscription_type(mut self, name: impl Into<String>) -> Self {
        self.schema.subscription_type = Some(name.into());
        self
    }

    /// Sets the root type for `operation`.
    #[must_use]
    pub fn root_type(self, operation: OperationType, name: impl Into<String>) -> Self {
        match operation {
            OperationType::Query => self.query_type(name),
            OperationType::Mutation => self.mutation_type(name),
            OperationType::Subscription => self.subscription_type(name),
        }
    }

    /// Adds a type, replacing any previous type with the same name.
    #[must_use]
    pub fn add_type(mut self, type_def: TypeDef) -> Self {
        self.schema
            .types
            .insert(type_def.name().to_string(), type_def);
        self
    }

    /// Adds a directive definition.
    #[must_use]
    pub fn add_directive(mut self, directive: DirectiveDef) -> Self {
        self.schema
            .directives
            .insert(directive.name.clone(), directive);
        self
    }

    /// Marks the schema as already validated.
    #[must_use]
    pub fn assume_valid(mut self, assume_valid: bool) -> Self {
        self.schema.assume_valid = assume_valid;
        self
    }

    /// Records the originating SDL document.
    #[must_use]
    pub fn origin(mut self, origin: SchemaOrigin) -> Self {
        self.schema.origin = Some(origin);
        self
    }

    /// Builds the schema. `@skip`, `@include` and `@deprecated` are added
    /// unless a directive with the same name was already provided.
    pub fn build(mut self) -> Schema {
        for directive in specified_directives() {
            if !self.schema.directives.contains_key(&directive.name) {
                self.schema
                    .directives
                    .insert(directive.name.clone(), directive.clone());
            }
        }
        self.schema
    }
}
