//! Abstract syntax tree types for GraphQL documents.
//!
//! Nodes own their children and carry the [`Span`] they were parsed from.
//! The [`Document`] keeps the [`Source`] so spans can be turned into
//! line/column locations.

use std::sync::Arc;

use crate::token::{DirectiveLocation, Token};
use gqlkit_core::{Source, SourceLocation, Span};

/// A complete document.
#[derive(Debug, Clone)]
pub struct Document {
    pub definitions: Vec<Definition>,
    pub span: Span,
    /// Every comment token, in source order.
    pub comments: Vec<Token>,
    pub source: Arc<Source>,
}

impl Document {
    /// Iterates over operation definitions in document order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationDefinition> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Operation(op) => Some(op),
            _ => None,
        })
    }

    /// Iterates over fragment definitions in document order.
    pub fn fragments(&self) -> impl Iterator<Item = &FragmentDefinition> {
        self.definitions.iter().filter_map(|def| match def {
            Definition::Fragment(frag) => Some(frag),
            _ => None,
        })
    }

    /// The run of comments directly above `span`: only whitespace, line
    /// terminators and commas may separate them from each other and from
    /// the node.
    pub fn leading_comments(&self, span: Span) -> &[Token] {
        let body = self.source.body();
        let before = self.comments.partition_point(|c| c.span.end <= span.start);
        let mut first = before;
        let mut end = span.start;
        while first > 0 {
            let comment = &self.comments[first - 1];
            let gap = &body[comment.span.end as usize..end as usize];
            if !gap.chars().all(|c| c.is_whitespace() || c == ',') {
                break;
            }
            first -= 1;
            end = comment.span.start;
        }
        &self.comments[first..before]
    }

    /// Finds the first fragment with the given name.
    pub fn fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        self.fragments().find(|frag| frag.name.value == name)
    }

    /// Resolves a span to a line/column pair in this document's source.
    #[must_use]
    pub fn location(&self, span: Span) -> SourceLocation {
        self.source.location(span.start)
    }
}

/// A top-level definition.
#[derive(Debug, Clone)]
pub enum Definition {
    Operation(OperationDefinition),
    Fragment(FragmentDefinition),
    Schema(SchemaDefinition),
    Type(TypeDefinition),
    Directive(DirectiveDefinition),
}

impl Definition {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Operation(d) => d.span,
            Self::Fragment(d) => d.span,
            Self::Schema(d) => d.span,
            Self::Type(d) => d.span(),
            Self::Directive(d) => d.span,
        }
    }

    /// Returns true for operations and fragments.
    #[must_use]
    pub fn is_executable(&self) -> bool {
        matches!(self, Self::Operation(_) | Self::Fragment(_))
    }
}

/// Type of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }

    #[must_use]
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "query" => Some(Self::Query),
            "mutation" => Some(Self::Mutation),
            "subscription" => Some(Self::Subscription),
            _ => None,
        }
    }

    /// Conventional root type name, e.g. `Query`.
    #[must_use]
    pub const fn default_type_name(self) -> &'static str {
        match self {
            Self::Query => "Query",
            Self::Mutation => "Mutation",
            Self::Subscription => "Subscription",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `query Name($v: T) @dir { ... }`, or the `{ ... }` shorthand.
#[derive(Debug, Clone)]
pub struct OperationDefinition {
    pub operation: OperationType,
    pub name: Option<Name>,
    pub variable_definitions: Vec<VariableDefinition>,
    pub directives: Vec<Directive>,
    pub selection_set: SelectionSet,
    pub span: Span,
}

/// `$name: Type = default @dir`
#[derive(Debug, Clone)]
pub struct VariableDefinition {
    pub variable: Name,
    pub ty: Type,
    pub default_value: Option<Value>,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// `fragment Name on Type @dir { ... }`
#[derive(Debug, Clone)]
pub struct FragmentDefinition {
    pub name: Name,
    pub type_condition: Name,
    pub directives: Vec<Directive>,
    pub selection_set: SelectionSet,
    pub span: Span,
}

/// A `{ ... }` block of selections.
#[derive(Debug, Clone)]
pub struct SelectionSet {
    pub selections: Vec<Selection>,
    pub span: Span,
}

/// A selection.
#[derive(Debug, Clone)]
pub enum Selection {
    Field(Field),
    FragmentSpread(FragmentSpread),
    InlineFragment(InlineFragment),
}

impl Selection {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Field(f) => f.span,
            Self::FragmentSpread(f) => f.span,
            Self::InlineFragment(f) => f.span,
        }
    }

    #[must_use]
    pub fn directives(&self) -> &[Directive] {
        match self {
            Self::Field(f) => &f.directives,
            Self::FragmentSpread(f) => &f.directives,
            Self::InlineFragment(f) => &f.directives,
        }
    }
}

/// `alias: name(args) @dir { ... }`
#[derive(Debug, Clone)]
pub struct Field {
    pub alias: Option<Name>,
    pub name: Name,
    pub arguments: Vec<Argument>,
    pub directives: Vec<Directive>,
    pub selection_set: Option<SelectionSet>,
    pub span: Span,
}

impl Field {
    /// The key this field's value is stored under in the response.
    #[must_use]
    pub fn response_key(&self) -> &str {
        self.alias.as_ref().unwrap_or(&self.name).as_str()
    }
}

/// `...Name @dir`
#[derive(Debug, Clone)]
pub struct FragmentSpread {
    pub name: Name,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// `... on Type @dir { ... }`
#[derive(Debug, Clone)]
pub struct InlineFragment {
    pub type_condition: Option<Name>,
    pub directives: Vec<Directive>,
    pub selection_set: SelectionSet,
    pub span: Span,
}

/// `name: value`
#[derive(Debug, Clone)]
pub struct Argument {
    pub name: Name,
    pub value: Value,
    pub span: Span,
}

/// `@name(args)`
#[derive(Debug, Clone)]
pub struct Directive {
    pub name: Name,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

/// An input value literal.
///
/// Numbers keep their source text; conversion happens during coercion.
#[derive(Debug, Clone)]
pub enum Value {
    Variable(Name),
    Int(String, Span),
    Float(String, Span),
    String(StringValue),
    Boolean(bool, Span),
    Null(Span),
    Enum(Name),
    List(Vec<Value>, Span),
    Object(Vec<ObjectField>, Span),
}

impl Value {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Variable(name) | Self::Enum(name) => name.span,
            Self::Int(_, span)
            | Self::Float(_, span)
            | Self::Boolean(_, span)
            | Self::Null(span)
            | Self::List(_, span)
            | Self::Object(_, span) => *span,
            Self::String(s) => s.span,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null(_))
    }

    /// Returns the variable name if this is `$name`.
    #[must_use]
    pub fn as_variable(&self) -> Option<&Name> {
        match self {
            Self::Variable(name) => Some(name),
            _ => None,
        }
    }
}

/// A string literal. `block` records the `"""` form.
#[derive(Debug, Clone)]
pub struct StringValue {
    pub value: String,
    pub block: bool,
    pub span: Span,
}

/// `name: value` inside an object literal.
#[derive(Debug, Clone)]
pub struct ObjectField {
    pub name: Name,
    pub value: Value,
    pub span: Span,
}

/// A type reference.
#[derive(Debug, Clone)]
pub enum Type {
    Named(Name),
    List(Box<Type>, Span),
    NonNull(Box<Type>, Span),
}

impl Type {
    /// The innermost named type.
    #[must_use]
    pub fn name(&self) -> &Name {
        match self {
            Self::Named(name) => name,
            Self::List(inner, _) | Self::NonNull(inner, _) => inner.name(),
        }
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Named(name) => name.span,
            Self::List(_, span) | Self::NonNull(_, span) => *span,
        }
    }

    #[must_use]
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(..))
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name.as_str()),
            Self::List(inner, _) => write!(f, "[{inner}]"),
            Self::NonNull(inner, _) => write!(f, "{inner}!"),
        }
    }
}

/// An identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name {
    pub value: String,
    pub span: Span,
}

impl Name {
    #[must_use]
    pub fn new(value: impl Into<String>, span: Span) -> Self {
        Self {
            value: value.into(),
            span,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

// ---------------------------------------------------------------------------
// Type system definitions
// ---------------------------------------------------------------------------

/// `schema @dir { query: Q mutation: M }`
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    pub description: Option<StringValue>,
    pub directives: Vec<Directive>,
    pub operation_types: Vec<OperationTypeDefinition>,
    pub span: Span,
}

/// `query: TypeName` inside a schema definition.
#[derive(Debug, Clone)]
pub struct OperationTypeDefinition {
    pub operation: OperationType,
    pub type_name: Name,
    pub span: Span,
}

/// Named type definitions.
#[derive(Debug, Clone)]
pub enum TypeDefinition {
    Scalar(ScalarTypeDefinition),
    Object(ObjectTypeDefinition),
    Interface(InterfaceTypeDefinition),
    Union(UnionTypeDefinition),
    Enum(EnumTypeDefinition),
    InputObject(InputObjectTypeDefinition),
}

impl TypeDefinition {
    #[must_use]
    pub fn name(&self) -> &Name {
        match self {
            Self::Scalar(d) => &d.name,
            Self::Object(d) => &d.name,
            Self::Interface(d) => &d.name,
            Self::Union(d) => &d.name,
            Self::Enum(d) => &d.name,
            Self::InputObject(d) => &d.name,
        }
    }

    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Scalar(d) => d.span,
            Self::Object(d) => d.span,
            Self::Interface(d) => d.span,
            Self::Union(d) => d.span,
            Self::Enum(d) => d.span,
            Self::InputObject(d) => d.span,
        }
    }

    #[must_use]
    pub fn description(&self) -> Option<&StringValue> {
        match self {
            Self::Scalar(d) => d.description.as_ref(),
            Self::Object(d) => d.description.as_ref(),
            Self::Interface(d) => d.description.as_ref(),
            Self::Union(d) => d.description.as_ref(),
            Self::Enum(d) => d.description.as_ref(),
            Self::InputObject(d) => d.description.as_ref(),
        }
    }
}

/// `scalar Name @dir`
#[derive(Debug, Clone)]
pub struct ScalarTypeDefinition {
    pub description: Option<StringValue>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// `type Name implements A & B @dir { fields }`
#[derive(Debug, Clone)]
pub struct ObjectTypeDefinition {
    pub description: Option<StringValue>,
    pub name: Name,
    pub interfaces: Vec<Name>,
    pub directives: Vec<Directive>,
    pub fields: Vec<FieldDefinition>,
    pub span: Span,
}

/// `interface Name implements A @dir { fields }`
#[derive(Debug, Clone)]
pub struct InterfaceTypeDefinition {
    pub description: Option<StringValue>,
    pub name: Name,
    pub interfaces: Vec<Name>,
    pub directives: Vec<Directive>,
    pub fields: Vec<FieldDefinition>,
    pub span: Span,
}

/// `union Name @dir = A | B`
#[derive(Debug, Clone)]
pub struct UnionTypeDefinition {
    pub description: Option<StringValue>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub members: Vec<Name>,
    pub span: Span,
}

/// `enum Name @dir { VALUES }`
#[derive(Debug, Clone)]
pub struct EnumTypeDefinition {
    pub description: Option<StringValue>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub values: Vec<EnumValueDefinition>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumValueDefinition {
    pub description: Option<StringValue>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// `input Name @dir { fields }`
#[derive(Debug, Clone)]
pub struct InputObjectTypeDefinition {
    pub description: Option<StringValue>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub fields: Vec<InputValueDefinition>,
    pub span: Span,
}

/// `name(args): Type @dir`
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub description: Option<StringValue>,
    pub name: Name,
    pub arguments: Vec<InputValueDefinition>,
    pub ty: Type,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// An argument or input field definition: `name: Type = default @dir`.
#[derive(Debug, Clone)]
pub struct InputValueDefinition {
    pub description: Option<StringValue>,
    pub name: Name,
    pub ty: Type,
    pub default_value: Option<Value>,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// `directive @name(args) repeatable on LOCATION | LOCATION`
#[derive(Debug, Clone)]
pub struct DirectiveDefinition {
    pub description: Option<StringValue>,
    pub name: Name,
    pub arguments: Vec<InputValueDefinition>,
    pub repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
    pub span: Span,
}
