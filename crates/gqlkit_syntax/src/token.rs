//! Token kinds and structures for GraphQL.

use gqlkit_core::Span;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of a lexical token.
///
/// GraphQL keywords are contextual, so `query`, `type` and friends lex as
/// [`TokenKind::Name`] and the parser matches on their value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum TokenKind {
    Eof,
    Comment,

    // Literals
    Name,
    Int,
    Float,
    String,
    BlockString,

    // Punctuation
    Bang,
    Dollar,
    Amp,
    LParen,
    RParen,
    Spread,
    Colon,
    Equals,
    At,
    LBracket,
    RBracket,
    LBrace,
    Pipe,
    RBrace,
}

impl TokenKind {
    /// Returns true for kinds whose token carries a value.
    #[must_use]
    pub const fn has_value(self) -> bool {
        matches!(
            self,
            Self::Name | Self::Int | Self::Float | Self::String | Self::BlockString | Self::Comment
        )
    }

    #[must_use]
    pub const fn is_trivia(self) -> bool {
        matches!(self, Self::Comment)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eof => "<EOF>",
            Self::Comment => "Comment",
            Self::Name => "Name",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::String => "String",
            Self::BlockString => "BlockString",
            Self::Bang => "!",
            Self::Dollar => "$",
            Self::Amp => "&",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Spread => "...",
            Self::Colon => ":",
            Self::Equals => "=",
            Self::At => "@",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::Pipe => "|",
            Self::RBrace => "}",
        }
    }

    /// Human-readable description used in "Expected X, found Y" messages.
    #[must_use]
    pub fn describe(self) -> String {
        if self.has_value() || self == Self::Eof {
            self.as_str().to_string()
        } else {
            format!("\"{}\"", self.as_str())
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A token with its kind, span and position.
///
/// `value` holds the name, the raw numeric text, the cooked string value
/// (escapes resolved, block strings dedented), or the comment text.
///
/// Significant tokens form a backward chain: `prev` is the span of the
/// significant token before this one, and `leading_trivia` holds the
/// comments read in between, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// 1-based line of the first character.
    pub line: u32,
    /// 1-based column of the first character.
    pub column: u32,
    pub value: Option<String>,
    pub prev: Option<Span>,
    pub leading_trivia: Vec<Token>,
}

impl Token {
    #[must_use]
    #[inline]
    pub const fn new(kind: TokenKind, span: Span, line: u32, column: u32) -> Self {
        Self {
            kind,
            span,
            line,
            column,
            value: None,
            prev: None,
            leading_trivia: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    #[inline]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// The token's value, or the empty string for punctuation.
    #[must_use]
    pub fn text(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    /// Returns true if this is a name token with the given value.
    #[must_use]
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Name && self.text() == keyword
    }

    /// Describes the token for error messages, e.g. `Name "foo"`.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.value {
            Some(value) if self.kind != TokenKind::Comment => {
                format!("{} \"{}\"", self.kind.as_str(), value)
            }
            _ => self.kind.describe(),
        }
    }
}

/// Directive locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DirectiveLocation {
    // Executable
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,

    // Type system
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

impl DirectiveLocation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "QUERY",
            Self::Mutation => "MUTATION",
            Self::Subscription => "SUBSCRIPTION",
            Self::Field => "FIELD",
            Self::FragmentDefinition => "FRAGMENT_DEFINITION",
            Self::FragmentSpread => "FRAGMENT_SPREAD",
            Self::InlineFragment => "INLINE_FRAGMENT",
            Self::VariableDefinition => "VARIABLE_DEFINITION",
            Self::Schema => "SCHEMA",
            Self::Scalar => "SCALAR",
            Self::Object => "OBJECT",
            Self::FieldDefinition => "FIELD_DEFINITION",
            Self::ArgumentDefinition => "ARGUMENT_DEFINITION",
            Self::Interface => "INTERFACE",
            Self::Union => "UNION",
            Self::Enum => "ENUM",
            Self::EnumValue => "ENUM_VALUE",
            Self::InputObject => "INPUT_OBJECT",
            Self::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
        }
    }

    /// Parses a directive location from its SCREAMING_CASE name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "QUERY" => Some(Self::Query),
            "MUTATION" => Some(Self::Mutation),
            "SUBSCRIPTION" => Some(Self::Subscription),
            "FIELD" => Some(Self::Field),
            "FRAGMENT_DEFINITION" => Some(Self::FragmentDefinition),
            "FRAGMENT_SPREAD" => Some(Self::FragmentSpread),
            "INLINE_FRAGMENT" => Some(Self::InlineFragment),
            "VARIABLE_DEFINITION" => Some(Self::VariableDefinition),
            "SCHEMA" => Some(Self::Schema),
            "SCALAR" => Some(Self::Scalar),
            "OBJECT" => Some(Self::Object),
            "FIELD_DEFINITION" => Some(Self::FieldDefinition),
            "ARGUMENT_DEFINITION" => Some(Self::ArgumentDefinition),
            "INTERFACE" => Some(Self::Interface),
            "UNION" => Some(Self::Union),
            "ENUM" => Some(Self::Enum),
            "ENUM_VALUE" => Some(Self::EnumValue),
            "INPUT_OBJECT" => Some(Self::InputObject),
            "INPUT_FIELD_DEFINITION" => Some(Self::InputFieldDefinition),
            _ => None,
        }
    }
}

impl std::fmt::Display for DirectiveLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
