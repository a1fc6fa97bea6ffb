//! Recursive descent parser for GraphQL documents.

use std::sync::Arc;

use crate::ast::*;
use crate::error::SyntaxError;
use crate::lexer::Lexer;
use crate::token::{DirectiveLocation, Token, TokenKind};
use gqlkit_core::{Source, Span};

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Abort once the document has more than this many tokens.
    pub max_tokens: Option<usize>,
    /// Deepest allowed nesting of selection sets, list and object values,
    /// and list types.
    pub max_depth: usize,
    /// Name reported for the source in diagnostics.
    pub source_name: String,
}

impl ParseOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 128;
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_tokens: None,
            max_depth: ParseOptions::DEFAULT_MAX_DEPTH,
            source_name: Source::DEFAULT_NAME.to_string(),
        }
    }
}

/// Parses a source string into a document.
pub fn parse(source: &str) -> Result<Document, SyntaxError> {
    parse_with_options(source, &ParseOptions::default())
}

/// Parses a source string with explicit options.
pub fn parse_with_options(source: &str, options: &ParseOptions) -> Result<Document, SyntaxError> {
    let source = Arc::new(Source::with_name(source, options.source_name.clone()));
    parse_source(source, options)
}

/// Parses an already constructed [`Source`].
pub fn parse_source(source: Arc<Source>, options: &ParseOptions) -> Result<Document, SyntaxError> {
    let (definitions, span, comments) = {
        let mut parser = Parser::new(&source, options)?;
        let (definitions, span) = parser.parse_document()?;
        (definitions, span, parser.comments)
    };
    Ok(Document {
        definitions,
        span,
        comments,
        source,
    })
}

/// Parses a single input value, e.g. a default value. Variables are allowed.
pub fn parse_value(source: &str) -> Result<Value, SyntaxError> {
    let source = Source::new(source);
    let mut parser = Parser::new(&source, &ParseOptions::default())?;
    let value = parser.parse_value_literal(false)?;
    parser.expect(TokenKind::Eof)?;
    Ok(value)
}

/// Parses a single constant input value. Variables are rejected.
pub fn parse_const_value(source: &str) -> Result<Value, SyntaxError> {
    let source = Source::new(source);
    let mut parser = Parser::new(&source, &ParseOptions::default())?;
    let value = parser.parse_value_literal(true)?;
    parser.expect(TokenKind::Eof)?;
    Ok(value)
}

/// Parses a single type reference such as `[String!]!`.
pub fn parse_type(source: &str) -> Result<Type, SyntaxError> {
    let source = Source::new(source);
    let mut parser = Parser::new(&source, &ParseOptions::default())?;
    let ty = parser.parse_type_reference()?;
    parser.expect(TokenKind::Eof)?;
    Ok(ty)
}

type PResult<T> = Result<T, SyntaxError>;

/// Parser for GraphQL.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    /// End offset of the most recently consumed token.
    prev_end: u32,
    token_count: usize,
    max_tokens: Option<usize>,
    depth: usize,
    max_depth: usize,
    /// Comments passed so far, in source order.
    comments: Vec<Token>,
}

impl<'a> Parser<'a> {
    /// Creates a parser positioned at the first token.
    pub fn new(source: &'a Source, options: &ParseOptions) -> PResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.advance()?;
        let comments = current.leading_trivia.clone();
        let mut parser = Self {
            lexer,
            current,
            prev_end: 0,
            token_count: 0,
            max_tokens: options.max_tokens,
            depth: 0,
            max_depth: options.max_depth,
            comments,
        };
        parser.count_token()?;
        Ok(parser)
    }

    fn count_token(&mut self) -> PResult<()> {
        if self.current.is_eof() {
            return Ok(());
        }
        self.token_count += 1;
        match self.max_tokens {
            Some(max) if self.token_count > max => Err(self.error_at(
                self.current.span,
                format!("Document contains more than {max} tokens. Parsing aborted."),
            )),
            _ => Ok(()),
        }
    }

    /// Runs `parse` one nesting level deeper, failing past `max_depth`
    /// instead of exhausting the stack.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= self.max_depth {
            return Err(self.error_at(
                self.current.span,
                format!(
                    "Document nesting exceeds {} levels. Parsing aborted.",
                    self.max_depth
                ),
            ));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    #[inline]
    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    #[inline]
    fn at_keyword(&self, keyword: &str) -> bool {
        self.current.is_keyword(keyword)
    }

    #[inline]
    fn start(&self) -> u32 {
        self.current.span.start
    }

    /// Span from `start` to the end of the last consumed token.
    #[inline]
    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.prev_end)
    }

    /// Consumes the current token and returns it.
    fn advance(&mut self) -> PResult<Token> {
        let next = self.lexer.advance()?;
        self.comments.extend(next.leading_trivia.iter().cloned());
        let prev = std::mem::replace(&mut self.current, next);
        self.prev_end = prev.span.end;
        self.count_token()?;
        Ok(prev)
    }

    /// Consumes a token of `kind` or fails.
    fn expect(&mut self, kind: TokenKind) -> PResult<Token> {
        if self.at(kind) {
            self.advance()
        } else {
            Err(self.error_at(
                self.current.span,
                format!("Expected {}, found {}.", kind.describe(), self.current.describe()),
            ))
        }
    }

    /// Consumes a token of `kind` if present.
    fn expect_optional(&mut self, kind: TokenKind) -> PResult<bool> {
        if self.at(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> PResult<()> {
        if self.at_keyword(keyword) {
            self.advance()?;
            Ok(())
        } else {
            Err(self.error_at(
                self.current.span,
                format!("Expected \"{keyword}\", found {}.", self.current.describe()),
            ))
        }
    }

    fn expect_optional_keyword(&mut self, keyword: &str) -> PResult<bool> {
        if self.at_keyword(keyword) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn error_at(&self, span: Span, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.lexer.source(), span, message)
    }

    fn unexpected(&self) -> SyntaxError {
        self.error_at(
            self.current.span,
            format!("Unexpected {}.", self.current.describe()),
        )
    }

    /// `open item+ close`
    fn many<T>(
        &mut self,
        open: TokenKind,
        mut item: impl FnMut(&mut Self) -> PResult<T>,
        close: TokenKind,
    ) -> PResult<Vec<T>> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            items.push(item(self)?);
            if self.expect_optional(close)? {
                return Ok(items);
            }
        }
    }

    /// `(open item+ close)?`
    fn optional_many<T>(
        &mut self,
        open: TokenKind,
        item: impl FnMut(&mut Self) -> PResult<T>,
        close: TokenKind,
    ) -> PResult<Vec<T>> {
        if self.at(open) {
            self.many(open, item, close)
        } else {
            Ok(Vec::new())
        }
    }

    /// `open item* close`
    fn any<T>(
        &mut self,
        open: TokenKind,
        mut item: impl FnMut(&mut Self) -> PResult<T>,
        close: TokenKind,
    ) -> PResult<Vec<T>> {
        self.expect(open)?;
        let mut items = Vec::new();
        while !self.expect_optional(close)? {
            items.push(item(self)?);
        }
        Ok(items)
    }

    fn parse_name(&mut self) -> PResult<Name> {
        let token = self.expect(TokenKind::Name)?;
        Ok(Name::new(token.value.unwrap_or_default(), token.span))
    }

    // -----------------------------------------------------------------------
    // Document
    // -----------------------------------------------------------------------

    /// Parses a document: one or more definitions up to EOF.
    pub fn parse_document(&mut self) -> PResult<(Vec<Definition>, Span)> {
        let start = self.start();
        let mut definitions = Vec::new();
        let mut shorthand = None;
        loop {
            if self.at(TokenKind::LBrace) && shorthand.is_none() {
                shorthand = Some(self.current.span);
            }
            definitions.push(self.parse_definition()?);
            if self.at(TokenKind::Eof) {
                break;
            }
        }

        if let Some(span) = shorthand {
            let operations = definitions
                .iter()
                .filter(|def| matches!(def, Definition::Operation(_)))
                .count();
            if operations > 1 {
                return Err(self.error_at(
                    span,
                    "Anonymous shorthand query must be the only operation in the document.",
                ));
            }
        }

        Ok((definitions, Span::new(start, self.current.span.end)))
    }

    fn parse_definition(&mut self) -> PResult<Definition> {
        if self.at(TokenKind::LBrace) {
            return self.parse_operation_definition().map(Definition::Operation);
        }

        let has_description = matches!(self.current.kind, TokenKind::String | TokenKind::BlockString);
        let keyword = if has_description {
            self.lexer.lookahead()?
        } else {
            self.current.clone()
        };

        if keyword.kind == TokenKind::Name {
            match keyword.text() {
                "schema" | "scalar" | "type" | "interface" | "union" | "enum" | "input"
                | "directive" => return self.parse_type_system_definition(),
                "query" | "mutation" | "subscription" if !has_description => {
                    return self.parse_operation_definition().map(Definition::Operation);
                }
                "fragment" if !has_description => {
                    return self.parse_fragment_definition().map(Definition::Fragment);
                }
                _ => {}
            }
        }

        if has_description {
            // A description must precede a type system definition.
            self.advance()?;
        }
        Err(self.unexpected())
    }

    // -----------------------------------------------------------------------
    // Operations and fragments
    // -----------------------------------------------------------------------

    fn parse_operation_definition(&mut self) -> PResult<OperationDefinition> {
        let start = self.start();
        if self.at(TokenKind::LBrace) {
            let selection_set = self.parse_selection_set()?;
            return Ok(OperationDefinition {
                operation: OperationType::Query,
                name: None,
                variable_definitions: Vec::new(),
                directives: Vec::new(),
                selection_set,
                span: self.span_from(start),
            });
        }

        let operation = self.parse_operation_type()?;
        let name = if self.at(TokenKind::Name) {
            Some(self.parse_name()?)
        } else {
            None
        };
        let variable_definitions = self.optional_many(
            TokenKind::LParen,
            Self::parse_variable_definition,
            TokenKind::RParen,
        )?;
        let directives = self.parse_directives(false)?;
        let selection_set = self.parse_selection_set()?;

        Ok(OperationDefinition {
            operation,
            name,
            variable_definitions,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    fn parse_operation_type(&mut self) -> PResult<OperationType> {
        let operation = OperationType::from_keyword(self.current.text())
            .filter(|_| self.at(TokenKind::Name))
            .ok_or_else(|| self.unexpected())?;
        self.advance()?;
        Ok(operation)
    }

    fn parse_variable_definition(&mut self) -> PResult<VariableDefinition> {
        let start = self.start();
        let variable = self.parse_variable()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type_reference()?;
        let default_value = if self.expect_optional(TokenKind::Equals)? {
            Some(self.parse_value_literal(true)?)
        } else {
            None
        };
        let directives = self.parse_directives(true)?;
        Ok(VariableDefinition {
            variable,
            ty,
            default_value,
            directives,
            span: self.span_from(start),
        })
    }

    /// `$name`; the returned name's span includes the `$`.
    fn parse_variable(&mut self) -> PResult<Name> {
        let start = self.start();
        self.expect(TokenKind::Dollar)?;
        let name = self.parse_name()?;
        Ok(Name::new(name.value, self.span_from(start)))
    }

    fn parse_selection_set(&mut self) -> PResult<SelectionSet> {
        let start = self.start();
        let selections =
            self.nested(|p| p.many(TokenKind::LBrace, Self::parse_selection, TokenKind::RBrace))?;
        Ok(SelectionSet {
            selections,
            span: self.span_from(start),
        })
    }

    fn parse_selection(&mut self) -> PResult<Selection> {
        if self.at(TokenKind::Spread) {
            self.parse_fragment()
        } else {
            self.parse_field().map(Selection::Field)
        }
    }

    fn parse_field(&mut self) -> PResult<Field> {
        let start = self.start();
        let first = self.parse_name()?;
        let (alias, name) = if self.expect_optional(TokenKind::Colon)? {
            (Some(first), self.parse_name()?)
        } else {
            (None, first)
        };
        let arguments = self.parse_arguments(false)?;
        let directives = self.parse_directives(false)?;
        let selection_set = if self.at(TokenKind::LBrace) {
            Some(self.parse_selection_set()?)
        } else {
            None
        };

        Ok(Field {
            alias,
            name,
            arguments,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    fn parse_arguments(&mut self, is_const: bool) -> PResult<Vec<Argument>> {
        self.optional_many(
            TokenKind::LParen,
            |p| p.parse_argument(is_const),
            TokenKind::RParen,
        )
    }

    fn parse_argument(&mut self, is_const: bool) -> PResult<Argument> {
        let start = self.start();
        let name = self.parse_name()?;
        self.expect(TokenKind::Colon)?;
        let value = self.parse_value_literal(is_const)?;
        Ok(Argument {
            name,
            value,
            span: self.span_from(start),
        })
    }

    /// Parses `...Name` or `... on Type { }` / `... @dir { }`.
    fn parse_fragment(&mut self) -> PResult<Selection> {
        let start = self.start();
        self.expect(TokenKind::Spread)?;

        let has_type_condition = self.expect_optional_keyword("on")?;
        if !has_type_condition && self.at(TokenKind::Name) {
            let name = self.parse_fragment_name()?;
            let directives = self.parse_directives(false)?;
            return Ok(Selection::FragmentSpread(FragmentSpread {
                name,
                directives,
                span: self.span_from(start),
            }));
        }

        let type_condition = if has_type_condition {
            Some(self.parse_name()?)
        } else {
            None
        };
        let directives = self.parse_directives(false)?;
        let selection_set = self.parse_selection_set()?;
        Ok(Selection::InlineFragment(InlineFragment {
            type_condition,
            directives,
            selection_set,
            span: self.span_from(start),
        }))
    }

    fn parse_fragment_definition(&mut self) -> PResult<FragmentDefinition> {
        let start = self.start();
        self.expect_keyword("fragment")?;
        let name = self.parse_fragment_name()?;
        self.expect_keyword("on")?;
        let type_condition = self.parse_name()?;
        let directives = self.parse_directives(false)?;
        let selection_set = self.parse_selection_set()?;
        Ok(FragmentDefinition {
            name,
            type_condition,
            directives,
            selection_set,
            span: self.span_from(start),
        })
    }

    /// A fragment name is any name except `on`.
    fn parse_fragment_name(&mut self) -> PResult<Name> {
        if self.at_keyword("on") {
            return Err(self.unexpected());
        }
        self.parse_name()
    }

    // -----------------------------------------------------------------------
    // Values and types
    // -----------------------------------------------------------------------

    /// Parses a value literal. In const contexts variables are rejected.
    pub fn parse_value_literal(&mut self, is_const: bool) -> PResult<Value> {
        let start = self.start();
        match self.current.kind {
            TokenKind::LBracket => {
                let values = self.nested(|p| {
                    p.any(
                        TokenKind::LBracket,
                        |p| p.parse_value_literal(is_const),
                        TokenKind::RBracket,
                    )
                })?;
                Ok(Value::List(values, self.span_from(start)))
            }
            TokenKind::LBrace => self.nested(|p| p.parse_object(is_const)),
            TokenKind::Int => {
                let token = self.advance()?;
                Ok(Value::Int(token.value.unwrap_or_default(), token.span))
            }
            TokenKind::Float => {
                let token = self.advance()?;
                Ok(Value::Float(token.value.unwrap_or_default(), token.span))
            }
            TokenKind::String | TokenKind::BlockString => {
                self.parse_string_literal().map(Value::String)
            }
            TokenKind::Name => {
                let token = self.advance()?;
                Ok(match token.text() {
                    "true" => Value::Boolean(true, token.span),
                    "false" => Value::Boolean(false, token.span),
                    "null" => Value::Null(token.span),
                    _ => Value::Enum(Name::new(token.value.unwrap_or_default(), token.span)),
                })
            }
            TokenKind::Dollar if !is_const => self.parse_variable().map(Value::Variable),
            _ => Err(self.unexpected()),
        }
    }

    fn parse_object(&mut self, is_const: bool) -> PResult<Value> {
        let start = self.start();
        let fields = self.any(
            TokenKind::LBrace,
            |p| p.parse_object_field(is_const),
            TokenKind::RBrace,
        )?;

        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|prev| prev.name.value == field.name.value) {
                return Err(self.error_at(
                    field.name.span,
                    format!("There can be only one input field named \"{}\".", field.name),
                ));
            }
        }

        Ok(Value::Object(fields, self.span_from(start)))
    }

    fn parse_object_field(&mut self, is_const: bool) -> PResult<ObjectField> {
        let start = self.start();
        let name = self.parse_name()?;
        self.expect(TokenKind::Colon)?;
        let value = self.parse_value_literal(is_const)?;
        Ok(ObjectField {
            name,
            value,
            span: self.span_from(start),
        })
    }

    fn parse_string_literal(&mut self) -> PResult<StringValue> {
        let block = self.at(TokenKind::BlockString);
        let token = self.advance()?;
        Ok(StringValue {
            value: token.value.unwrap_or_default(),
            block,
            span: token.span,
        })
    }

    /// Parses `Name`, `[Type]` and a trailing `!`.
    pub fn parse_type_reference(&mut self) -> PResult<Type> {
        let start = self.start();
        let ty = if self.expect_optional(TokenKind::LBracket)? {
            let inner = self.nested(Self::parse_type_reference)?;
            self.expect(TokenKind::RBracket)?;
            Type::List(Box::new(inner), self.span_from(start))
        } else {
            Type::Named(self.parse_name()?)
        };

        if self.expect_optional(TokenKind::Bang)? {
            return Ok(Type::NonNull(Box::new(ty), self.span_from(start)));
        }
        Ok(ty)
    }

    fn parse_directives(&mut self, is_const: bool) -> PResult<Vec<Directive>> {
        let mut directives = Vec::new();
        while self.at(TokenKind::At) {
            directives.push(self.parse_directive(is_const)?);
        }
        Ok(directives)
    }

    fn parse_directive(&mut self, is_const: bool) -> PResult<Directive> {
        let start = self.start();
        self.expect(TokenKind::At)?;
        let name = self.parse_name()?;
        let arguments = self.parse_arguments(is_const)?;
        Ok(Directive {
            name,
            arguments,
            span: self.span_from(start),
        })
    }

    // -----------------------------------------------------------------------
    // Type system
    // -----------------------------------------------------------------------

    fn parse_description(&mut self) -> PResult<Option<StringValue>> {
        if matches!(self.current.kind, TokenKind::String | TokenKind::BlockString) {
            self.parse_string_literal().map(Some)
        } else {
            Ok(None)
        }
    }

    fn parse_type_system_definition(&mut self) -> PResult<Definition> {
        let start = self.start();
        let description = self.parse_description()?;
        let keyword = self.current.text().to_string();
        let definition = match keyword.as_str() {
            "schema" => Definition::Schema(self.parse_schema_definition(start, description)?),
            "scalar" => Definition::Type(TypeDefinition::Scalar(
                self.parse_scalar_type(start, description)?,
            )),
            "type" => Definition::Type(TypeDefinition::Object(
                self.parse_object_type(start, description)?,
            )),
            "interface" => Definition::Type(TypeDefinition::Interface(
                self.parse_interface_type(start, description)?,
            )),
            "union" => Definition::Type(TypeDefinition::Union(
                self.parse_union_type(start, description)?,
            )),
            "enum" => Definition::Type(TypeDefinition::Enum(
                self.parse_enum_type(start, description)?,
            )),
            "input" => Definition::Type(TypeDefinition::InputObject(
                self.parse_input_object_type(start, description)?,
            )),
            "directive" => {
                Definition::Directive(self.parse_directive_definition(start, description)?)
            }
            _ => return Err(self.unexpected()),
        };
        Ok(definition)
    }

    fn parse_schema_definition(
        &mut self,
        start: u32,
        description: Option<StringValue>,
    ) -> PResult<SchemaDefinition> {
        self.expect_keyword("schema")?;
        let directives = self.parse_directives(true)?;
        let operation_types = self.many(
            TokenKind::LBrace,
            Self::parse_operation_type_definition,
            TokenKind::RBrace,
        )?;
        Ok(SchemaDefinition {
            description,
            directives,
            operation_types,
            span: self.span_from(start),
        })
    }

    fn parse_operation_type_definition(&mut self) -> PResult<OperationTypeDefinition> {
        let start = self.start();
        let operation = self.parse_operation_type()?;
        self.expect(TokenKind::Colon)?;
        let type_name = self.parse_name()?;
        Ok(OperationTypeDefinition {
            operation,
            type_name,
            span: self.span_from(start),
        })
    }

    fn parse_scalar_type(
        &mut self,
        start: u32,
        description: Option<StringValue>,
    ) -> PResult<ScalarTypeDefinition> {
        self.expect_keyword("scalar")?;
        let name = self.parse_name()?;
        let directives = self.parse_directives(true)?;
        Ok(ScalarTypeDefinition {
            description,
            name,
            directives,
            span: self.span_from(start),
        })
    }

    fn parse_object_type(
        &mut self,
        start: u32,
        description: Option<StringValue>,
    ) -> PResult<ObjectTypeDefinition> {
        self.expect_keyword("type")?;
        let name = self.parse_name()?;
        let interfaces = self.parse_implements()?;
        let directives = self.parse_directives(true)?;
        let fields = self.parse_fields_definition()?;
        Ok(ObjectTypeDefinition {
            description,
            name,
            interfaces,
            directives,
            fields,
            span: self.span_from(start),
        })
    }

    fn parse_interface_type(
        &mut self,
        start: u32,
        description: Option<StringValue>,
    ) -> PResult<InterfaceTypeDefinition> {
        self.expect_keyword("interface")?;
        let name = self.parse_name()?;
        let interfaces = self.parse_implements()?;
        let directives = self.parse_directives(true)?;
        let fields = self.parse_fields_definition()?;
        Ok(InterfaceTypeDefinition {
            description,
            name,
            interfaces,
            directives,
            fields,
            span: self.span_from(start),
        })
    }

    /// `implements &? A (& B)*`
    fn parse_implements(&mut self) -> PResult<Vec<Name>> {
        let mut interfaces = Vec::new();
        if self.expect_optional_keyword("implements")? {
            self.expect_optional(TokenKind::Amp)?;
            loop {
                interfaces.push(self.parse_name()?);
                if !self.expect_optional(TokenKind::Amp)? {
                    break;
                }
            }
        }
        Ok(interfaces)
    }

    fn parse_fields_definition(&mut self) -> PResult<Vec<FieldDefinition>> {
        self.optional_many(
            TokenKind::LBrace,
            Self::parse_field_definition,
            TokenKind::RBrace,
        )
    }

    fn parse_field_definition(&mut self) -> PResult<FieldDefinition> {
        let start = self.start();
        let description = self.parse_description()?;
        let name = self.parse_name()?;
        let arguments = self.parse_argument_definitions()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type_reference()?;
        let directives = self.parse_directives(true)?;
        Ok(FieldDefinition {
            description,
            name,
            arguments,
            ty,
            directives,
            span: self.span_from(start),
        })
    }

    fn parse_argument_definitions(&mut self) -> PResult<Vec<InputValueDefinition>> {
        self.optional_many(
            TokenKind::LParen,
            Self::parse_input_value_definition,
            TokenKind::RParen,
        )
    }

    fn parse_input_value_definition(&mut self) -> PResult<InputValueDefinition> {
        let start = self.start();
        let description = self.parse_description()?;
        let name = self.parse_name()?;
        self.expect(TokenKind::Colon)?;
        let ty = self.parse_type_reference()?;
        let default_value = if self.expect_optional(TokenKind::Equals)? {
            Some(self.parse_value_literal(true)?)
        } else {
            None
        };
        let directives = self.parse_directives(true)?;
        Ok(InputValueDefinition {
            description,
            name,
            ty,
            default_value,
            directives,
            span: self.span_from(start),
        })
    }

    fn parse_union_type(
        &mut self,
        start: u32,
        description: Option<StringValue>,
    ) -> PResult<UnionTypeDefinition> {
        self.expect_keyword("union")?;
        let name = self.parse_name()?;
        let directives = self.parse_directives(true)?;
        let mut members = Vec::new();
        if self.expect_optional(TokenKind::Equals)? {
            self.expect_optional(TokenKind::Pipe)?;
            loop {
                members.push(self.parse_name()?);
                if !self.expect_optional(TokenKind::Pipe)? {
                    break;
                }
            }
        }
        Ok(UnionTypeDefinition {
            description,
            name,
            directives,
            members,
            span: self.span_from(start),
        })
    }

    fn parse_enum_type(
        &mut self,
        start: u32,
        description: Option<StringValue>,
    ) -> PResult<EnumTypeDefinition> {
        self.expect_keyword("enum")?;
        let name = self.parse_name()?;
        let directives = self.parse_directives(true)?;
        let values = self.optional_many(
            TokenKind::LBrace,
            Self::parse_enum_value_definition,
            TokenKind::RBrace,
        )?;
        Ok(EnumTypeDefinition {
            description,
            name,
            directives,
            values,
            span: self.span_from(start),
        })
    }

    fn parse_enum_value_definition(&mut self) -> PResult<EnumValueDefinition> {
        let start = self.start();
        let description = self.parse_description()?;
        if matches!(self.current.text(), "true" | "false" | "null") && self.at(TokenKind::Name) {
            return Err(self.error_at(
                self.current.span,
                format!(
                    "{} is reserved and cannot be used for an enum value.",
                    self.current.describe()
                ),
            ));
        }
        let name = self.parse_name()?;
        let directives = self.parse_directives(true)?;
        Ok(EnumValueDefinition {
            description,
            name,
            directives,
            span: self.span_from(start),
        })
    }

    fn parse_input_object_type(
        &mut self,
        start: u32,
        description: Option<StringValue>,
    ) -> PResult<InputObjectTypeDefinition> {
        self.expect_keyword("input")?;
        let name = self.parse_name()?;
        let directives = self.parse_directives(true)?;
        let fields = self.optional_many(
            TokenKind::LBrace,
            Self::parse_input_value_definition,
            TokenKind::RBrace,
        )?;
        Ok(InputObjectTypeDefinition {
            description,
            name,
            directives,
            fields,
            span: self.span_from(start),
        })
    }

    fn parse_directive_definition(
        &mut self,
        start: u32,
        description: Option<StringValue>,
    ) -> PResult<DirectiveDefinition> {
        self.expect_keyword("directive")?;
        self.expect(TokenKind::At)?;
        let name = self.parse_name()?;
        let arguments = self.parse_argument_definitions()?;
        let repeatable = self.expect_optional_keyword("repeatable")?;
        self.expect_keyword("on")?;
        self.expect_optional(TokenKind::Pipe)?;
        let mut locations = Vec::new();
        loop {
            locations.push(self.parse_directive_location()?);
            if !self.expect_optional(TokenKind::Pipe)? {
                break;
            }
        }
        Ok(DirectiveDefinition {
            description,
            name,
            arguments,
            repeatable,
            locations,
            span: self.span_from(start),
        })
    }

    fn parse_directive_location(&mut self) -> PResult<DirectiveLocation> {
        let location = DirectiveLocation::parse(self.current.text())
            .filter(|_| self.at(TokenKind::Name))
            .ok_or_else(|| self.unexpected())?;
        self.advance()?;
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Document {
        match parse(source) {
            Ok(doc) => doc,
            Err(err) => panic!("unexpected syntax error: {err}"),
        }
    }

    fn parse_err(source: &str) -> SyntaxError {
        match parse(source) {
            Ok(_) => panic!("expected a syntax error for {source:?}"),
            Err(err) => err,
        }
    }

    fn only_operation(doc: &Document) -> &OperationDefinition {
        doc.operations().next().expect("expected an operation")
    }

    #[test]
    fn test_parse_shorthand_query() {
        let doc = parse_ok("{ hello }");
        let op = only_operation(&doc);
        assert_eq!(op.operation, OperationType::Query);
        assert!(op.name.is_none());
        assert_eq!(op.selection_set.selections.len(), 1);
        assert_eq!(op.span, Span::new(0, 9));
    }

    #[test]
    fn test_parse_named_operation_with_variables() {
        let doc = parse_ok(
            "query Hero($episode: Episode = JEDI, $withFriends: Boolean!) @live {\n  hero(episode: $episode) { name }\n}",
        );
        let op = only_operation(&doc);
        assert_eq!(op.name.as_ref().map(Name::as_str), Some("Hero"));
        assert_eq!(op.variable_definitions.len(), 2);
        assert_eq!(op.variable_definitions[1].ty.to_string(), "Boolean!");
        assert!(matches!(
            op.variable_definitions[0].default_value,
            Some(Value::Enum(ref name)) if name.as_str() == "JEDI"
        ));
        assert_eq!(op.directives[0].name.as_str(), "live");

        let Selection::Field(hero) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        assert!(matches!(&hero.arguments[0].value, Value::Variable(v) if v.as_str() == "episode"));
    }

    #[test]
    fn test_parse_alias_and_keywords_as_names() {
        let doc = parse_ok("{ query: type(on: null) fragment }");
        let op = only_operation(&doc);
        let Selection::Field(field) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        assert_eq!(field.response_key(), "query");
        assert_eq!(field.name.as_str(), "type");
        assert!(field.arguments[0].value.is_null());
    }

    #[test]
    fn test_parse_fragments() {
        let doc = parse_ok(
            "query { ...UserFields ... on User { id } ... @include(if: true) { name } }\nfragment UserFields on User { id }",
        );
        let op = only_operation(&doc);
        let selections = &op.selection_set.selections;
        assert!(matches!(&selections[0], Selection::FragmentSpread(s) if s.name.as_str() == "UserFields"));
        assert!(matches!(
            &selections[1],
            Selection::InlineFragment(f) if f.type_condition.as_ref().map(Name::as_str) == Some("User")
        ));
        assert!(matches!(
            &selections[2],
            Selection::InlineFragment(f) if f.type_condition.is_none() && f.directives.len() == 1
        ));
        let fragment = doc.fragment("UserFields").unwrap();
        assert_eq!(fragment.type_condition.as_str(), "User");
    }

    #[test]
    fn test_fragment_named_on_is_rejected() {
        assert_eq!(
            parse_err("fragment on on User { id }").message,
            "Unexpected Name \"on\"."
        );
    }

    #[test]
    fn test_type_condition_requires_on() {
        assert_eq!(
            parse_err("fragment Foo User { id }").message,
            "Expected \"on\", found Name \"User\"."
        );
    }

    #[test]
    fn test_shorthand_must_be_only_operation() {
        let err = parse_err("{ a } query B { b }");
        assert!(err.message.starts_with("Anonymous shorthand query"));
        assert_eq!(err.span.start, 0);

        parse_ok("{ ...F } fragment F on Query { a }");
    }

    #[test]
    fn test_parse_values() {
        let value = parse_value(
            r#"{ int: -12, float: 1.5e3, str: "s", block: """b""", bool: false, nil: null, enum: RED, list: [1, [2]], var: $v }"#,
        )
        .unwrap();
        let Value::Object(fields, _) = value else {
            panic!("expected object");
        };
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["int", "float", "str", "block", "bool", "nil", "enum", "list", "var"]
        );
        assert!(matches!(&fields[0].value, Value::Int(raw, _) if raw == "-12"));
        assert!(matches!(&fields[1].value, Value::Float(raw, _) if raw == "1.5e3"));
        assert!(matches!(&fields[3].value, Value::String(s) if s.block && s.value == "b"));
        assert!(matches!(&fields[7].value, Value::List(items, _) if items.len() == 2));
    }

    #[test]
    fn test_const_value_rejects_variables() {
        assert_eq!(
            parse_const_value("[$v]").unwrap_err().message,
            "Unexpected \"$\"."
        );
        assert!(parse("query ($a: Int = $b) { f }").is_err());
    }

    #[test]
    fn test_duplicate_input_field_names() {
        let err = parse_value("{ a: 1, b: 2, a: 3 }").unwrap_err();
        assert_eq!(err.message, "There can be only one input field named \"a\".");
        assert_eq!(err.span.start, 14);
    }

    #[test]
    fn test_parse_type_nesting() {
        let ty = parse_type("[[String!]]!").unwrap();
        assert_eq!(ty.to_string(), "[[String!]]!");
        assert_eq!(ty.name().as_str(), "String");
        let Type::NonNull(inner, _) = ty else {
            panic!("expected non-null");
        };
        assert!(matches!(*inner, Type::List(..)));
        assert!(parse_type("String!!").is_err());
        assert!(parse_type("[String").is_err());
    }

    #[test]
    fn test_parse_type_system() {
        let doc = parse_ok(
            r#"
            schema { query: Root mutation: Mut }

            """
            The root.
            """
            type Root implements & Node & Entity @key(fields: "id") {
              "the id"
              id: ID!
              search(term: String = "x", first: Int): [Result]
            }

            interface Node { id: ID! }
            union Result = | Root | Other
            enum Color { RED GREEN @deprecated(reason: "no") }
            input Filter { name: String = "a", tags: [String!] }
            scalar Date @specifiedBy(url: "https://example.com")
            directive @key(fields: String!) repeatable on OBJECT | INTERFACE
            "#,
        );
        assert_eq!(doc.definitions.len(), 8);

        let Definition::Schema(schema) = &doc.definitions[0] else {
            panic!("expected schema definition");
        };
        assert_eq!(schema.operation_types[1].operation, OperationType::Mutation);

        let Definition::Type(TypeDefinition::Object(root)) = &doc.definitions[1] else {
            panic!("expected object type");
        };
        assert_eq!(root.description.as_ref().unwrap().value, "The root.");
        assert_eq!(root.interfaces.len(), 2);
        assert_eq!(root.fields[0].description.as_ref().unwrap().value, "the id");
        assert_eq!(root.fields[1].arguments.len(), 2);

        let Definition::Type(TypeDefinition::Union(union)) = &doc.definitions[3] else {
            panic!("expected union");
        };
        assert_eq!(union.members.len(), 2);

        let Definition::Directive(directive) = &doc.definitions[7] else {
            panic!("expected directive definition");
        };
        assert!(directive.repeatable);
        assert_eq!(
            directive.locations,
            vec![DirectiveLocation::Object, DirectiveLocation::Interface]
        );
    }

    #[test]
    fn test_reserved_enum_values() {
        assert_eq!(
            parse_err("enum Bool { true }").message,
            "Name \"true\" is reserved and cannot be used for an enum value."
        );
    }

    #[test]
    fn test_unknown_directive_location() {
        assert_eq!(
            parse_err("directive @a on FIELD | NOWHERE").message,
            "Unexpected Name \"NOWHERE\"."
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(parse_err("").message, "Unexpected <EOF>.");
        assert_eq!(parse_err("{").message, "Expected Name, found <EOF>.");
        assert_eq!(parse_err("{ }").message, "Expected Name, found \"}\".");
        assert_eq!(parse_err("notanoperation { a }").message, "Unexpected Name \"notanoperation\".");
        assert_eq!(parse_err("\"desc\" query { a }").message, "Unexpected Name \"query\".");
    }

    #[test]
    fn test_error_location() {
        let err = parse_err("{\n  a(b: )\n}");
        assert_eq!(err.message, "Unexpected \")\".");
        assert_eq!((err.location.line, err.location.column), (2, 8));
    }

    #[test]
    fn test_max_tokens() {
        let options = ParseOptions {
            max_tokens: Some(3),
            ..ParseOptions::default()
        };
        assert!(parse_with_options("{ a }", &options).is_ok());
        let err = parse_with_options("{ a b }", &options).unwrap_err();
        assert_eq!(err.message, "Document contains more than 3 tokens. Parsing aborted.");
    }

    #[test]
    fn test_max_depth() {
        let options = ParseOptions {
            max_depth: 4,
            ..ParseOptions::default()
        };
        assert!(parse_with_options("{ a { b { c(x: [1]) } } }", &options).is_ok());

        let err = parse_with_options("{ a { b { c(x: [[1]]) } } }", &options).unwrap_err();
        assert_eq!(err.message, "Document nesting exceeds 4 levels. Parsing aborted.");
        assert_eq!(err.location.column, 17);

        let err = parse_with_options("{ a { b { c { d { e } } } } }", &options).unwrap_err();
        assert_eq!(err.location.column, 17);

        let err = parse_with_options("query ($v: [[[[[Int]]]]]) { a }", &options).unwrap_err();
        assert!(err.message.starts_with("Document nesting exceeds 4 levels"));
    }

    #[test]
    fn test_deep_nesting_is_an_error_not_a_crash() {
        let depth = 100_000;
        let source = format!("{{ a(x: {}1{}) }}", "[".repeat(depth), "]".repeat(depth));
        let err = parse(&source).unwrap_err();
        assert_eq!(
            err.message,
            format!(
                "Document nesting exceeds {} levels. Parsing aborted.",
                ParseOptions::DEFAULT_MAX_DEPTH
            )
        );

        let source = format!("{}{{ a }}{}", "{ a ".repeat(depth), " }".repeat(depth));
        assert!(parse(&source).is_err());
    }

    #[test]
    fn test_comments_above_a_definition() {
        let doc = parse(
            "# unrelated\n\ntype A { a: Int }\n\n# The user.\n# Second line.\ntype User {\n  # not a doc\n  id: ID\n}",
        )
        .unwrap();
        assert_eq!(doc.comments.len(), 4);

        let user = &doc.definitions[1];
        let lines: Vec<_> = doc
            .leading_comments(user.span())
            .iter()
            .map(Token::text)
            .collect();
        assert_eq!(lines, [" The user.", " Second line."]);

        // A blank line is whitespace, so the first comment still attaches.
        let first: Vec<_> = doc
            .leading_comments(doc.definitions[0].span())
            .iter()
            .map(Token::text)
            .collect();
        assert_eq!(first, [" unrelated"]);
    }

    #[test]
    fn test_comments_separated_by_code_do_not_attach() {
        let doc = parse("# on a\nquery { a } # trailing\nquery B { b }").unwrap();
        let b = doc.definitions[1].span();
        let comments: Vec<_> = doc.leading_comments(b).iter().map(Token::text).collect();
        assert_eq!(comments, [" trailing"]);
        assert!(doc.leading_comments(Span::new(0, 0)).is_empty());
    }

    #[test]
    fn test_spans_end_at_last_token() {
        let doc = parse_ok("query Q { a(x: 1) }   ");
        let op = only_operation(&doc);
        assert_eq!(op.span, Span::new(0, 19));
        let Selection::Field(field) = &op.selection_set.selections[0] else {
            panic!("expected field");
        };
        assert_eq!(field.span, Span::new(10, 17));
    }
}
