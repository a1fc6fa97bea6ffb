//! Syntax errors raised by the lexer and parser.

use gqlkit_core::{Source, SourceLocation, Span};
use miette::{NamedSource, SourceSpan};
use thiserror::Error;

/// A lexing or parsing failure. Fatal to the `parse` call that raised it.
#[derive(Debug, Error, miette::Diagnostic)]
#[error("Syntax Error: {message}")]
#[diagnostic(code(gqlkit::syntax))]
pub struct SyntaxError {
    /// Message without the `Syntax Error:` prefix.
    pub message: String,
    /// Offending byte range.
    pub span: Span,
    pub location: SourceLocation,
    #[source_code]
    source_code: NamedSource<String>,
    #[label("{message}")]
    label: SourceSpan,
}

impl SyntaxError {
    /// Creates an error located at `span` in `source`.
    pub fn new(source: &Source, span: Span, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span,
            location: source.location(span.start),
            source_code: NamedSource::new(source.name(), source.body().to_string()),
            label: span.into(),
        }
    }

    /// Byte offset where the error starts.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.span.start
    }
}
