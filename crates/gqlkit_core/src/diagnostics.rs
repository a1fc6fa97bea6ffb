//! Diagnostic reporting for schema and document validation.

use thiserror::Error;

use crate::source::{Source, SourceLocation};
use crate::span::Span;

/// A label attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// The span this label points to.
    pub span: Span,
    /// The label message.
    pub message: String,
}

impl Label {
    /// Creates a new label.
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// A single validation error.
///
/// `message` is the user-visible text. Labels point at every AST node the
/// error concerns, in the order they should be reported as `locations`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Diagnostic {
    /// Stable error code, see [`codes`].
    pub code: &'static str,
    pub message: String,
    /// Labels pointing to source locations.
    pub labels: Vec<Label>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            labels: Vec::new(),
        }
    }

    /// Adds a label to the diagnostic.
    #[must_use]
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Adds an unlabelled location.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.labels.push(Label::new(span, ""));
        self
    }

    /// Adds several unlabelled locations.
    #[must_use]
    pub fn with_spans(mut self, spans: impl IntoIterator<Item = Span>) -> Self {
        self.labels
            .extend(spans.into_iter().map(|span| Label::new(span, "")));
        self
    }

    /// Returns the primary span, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels.first().map(|l| l.span)
    }

    /// Resolves every label against `source`.
    pub fn locations(&self, source: &Source) -> Vec<SourceLocation> {
        self.labels
            .iter()
            .map(|label| source.location(label.span.start))
            .collect()
    }
}

/// An ordered collection of diagnostics.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Adds an error located at a single span.
    pub fn error(&mut self, code: &'static str, message: impl Into<String>, span: Span) {
        self.add(Diagnostic::error(code, message).with_span(span));
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Returns an iterator over all diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

impl IntoIterator for DiagnosticBag {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

/// Diagnostic codes, one per schema or document rule.
pub mod codes {
    // Schema rules.
    pub const ROOT_TYPES: &str = "S0001";
    pub const DIRECTIVE_DEFINITION: &str = "S0002";
    pub const TYPE_FIELDS: &str = "S0003";
    pub const OUTPUT_TYPE: &str = "S0004";
    pub const INPUT_TYPE: &str = "S0005";
    pub const UNION_MEMBER: &str = "S0006";
    pub const INTERFACE_IMPLEMENTATION: &str = "S0007";
    pub const ENUM_VALUES: &str = "S0008";
    pub const RESERVED_NAME: &str = "S0009";

    // Document rules.
    pub const EXECUTABLE_DEFINITIONS: &str = "V0001";
    pub const UNIQUE_OPERATION_NAMES: &str = "V0002";
    pub const LONE_ANONYMOUS_OPERATION: &str = "V0003";
    pub const KNOWN_TYPE_NAMES: &str = "V0004";
    pub const FRAGMENTS_ON_COMPOSITE_TYPES: &str = "V0005";
    pub const VARIABLES_ARE_INPUT_TYPES: &str = "V0006";
    pub const SCALAR_LEAFS: &str = "V0007";
    pub const FIELDS_ON_CORRECT_TYPE: &str = "V0008";
    pub const UNIQUE_FRAGMENT_NAMES: &str = "V0009";
    pub const KNOWN_FRAGMENT_NAMES: &str = "V0010";
    pub const NO_UNUSED_FRAGMENTS: &str = "V0011";
    pub const POSSIBLE_FRAGMENT_SPREADS: &str = "V0012";
    pub const NO_FRAGMENT_CYCLES: &str = "V0013";
    pub const UNIQUE_VARIABLE_NAMES: &str = "V0014";
    pub const NO_UNDEFINED_VARIABLES: &str = "V0015";
    pub const NO_UNUSED_VARIABLES: &str = "V0016";
    pub const KNOWN_DIRECTIVES: &str = "V0017";
    pub const UNIQUE_DIRECTIVES_PER_LOCATION: &str = "V0018";
    pub const KNOWN_ARGUMENT_NAMES: &str = "V0019";
    pub const UNIQUE_ARGUMENT_NAMES: &str = "V0020";
    pub const VALUES_OF_CORRECT_TYPE: &str = "V0021";
    pub const PROVIDED_REQUIRED_ARGUMENTS: &str = "V0022";
    pub const VARIABLES_IN_ALLOWED_POSITION: &str = "V0023";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_bag() {
        let mut bag = DiagnosticBag::new();
        assert!(!bag.has_errors());
        bag.error(codes::KNOWN_TYPE_NAMES, "Unknown type \"Foo\".", Span::new(0, 3));

        assert!(bag.has_errors());
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.into_vec()[0].to_string(), "Unknown type \"Foo\".");
    }

    #[test]
    fn test_diagnostic_locations() {
        let source = Source::new("query {\n  a\n  a\n}");
        let diag = Diagnostic::error(codes::FIELDS_ON_CORRECT_TYPE, "bad")
            .with_spans([Span::new(10, 11), Span::new(14, 15)]);

        assert_eq!(diag.primary_span(), Some(Span::new(10, 11)));
        assert_eq!(
            diag.locations(&source),
            vec![
                SourceLocation { line: 2, column: 3 },
                SourceLocation { line: 3, column: 3 },
            ]
        );
    }
}
