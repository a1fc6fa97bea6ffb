//! Request-level and resolver errors.

use gqlkit_semantic::{CoercionError, SchemaValidationError};
use gqlkit_syntax::Document;
use thiserror::Error;

use crate::response::GraphQLError;

/// A failure that stops a request before any field runs.
#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error(transparent)]
    InvalidSchema(#[from] SchemaValidationError),

    #[error("Must provide an operation.")]
    NoOperation,

    #[error("Unknown operation named \"{0}\".")]
    UnknownOperation(String),

    #[error("Must provide operation name if query contains multiple operations.")]
    AmbiguousOperation,

    #[error("Schema is not configured for {}s.", .0.as_str())]
    MissingRootType(gqlkit_syntax::OperationType),

    #[error("{}", join_messages(.0))]
    VariableCoercion(Vec<CoercionError>),
}

fn join_messages(errors: &[CoercionError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

impl ExecutionError {
    /// Converts the failure into response error records. Variable errors
    /// point at their definitions in `document`.
    pub fn to_graphql_errors(&self, document: &Document) -> Vec<GraphQLError> {
        match self {
            Self::InvalidSchema(err) => err
                .errors
                .iter()
                .map(|d| GraphQLError::new(d.message.clone()))
                .collect(),
            Self::VariableCoercion(errors) => errors
                .iter()
                .map(|e| GraphQLError::new(e.message.clone()).at(document, e.spans.iter().copied()))
                .collect(),
            other => vec![GraphQLError::new(other.to_string())],
        }
    }
}

/// A field-level failure returned by a resolver.
///
/// The `Display` output becomes the error record's message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("Failed to parse argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("{0}")]
    Custom(String),
}

impl ResolverError {
    /// A failure with a custom message.
    pub fn new(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

impl From<String> for ResolverError {
    fn from(message: String) -> Self {
        Self::Custom(message)
    }
}

impl From<&str> for ResolverError {
    fn from(message: &str) -> Self {
        Self::Custom(message.to_string())
    }
}
