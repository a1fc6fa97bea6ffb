//! Execution results as sent back to clients.

use std::fmt;

use gqlkit_core::{SourceLocation, Span};
use gqlkit_syntax::Document;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step of a response path: an object key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Renders a path as `a.0.b`.
pub fn display_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

/// An error record in a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphQLError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<SourceLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

impl GraphQLError {
    /// Creates an error with no location or path.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Points the error at `spans` within `document`.
    pub fn at(mut self, document: &Document, spans: impl IntoIterator<Item = Span>) -> Self {
        self.locations = spans.into_iter().map(|span| document.location(span)).collect();
        self
    }

    /// Adds the response path.
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }
}

impl fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if !self.path.is_empty() {
            write!(f, " at {}", display_path(&self.path))?;
        }
        Ok(())
    }
}

/// The result of executing an operation.
///
/// `data` is `None` when a non-null failure reached the root selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,
}

impl ExecutionResult {
    /// A result with data and no errors.
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: Vec::new(),
        }
    }

    /// A result with errors and no data.
    pub fn errors(errors: Vec<GraphQLError>) -> Self {
        Self { data: None, errors }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_serialization_omits_empty_fields() {
        let error = GraphQLError::new("Something went wrong");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"message": "Something went wrong"})
        );

        let error = GraphQLError {
            message: "boom".to_string(),
            locations: vec![SourceLocation { line: 2, column: 3 }],
            path: vec![
                PathSegment::Field("users".to_string()),
                PathSegment::Index(1),
                PathSegment::Field("name".to_string()),
            ],
        };
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({
                "message": "boom",
                "locations": [{"line": 2, "column": 3}],
                "path": ["users", 1, "name"],
            })
        );
        assert_eq!(error.to_string(), "boom at users.1.name");
    }

    #[test]
    fn test_result_serialization() {
        let result = ExecutionResult::data(json!({"hello": "world"}));
        assert!(result.has_data());
        assert!(!result.has_errors());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"data": {"hello": "world"}})
        );

        let result = ExecutionResult::errors(vec![GraphQLError::new("Error")]);
        assert!(!result.has_data());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"data": null, "errors": [{"message": "Error"}]})
        );
    }

    #[test]
    fn test_partial_result_snapshot() {
        let result = ExecutionResult {
            data: Some(json!({"hero": {"name": "R2-D2", "friends": []}})),
            errors: vec![GraphQLError {
                message: "Name for character with ID 1002 could not be fetched.".to_string(),
                locations: vec![SourceLocation { line: 6, column: 7 }],
                path: vec![
                    PathSegment::Field("hero".to_string()),
                    PathSegment::Field("heroFriends".to_string()),
                    PathSegment::Index(1),
                    PathSegment::Field("name".to_string()),
                ],
            }],
        };
        insta::assert_yaml_snapshot!(result, @r###"
        data:
          hero:
            name: R2-D2
            friends: []
        errors:
          - message: Name for character with ID 1002 could not be fetched.
            locations:
              - line: 6
                column: 7
            path:
              - hero
              - heroFriends
              - 1
              - name
        "###);
    }

    #[test]
    fn test_path_segments_deserialize_untagged() {
        let path: Vec<PathSegment> = serde_json::from_value(json!(["a", 0])).unwrap();
        assert_eq!(
            path,
            [PathSegment::Field("a".to_string()), PathSegment::Index(0)]
        );
    }
}
