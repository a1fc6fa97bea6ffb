//! Built-in directives.
//!
//! `@skip`, `@include` and `@deprecated` are constructed once per process
//! and copied into every schema that does not define its own.

use std::sync::OnceLock;

use gqlkit_core::Span;
use gqlkit_syntax::{ast, DirectiveLocation};
use indexmap::IndexMap;

use crate::schema::{DirectiveDef, InputValueDef, TypeRef};

/// Reason used by `@deprecated` when none is given.
pub const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

/// The directives every schema includes.
pub fn specified_directives() -> &'static [DirectiveDef] {
    static DIRECTIVES: OnceLock<Vec<DirectiveDef>> = OnceLock::new();
    DIRECTIVES.get_or_init(|| vec![skip(), include(), deprecated()])
}

/// Returns true if `name` is one of the built-in directives.
pub fn is_specified_directive(name: &str) -> bool {
    matches!(name, "skip" | "include" | "deprecated")
}

fn executable_condition(name: &str, description: &str) -> DirectiveDef {
    let condition = InputValueDef {
        description: Some(format!("{description} when true.")),
        ..InputValueDef::new("if", TypeRef::non_null(TypeRef::named("Boolean")))
    };
    DirectiveDef {
        name: name.to_string(),
        description: Some(format!(
            "Directs the executor to {} this field or fragment only when the `if` argument is true.",
            name
        )),
        arguments: IndexMap::from([("if".to_string(), condition)]),
        locations: vec![
            DirectiveLocation::Field,
            DirectiveLocation::FragmentSpread,
            DirectiveLocation::InlineFragment,
        ],
        repeatable: false,
        span: None,
    }
}

fn skip() -> DirectiveDef {
    executable_condition("skip", "Skipped")
}

fn include() -> DirectiveDef {
    executable_condition("include", "Included")
}

fn deprecated() -> DirectiveDef {
    let reason = InputValueDef::new("reason", TypeRef::named("String")).default_value(
        ast::Value::String(ast::StringValue {
            value: DEFAULT_DEPRECATION_REASON.to_string(),
            block: false,
            span: Span::default(),
        }),
    );
    DirectiveDef {
        name: "deprecated".to_string(),
        description: Some("Marks an element of a GraphQL schema as no longer supported.".into()),
        arguments: IndexMap::from([("reason".to_string(), reason)]),
        locations: vec![DirectiveLocation::FieldDefinition, DirectiveLocation::EnumValue],
        repeatable: false,
        span: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specified_directives() {
        let names: Vec<_> = specified_directives().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["skip", "include", "deprecated"]);
        assert!(std::ptr::eq(specified_directives(), specified_directives()));
    }

    #[test]
    fn test_skip_signature() {
        let skip = &specified_directives()[0];
        assert_eq!(skip.arguments["if"].ty.to_string(), "Boolean!");
        assert!(skip.locations.contains(&DirectiveLocation::InlineFragment));
        assert!(!skip.locations.contains(&DirectiveLocation::Query));
    }

    #[test]
    fn test_deprecated_reason_defaults_to_constant() {
        let deprecated = &specified_directives()[2];
        let reason = &deprecated.arguments["reason"];
        assert_eq!(reason.ty.to_string(), "String");
        let Some(ast::Value::String(default)) = &reason.default_value else {
            panic!("expected a string default");
        };
        assert_eq!(default.value, DEFAULT_DEPRECATION_REASON);
        assert!(!default.block);
        assert_eq!(default.span, Span::default());
    }
}
