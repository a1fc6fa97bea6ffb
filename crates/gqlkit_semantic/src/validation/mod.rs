//! Document validation.
//!
//! Each rule is a [`Visitor`] built from the shared [`ValidationContext`].
//! All rules run side by side in a single walk of the document, wrapped in
//! a [`TypeInfoVisitor`] so every rule sees the same type context. Rules
//! report into the context and never stop each other.

mod context;
pub mod rules;

use std::cell::RefCell;

use gqlkit_core::Diagnostic;
use gqlkit_syntax::{walk, Document, ParallelVisitor, Visitor};
use tracing::debug;

use crate::schema::Schema;
use crate::schema_validation::{assert_valid, SchemaValidationError};
use crate::type_info::{TypeInfo, TypeInfoVisitor};

pub use context::{ValidationContext, VariableUsage};

/// Builds one rule's visitor for a validation run.
pub type RuleFactory = for<'a> fn(&'a ValidationContext<'a>) -> Box<dyn Visitor<'a> + 'a>;

const SPECIFIED_RULES: &[RuleFactory] = {
    use rules::*;
    &[
        executable_definitions,
        unique_operation_names,
        lone_anonymous_operation,
        known_type_names,
        fragments_on_composite_types,
        variables_are_input_types,
        scalar_leafs,
        fields_on_correct_type,
        unique_fragment_names,
        known_fragment_names,
        no_unused_fragments,
        possible_fragment_spreads,
        no_fragment_cycles,
        unique_variable_names,
        no_undefined_variables,
        no_unused_variables,
        known_directives,
        unique_directives_per_location,
        known_argument_names,
        unique_argument_names,
        values_of_correct_type,
        provided_required_arguments,
        variables_in_allowed_position,
    ]
};

/// The standard rule set, in reporting order.
pub fn specified_rules() -> &'static [RuleFactory] {
    SPECIFIED_RULES
}

/// Validates `document` against `schema` with the standard rules.
///
/// Fails without visiting the document if the schema itself is invalid.
/// An empty list means the document is valid.
pub fn validate(schema: &Schema, document: &Document) -> Result<Vec<Diagnostic>, SchemaValidationError> {
    validate_with_rules(schema, document, specified_rules())
}

/// Validates `document` with a custom rule set.
pub fn validate_with_rules(
    schema: &Schema,
    document: &Document,
    rules: &[RuleFactory],
) -> Result<Vec<Diagnostic>, SchemaValidationError> {
    assert_valid(schema)?;

    let type_info = RefCell::new(TypeInfo::new());
    let context = ValidationContext::new(schema, document, &type_info);
    {
        let visitors = rules.iter().map(|rule| rule(&context)).collect();
        let mut visitor = TypeInfoVisitor::new(schema, &type_info, ParallelVisitor::new(visitors));
        walk(&mut visitor, document);
    }
    let errors = context.take_errors();
    debug!(rules = rules.len(), errors = errors.len(), "validated document");
    Ok(errors)
}
