//! The standard validation rules.
//!
//! Every rule is exposed as a [`RuleFactory`](super::RuleFactory)-compatible
//! function returning a boxed visitor.

mod arguments;
mod directives;
mod fields;
mod fragments;
mod operations;
mod types;
mod values;
mod variables;

pub use arguments::{known_argument_names, provided_required_arguments, unique_argument_names};
pub use directives::{known_directives, unique_directives_per_location};
pub use fields::{fields_on_correct_type, scalar_leafs};
pub use fragments::{
    known_fragment_names, no_fragment_cycles, no_unused_fragments, possible_fragment_spreads,
    unique_fragment_names,
};
pub use operations::{executable_definitions, lone_anonymous_operation, unique_operation_names};
pub use types::{fragments_on_composite_types, known_type_names, variables_are_input_types};
pub use values::values_of_correct_type;
pub use variables::{
    no_undefined_variables, no_unused_variables, unique_variable_names,
    variables_in_allowed_position,
};
