//! Semantic layer for gqlkit.
//!
//! This crate provides:
//! - `schema`: Schema model and programmatic builder
//! - `builder`: Schema construction from type-system definitions
//! - `scalars` / `directives`: Built-in scalars and directives
//! - `schema_validation`: Structural schema checks (`assert_valid`)
//! - `relations`: Possible types, subtyping and overlap
//! - `type_info`: Type context tracking during a walk
//! - `validation`: Document validation rules
//! - `values`: Argument and variable coercion

pub mod builder;
pub mod directives;
pub mod relations;
pub mod scalars;
pub mod schema;
pub mod schema_validation;
pub mod type_info;
pub mod validation;
pub mod values;

pub use builder::{build_schema, BuildSchemaOptions, SchemaError};
pub use directives::{is_specified_directive, specified_directives};
pub use schema::{
    typename_field, DirectiveDef, EnumDef, EnumValueDef, FieldDef, InputObjectDef, InputValueDef,
    InterfaceDef, ObjectDef, ScalarDef, Schema, SchemaBuilder, SchemaOrigin, TypeDef, TypeKind,
    TypeRef, UnionDef,
};
pub use schema_validation::{assert_valid, validate_schema, SchemaValidationError};
pub use type_info::{TypeInfo, TypeInfoVisitor};
pub use validation::{specified_rules, validate, validate_with_rules, RuleFactory, ValidationContext};
pub use values::{
    coerce_argument_values, coerce_directive_values, coerce_value, coerce_variable_values,
    value_from_ast, value_from_ast_untyped, CoercionError, Variables,
};
