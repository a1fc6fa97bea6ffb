//! Runtime for gqlkit.
//!
//! This crate provides the GraphQL execution runtime:
//! - `resolver`: Resolver trait, resolver registry and request context
//! - `executor`: Operation execution
//! - `response`: Execution results and error records
//! - `error`: Request-level and resolver errors

pub mod error;
pub mod executor;
pub mod resolver;
pub mod response;

pub use error::{ExecutionError, ResolverError};
pub use executor::{Executor, ExecutorConfig, Request};
pub use resolver::{
    AsyncFnResolver, Context, DefaultResolver, FnResolver, Resolver, ResolverArgs, ResolverFuture,
    ResolverInfo, ResolverMap, ResolverResult, TypeResolver,
};
pub use response::{ExecutionResult, GraphQLError, PathSegment};
