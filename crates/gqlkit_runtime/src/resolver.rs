//! Resolver system.
//!
//! A [`Resolver`] produces the raw value of one field. Resolvers are
//! registered per `Type.field` in a [`ResolverMap`]; fields without one fall
//! back to the [`DefaultResolver`], which reads the property of the same
//! name from the parent object. Abstract types are resolved to an object
//! type with a registered [`TypeResolver`], or from a `__typename` key.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use gqlkit_semantic::{Schema, TypeRef, Variables};
use gqlkit_syntax::{Document, FragmentDefinition, OperationDefinition};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ResolverError;
use crate::response::PathSegment;

/// Request-scoped data shared by every resolver of one execution.
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`. Values that fail to serialize are dropped.
    pub fn set<T: Serialize>(&mut self, key: impl Into<String>, value: T) {
        if let Ok(v) = serde_json::to_value(value) {
            self.data.insert(key.into(), v);
        }
    }

    /// Deserializes the entry under `key`.
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Gets the raw JSON value stored under `key`.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

/// Coerced arguments passed to a resolver.
#[derive(Debug, Clone, Default)]
pub struct ResolverArgs {
    args: Variables,
}

impl ResolverArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps already coerced argument values.
    pub fn from_map(args: Variables) -> Self {
        Self { args }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Deserializes argument `name`, or `None` if absent or mistyped.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.args
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Like [`get_as`](Self::get_as), but absence and type mismatches are
    /// resolver errors.
    pub fn require<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T, ResolverError> {
        let value = self
            .args
            .get(name)
            .ok_or_else(|| ResolverError::MissingArgument(name.to_string()))?;
        serde_json::from_value(value.clone()).map_err(|e| ResolverError::InvalidArgument {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn all(&self) -> &Variables {
        &self.args
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Sets an argument.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.args.insert(name.into(), value);
    }
}

/// Everything a resolver may want to know about the field being resolved.
#[derive(Clone)]
pub struct ResolverInfo {
    /// Name of the field in the schema (not its alias).
    pub field_name: String,
    /// Declared type of the field.
    pub return_type: TypeRef,
    /// The object type the field belongs to.
    pub parent_type: String,
    /// Response path to this field.
    pub path: Vec<PathSegment>,
    pub schema: Arc<Schema>,
    pub document: Arc<Document>,
    /// Coerced variables of the request.
    pub variables: Arc<Variables>,
    operation_index: usize,
}

impl ResolverInfo {
    pub(crate) fn new(
        field_name: impl Into<String>,
        parent_type: impl Into<String>,
        return_type: TypeRef,
        path: Vec<PathSegment>,
        request: &RequestParts,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            return_type,
            parent_type: parent_type.into(),
            path,
            schema: Arc::clone(&request.schema),
            document: Arc::clone(&request.document),
            variables: Arc::clone(&request.variables),
            operation_index: request.operation_index,
        }
    }

    /// The operation being executed.
    pub fn operation(&self) -> Option<&OperationDefinition> {
        self.document.operations().nth(self.operation_index)
    }

    /// Looks up a fragment of the executed document.
    pub fn fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        self.document.fragment(name)
    }

    /// All fragments of the executed document.
    pub fn fragments(&self) -> impl Iterator<Item = &FragmentDefinition> {
        self.document.fragments()
    }
}

impl Debug for ResolverInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverInfo")
            .field("field_name", &self.field_name)
            .field("return_type", &self.return_type)
            .field("parent_type", &self.parent_type)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// The shared, per-request parts every [`ResolverInfo`] points at.
#[derive(Clone)]
pub(crate) struct RequestParts {
    pub schema: Arc<Schema>,
    pub document: Arc<Document>,
    pub variables: Arc<Variables>,
    pub operation_index: usize,
}

pub type ResolverResult = Result<Value, ResolverError>;

/// What every [`Resolver`] returns.
pub type ResolverFuture<'a> = Pin<Box<dyn Future<Output = ResolverResult> + Send + 'a>>;

/// Produces the raw value of a field before it is completed against the
/// field's type.
pub trait Resolver: Send + Sync {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a>;
}

/// A boxed resolver.
pub type BoxedResolver = Box<dyn Resolver>;

pub type SyncResolverFn =
    Arc<dyn Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult + Send + Sync>;

/// Adapts a plain closure into a [`Resolver`].
pub struct FnResolver {
    func: SyncResolverFn,
}

impl FnResolver {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        Self { func: Arc::new(f) }
    }
}

impl Resolver for FnResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        let result = (self.func)(parent, args, ctx, info);
        Box::pin(async move { result })
    }
}

pub type AsyncResolverFn = Arc<
    dyn Fn(Value, ResolverArgs, Context, ResolverInfo) -> ResolverFuture<'static> + Send + Sync,
>;

/// Adapts an async closure into a [`Resolver`]. The closure receives owned
/// copies of its inputs so the future it returns can be `'static`.
pub struct AsyncFnResolver {
    func: AsyncResolverFn,
}

impl AsyncFnResolver {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        Self {
            func: Arc::new(move |parent, args, ctx, info| Box::pin(f(parent, args, ctx, info))),
        }
    }
}

impl Resolver for AsyncFnResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        (self.func)(parent.clone(), args.clone(), ctx.clone(), info.clone())
    }
}

/// Reads the property named like the field from the parent object.
/// Anything that is not an object resolves every field to null.
pub struct DefaultResolver;

impl Resolver for DefaultResolver {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        _args: &'a ResolverArgs,
        _ctx: &'a Context,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        let value = match parent {
            Value::Object(map) => map.get(&info.field_name).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        };
        Box::pin(async move { Ok(value) })
    }
}

/// Picks the object type name for a value of an abstract type.
pub type TypeResolver = Box<dyn Fn(&Value, &Context, &ResolverInfo) -> Option<String> + Send + Sync>;

/// Resolvers keyed by object type name, then field name.
pub struct ResolverMap {
    resolvers: FxHashMap<String, FxHashMap<String, BoxedResolver>>,
    type_resolvers: FxHashMap<String, TypeResolver>,
    /// Used for fields without a registered resolver.
    default_resolver: BoxedResolver,
}

impl Default for ResolverMap {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverMap {
    pub fn new() -> Self {
        Self {
            resolvers: FxHashMap::default(),
            type_resolvers: FxHashMap::default(),
            default_resolver: Box::new(DefaultResolver),
        }
    }

    /// Installs `resolver` for `type_name.field_name`, replacing any previous one.
    pub fn register<R: Resolver + 'static>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        resolver: R,
    ) {
        self.resolvers
            .entry(type_name.into())
            .or_default()
            .insert(field_name.into(), Box::new(resolver));
    }

    pub fn register_fn<F>(&mut self, type_name: impl Into<String>, field_name: impl Into<String>, f: F)
    where
        F: Fn(&Value, &ResolverArgs, &Context, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        self.register(type_name, field_name, FnResolver::new(f));
    }

    pub fn register_async<F, Fut>(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        f: F,
    ) where
        F: Fn(Value, ResolverArgs, Context, ResolverInfo) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ResolverResult> + Send + 'static,
    {
        self.register(type_name, field_name, AsyncFnResolver::new(f));
    }

    /// Registers how values of the interface or union `type_name` find
    /// their object type.
    pub fn register_type_resolver<F>(&mut self, type_name: impl Into<String>, f: F)
    where
        F: Fn(&Value, &Context, &ResolverInfo) -> Option<String> + Send + Sync + 'static,
    {
        self.type_resolvers.insert(type_name.into(), Box::new(f));
    }

    /// Gets the resolver for a type and field, or the default resolver.
    pub fn get(&self, type_name: &str, field_name: &str) -> &dyn Resolver {
        let resolver = self
            .resolvers
            .get(type_name)
            .and_then(|fields| fields.get(field_name))
            .unwrap_or(&self.default_resolver);
        &**resolver
    }

    /// Names the object type of `value`, a value of the abstract type
    /// `type_name`. Falls back to a string `__typename` key in the value.
    pub fn resolve_type(
        &self,
        type_name: &str,
        value: &Value,
        ctx: &Context,
        info: &ResolverInfo,
    ) -> Option<String> {
        match self.type_resolvers.get(type_name) {
            Some(resolve) => resolve(value, ctx, info),
            None => value
                .get("__typename")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// Replaces the resolver used for unregistered fields.
    pub fn set_default<R: Resolver + 'static>(&mut self, resolver: R) {
        self.default_resolver = Box::new(resolver);
    }
}

impl Debug for ResolverMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverMap")
            .field(
                "resolver_count",
                &self.resolvers.values().map(FxHashMap::len).sum::<usize>(),
            )
            .field("type_resolver_count", &self.type_resolvers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqlkit_syntax::parse;
    use serde_json::json;

    fn info(field_name: &str, parent_type: &str) -> ResolverInfo {
        let request = RequestParts {
            schema: Arc::new(Schema::new()),
            document: Arc::new(parse("query Q { a } fragment F on Q { a }").unwrap()),
            variables: Arc::new(Variables::new()),
            operation_index: 0,
        };
        ResolverInfo::new(field_name, parent_type, TypeRef::named("String"), Vec::new(), &request)
    }

    #[test]
    fn test_resolver_args() {
        let mut args = ResolverArgs::new();
        args.set("first", json!(10));
        args.set("after", json!("cursor:3"));

        assert_eq!(args.get_as::<u32>("first"), Some(10));
        assert_eq!(args.get_as::<String>("after"), Some("cursor:3".to_string()));
        assert_eq!(args.get_as::<i64>("missing"), None);
        assert_eq!(
            args.require::<i64>("missing"),
            Err(ResolverError::MissingArgument("missing".to_string()))
        );
        assert!(matches!(
            args.require::<i64>("after"),
            Err(ResolverError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_context() {
        let mut ctx = Context::new();
        ctx.set("viewer", json!({"id": 7, "admin": true}));
        ctx.set("locale", "en");

        assert_eq!(ctx.get::<String>("locale"), Some("en".to_string()));
        assert_eq!(ctx.get::<i64>("locale"), None);
        assert_eq!(ctx.get::<String>("absent"), None);
        assert_eq!(ctx.value("viewer").and_then(|v| v.get("id")), Some(&json!(7)));
    }

    #[test]
    fn test_info_exposes_document() {
        let info = info("a", "Query");
        assert_eq!(info.operation().and_then(|op| op.name.as_ref()).map(|n| n.as_str()), Some("Q"));
        assert!(info.fragment("F").is_some());
        assert_eq!(info.fragments().count(), 1);
    }

    #[tokio::test]
    async fn test_default_resolver_reads_parent_property() {
        let parent = json!({"name": "Alice", "age": 30});
        let args = ResolverArgs::new();
        let ctx = Context::new();

        let result = DefaultResolver.resolve(&parent, &args, &ctx, &info("name", "User")).await;
        assert_eq!(result.unwrap(), json!("Alice"));

        let result = DefaultResolver.resolve(&parent, &args, &ctx, &info("email", "User")).await;
        assert_eq!(result.unwrap(), Value::Null);

        let result = DefaultResolver
            .resolve(&json!("scalar"), &args, &ctx, &info("name", "User"))
            .await;
        assert_eq!(result.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_closure_resolver() {
        let resolver = FnResolver::new(|parent, args, _ctx, _info| {
            let times: usize = args.require("times")?;
            let word = parent["word"].as_str().unwrap_or_default();
            Ok(json!(word.repeat(times)))
        });

        let mut args = ResolverArgs::new();
        args.set("times", json!(3));
        let result = resolver
            .resolve(&json!({"word": "ab"}), &args, &Context::new(), &info("echo", "Query"))
            .await;
        assert_eq!(result.unwrap(), json!("ababab"));

        let result = resolver
            .resolve(&json!({}), &ResolverArgs::new(), &Context::new(), &info("echo", "Query"))
            .await;
        assert_eq!(result.unwrap_err().to_string(), "Missing required argument: times");
    }

    #[tokio::test]
    async fn test_async_fn_resolver() {
        let resolver = AsyncFnResolver::new(|parent, _args, _ctx, info| async move {
            tokio::task::yield_now().await;
            Ok(json!(format!("{}.{} of {}", info.parent_type, info.field_name, parent)))
        });

        let result = resolver
            .resolve(&json!(1), &ResolverArgs::new(), &Context::new(), &info("a", "Query"))
            .await;
        assert_eq!(result.unwrap(), json!("Query.a of 1"));
    }

    #[tokio::test]
    async fn test_resolver_map_falls_back_to_default() {
        let mut map = ResolverMap::new();
        map.register_fn("Query", "greeting", |_parent, _args, ctx, _info| {
            Ok(json!(format!("hi {}", ctx.get::<String>("name").unwrap_or_default())))
        });

        let args = ResolverArgs::new();
        let mut ctx = Context::new();
        ctx.set("name", "Ada");
        let result = map
            .get("Query", "greeting")
            .resolve(&json!({}), &args, &ctx, &info("greeting", "Query"))
            .await;
        assert_eq!(result.unwrap(), json!("hi Ada"));

        // Unregistered fields use the default resolver.
        let result = map
            .get("User", "name")
            .resolve(&json!({"name": "Bob"}), &args, &ctx, &info("name", "User"))
            .await;
        assert_eq!(result.unwrap(), json!("Bob"));
    }

    #[test]
    fn test_resolve_type() {
        let mut map = ResolverMap::new();
        map.register_type_resolver("Pet", |value, _ctx, _info| {
            Some(if value.get("meows").is_some() { "Cat" } else { "Dog" }.to_string())
        });
        let ctx = Context::new();
        let info = info("pet", "Query");

        assert_eq!(
            map.resolve_type("Pet", &json!({"meows": true}), &ctx, &info),
            Some("Cat".to_string())
        );
        assert_eq!(
            map.resolve_type("Named", &json!({"__typename": "Dog"}), &ctx, &info),
            Some("Dog".to_string())
        );
        assert_eq!(map.resolve_type("Named", &json!({}), &ctx, &info), None);
    }
}
