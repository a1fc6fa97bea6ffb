//! Query execution.
//!
//! Execution walks the selected operation top down. Each selection set is
//! flattened into an ordered map of response keys to field nodes, every
//! field is resolved and its value completed against the field's declared
//! type. Sibling fields of a query are resolved concurrently on the current
//! task; the top-level fields of a mutation are resolved one at a time.
//!
//! A failing field becomes `null` plus an error record. When the field is
//! non-null the `null` moves up to the nearest nullable ancestor instead.
//! Errors are gathered per selection set in response-key order, so their
//! final order does not depend on which resolver finishes first.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{join_all, FutureExt, LocalBoxFuture};
use gqlkit_semantic::{
    assert_valid, coerce_argument_values, coerce_directive_values, coerce_variable_values,
    scalars, validate, ObjectDef, Schema, TypeDef, TypeRef, Variables,
};
use gqlkit_syntax::{
    parse, Directive, Document, Field, FragmentDefinition, OperationDefinition, OperationType,
    Selection, SelectionSet,
};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};
use tracing::{debug, debug_span, trace, warn, Instrument};

use crate::error::ExecutionError;
use crate::resolver::{Context, RequestParts, ResolverArgs, ResolverInfo, ResolverMap};
use crate::response::{display_path, ExecutionResult, GraphQLError, PathSegment};

/// Executor configuration.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Emit a trace event for every resolved field.
    pub tracing: bool,
    /// Resolve sibling fields and list items concurrently. Mutation root
    /// fields are always resolved in order.
    pub concurrent: bool,
    /// Check the schema with `assert_valid` before executing.
    pub validate_schema: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            tracing: false,
            concurrent: true,
            validate_schema: true,
        }
    }
}

/// One operation to execute, with its inputs.
#[derive(Debug, Clone)]
pub struct Request {
    pub document: Arc<Document>,
    /// Source value of the root fields.
    pub root_value: Value,
    pub context: Context,
    /// Raw variable values, coerced before execution starts.
    pub variables: Variables,
    /// Required when the document holds more than one operation.
    pub operation_name: Option<String>,
}

impl Request {
    pub fn new(document: impl Into<Arc<Document>>) -> Self {
        Self {
            document: document.into(),
            root_value: Value::Null,
            context: Context::default(),
            variables: Variables::new(),
            operation_name: None,
        }
    }

    pub fn root_value(mut self, root_value: Value) -> Self {
        self.root_value = root_value;
        self
    }

    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }
}

/// The query executor.
pub struct Executor {
    schema: Arc<Schema>,
    resolvers: Arc<ResolverMap>,
    config: ExecutorConfig,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .field("resolvers", &self.resolvers)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Creates an executor that resolves every field with the default
    /// resolver.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            resolvers: Arc::new(ResolverMap::new()),
            config: ExecutorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_resolvers(mut self, resolvers: ResolverMap) -> Self {
        self.resolvers = Arc::new(resolvers);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn resolvers(&self) -> &ResolverMap {
        &self.resolvers
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Executes one operation of `request.document`.
    ///
    /// Field failures end up in the result. Problems with the request as a
    /// whole (invalid schema, operation selection, variables) are returned
    /// as an [`ExecutionError`] before any resolver runs.
    pub async fn execute(&self, request: Request) -> Result<ExecutionResult, ExecutionError> {
        if self.config.validate_schema {
            assert_valid(&self.schema)?;
        }

        let Request {
            document,
            root_value,
            context,
            variables,
            operation_name,
        } = request;

        let (operation_index, operation) = select_operation(&document, operation_name.as_deref())?;
        let Some(TypeDef::Object(root_type)) = self.schema.root_type(operation.operation) else {
            return Err(ExecutionError::MissingRootType(operation.operation));
        };
        let variables = coerce_variable_values(&self.schema, &operation.variable_definitions, &variables)
            .map_err(ExecutionError::VariableCoercion)?;

        debug!(
            operation = operation.name.as_ref().map(|n| n.as_str()),
            kind = %operation.operation,
            "executing operation"
        );

        let mut fragments = FxHashMap::default();
        for fragment in document.fragments() {
            fragments.entry(fragment.name.as_str()).or_insert(fragment);
        }
        let exec = ExecutionContext {
            executor: self,
            request: RequestParts {
                schema: Arc::clone(&self.schema),
                document: Arc::clone(&document),
                variables: Arc::new(variables),
                operation_index,
            },
            context: &context,
            fragments,
        };

        let mut fields = FieldMap::default();
        exec.collect_fields(&root_type.name, &operation.selection_set, &mut fields, &mut FxHashSet::default());

        let mut errors = Vec::new();
        let serial = operation.operation == OperationType::Mutation;
        let data = exec
            .execute_fields(root_type, &root_value, &fields, &[], serial, &mut errors)
            .await;

        debug!(errors = errors.len(), "executed operation");
        Ok(ExecutionResult {
            data: data.ok().map(Value::Object),
            errors,
        })
    }

    /// Parses, validates and executes `source` in one go.
    ///
    /// Every failure is reported inside the returned result: syntax and
    /// validation errors come back without data.
    pub async fn execute_query(&self, source: &str, root_value: Value, variables: Variables) -> ExecutionResult {
        let document = match parse(source) {
            Ok(document) => document,
            Err(err) => {
                return ExecutionResult::errors(vec![GraphQLError {
                    message: err.to_string(),
                    locations: vec![err.location],
                    path: Vec::new(),
                }]);
            }
        };
        match validate(&self.schema, &document) {
            Ok(diagnostics) if diagnostics.is_empty() => {}
            Ok(diagnostics) => {
                return ExecutionResult::errors(
                    diagnostics
                        .into_iter()
                        .map(|d| GraphQLError {
                            locations: d.locations(&document.source),
                            message: d.message,
                            path: Vec::new(),
                        })
                        .collect(),
                );
            }
            Err(err) => return ExecutionResult::errors(ExecutionError::from(err).to_graphql_errors(&document)),
        }

        let document = Arc::new(document);
        let request = Request::new(Arc::clone(&document))
            .root_value(root_value)
            .variables(variables);
        match self.execute(request).await {
            Ok(result) => result,
            Err(err) => ExecutionResult::errors(err.to_graphql_errors(&document)),
        }
    }
}

/// Picks the operation named `name`, or the only operation when no name is
/// given.
fn select_operation<'d>(
    document: &'d Document,
    name: Option<&str>,
) -> Result<(usize, &'d OperationDefinition), ExecutionError> {
    let mut operations = document.operations().enumerate();
    match name {
        Some(name) => operations
            .find(|(_, op)| op.name.as_ref().is_some_and(|n| n.as_str() == name))
            .ok_or_else(|| ExecutionError::UnknownOperation(name.to_string())),
        None => {
            let first = operations.next().ok_or(ExecutionError::NoOperation)?;
            if operations.next().is_some() {
                return Err(ExecutionError::AmbiguousOperation);
            }
            Ok(first)
        }
    }
}

/// Field nodes grouped by response key, in the order keys first appear.
type FieldMap<'d> = IndexMap<&'d str, Vec<&'d Field>>;

/// Why completing a value did not produce one.
enum Failure {
    /// A new error, not yet recorded.
    Error(GraphQLError),
    /// Already recorded. A null is moving up to the nearest nullable
    /// position.
    Propagated,
}

type Completion = Result<Value, Failure>;

struct ExecutionContext<'e> {
    executor: &'e Executor,
    request: RequestParts,
    context: &'e Context,
    fragments: FxHashMap<&'e str, &'e FragmentDefinition>,
}

impl<'e> ExecutionContext<'e> {
    fn schema(&self) -> &Schema {
        &self.request.schema
    }

    fn error(&self, message: impl Into<String>, nodes: &[&Field], path: &[PathSegment]) -> Failure {
        Failure::Error(
            GraphQLError::new(message)
                .at(&self.request.document, nodes.iter().map(|node| node.span))
                .with_path(path.to_vec()),
        )
    }

    /// Awaits `futures` together, or one after another when concurrency is
    /// off or `serial` is set. Outputs keep the input order.
    async fn run_all<F: Future>(&self, futures: impl IntoIterator<Item = F>, serial: bool) -> Vec<F::Output> {
        if self.executor.config.concurrent && !serial {
            return join_all(futures).await;
        }
        let mut outputs = Vec::new();
        for future in futures {
            outputs.push(future.await);
        }
        outputs
    }

    fn collect_fields(
        &self,
        object_type: &str,
        selection_set: &'e SelectionSet,
        fields: &mut FieldMap<'e>,
        visited_fragments: &mut FxHashSet<&'e str>,
    ) {
        for selection in &selection_set.selections {
            if !self.should_include(selection.directives()) {
                continue;
            }
            match selection {
                Selection::Field(field) => fields.entry(field.response_key()).or_default().push(field),
                Selection::InlineFragment(fragment) => {
                    let applies = fragment
                        .type_condition
                        .as_ref()
                        .map_or(true, |condition| self.condition_matches(condition.as_str(), object_type));
                    if applies {
                        self.collect_fields(object_type, &fragment.selection_set, fields, visited_fragments);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.name.as_str();
                    if !visited_fragments.insert(name) {
                        continue;
                    }
                    let Some(&fragment) = self.fragments.get(name) else {
                        continue;
                    };
                    if self.condition_matches(fragment.type_condition.as_str(), object_type) {
                        self.collect_fields(object_type, &fragment.selection_set, fields, visited_fragments);
                    }
                }
            }
        }
    }

    /// Evaluates `@skip` and `@include`.
    fn should_include(&self, directives: &[Directive]) -> bool {
        let schema = self.schema();
        let condition = |name: &str| {
            let def = schema.directive(name)?;
            let args = coerce_directive_values(schema, def, directives, &self.request.variables).ok()??;
            args.get("if").and_then(Value::as_bool)
        };
        condition("skip") != Some(true) && condition("include") != Some(false)
    }

    fn condition_matches(&self, condition: &str, object_type: &str) -> bool {
        condition == object_type || self.schema().is_sub_type(condition, object_type)
    }

    /// Executes every field of `fields` against `source`.
    ///
    /// Fails only when a non-null field failed, in which case the whole
    /// object is replaced by null one level up.
    async fn execute_fields(
        &self,
        parent_type: &ObjectDef,
        source: &Value,
        fields: &FieldMap<'e>,
        path: &[PathSegment],
        serial: bool,
        errors: &mut Vec<GraphQLError>,
    ) -> Result<Map<String, Value>, Failure> {
        let futures = fields.iter().map(|(&key, nodes)| async move {
            let mut field_errors = Vec::new();
            let value = self
                .execute_field(parent_type, source, key, nodes, path, &mut field_errors)
                .await;
            (key, value, field_errors)
        });
        let results = self.run_all(futures, serial).await;

        let mut data = Map::new();
        let mut propagated = false;
        for (key, value, field_errors) in results {
            errors.extend(field_errors);
            match value {
                Some(Ok(value)) => {
                    data.insert(key.to_string(), value);
                }
                Some(Err(_)) => propagated = true,
                None => {}
            }
        }
        if propagated {
            Err(Failure::Propagated)
        } else {
            Ok(data)
        }
    }

    /// Resolves and completes one response key. Returns `None` for fields
    /// the parent type does not define.
    async fn execute_field(
        &self,
        parent_type: &ObjectDef,
        source: &Value,
        key: &str,
        nodes: &[&'e Field],
        path: &[PathSegment],
        errors: &mut Vec<GraphQLError>,
    ) -> Option<Completion> {
        let node = nodes.first()?;
        let field_name = node.name.as_str();
        if field_name == "__typename" {
            return Some(Ok(Value::String(parent_type.name.clone())));
        }
        let field_def = parent_type.fields.get(field_name)?;

        let mut path = path.to_vec();
        path.push(PathSegment::Field(key.to_string()));

        let args = coerce_argument_values(
            self.schema(),
            field_def,
            &node.arguments,
            node.span,
            &self.request.variables,
        );
        let completed = match args {
            Err(err) => Err(self.error(err.message, nodes, &path)),
            Ok(args) => {
                let args = ResolverArgs::from_map(args);
                let info = ResolverInfo::new(
                    field_name,
                    &parent_type.name,
                    field_def.ty.clone(),
                    path.clone(),
                    &self.request,
                );
                let resolver = self.executor.resolvers.get(&parent_type.name, field_name);
                let resolving = resolver.resolve(source, &args, self.context, &info);
                let resolved = if self.executor.config.tracing {
                    let span = debug_span!("field", path = %display_path(&path));
                    async {
                        let resolved = resolving.await;
                        trace!(ok = resolved.is_ok(), "resolved field");
                        resolved
                    }
                    .instrument(span)
                    .await
                } else {
                    resolving.await
                };
                match resolved {
                    Ok(value) => {
                        self.complete_value(&field_def.ty, nodes, &info, &path, value, errors)
                            .await
                    }
                    Err(err) => Err(self.error(err.to_string(), nodes, &path)),
                }
            }
        };
        Some(handle_failure(completed, &field_def.ty, errors))
    }

    /// Shapes a resolved value according to `ty`.
    fn complete_value<'f>(
        &'f self,
        ty: &'f TypeRef,
        nodes: &'f [&'e Field],
        info: &'f ResolverInfo,
        path: &'f [PathSegment],
        value: Value,
        errors: &'f mut Vec<GraphQLError>,
    ) -> LocalBoxFuture<'f, Completion> {
        async move {
            match ty {
                TypeRef::NonNull(inner) => {
                    let completed = self.complete_value(inner, nodes, info, path, value, errors).await?;
                    if completed.is_null() {
                        return Err(self.error(
                            format!(
                                "Cannot return null for non-nullable field {}.{}.",
                                info.parent_type, info.field_name
                            ),
                            nodes,
                            path,
                        ));
                    }
                    Ok(completed)
                }
                _ if value.is_null() => Ok(Value::Null),
                TypeRef::List(item_type) => {
                    self.complete_list(item_type, nodes, info, path, value, errors)
                        .await
                }
                TypeRef::Named(name) => {
                    self.complete_named(name, nodes, info, path, value, errors)
                        .await
                }
            }
        }
        .boxed_local()
    }

    /// Completes every item on its own, so one failing item leaves its
    /// siblings intact.
    async fn complete_list(
        &self,
        item_type: &TypeRef,
        nodes: &[&'e Field],
        info: &ResolverInfo,
        path: &[PathSegment],
        value: Value,
        errors: &mut Vec<GraphQLError>,
    ) -> Completion {
        let Value::Array(items) = value else {
            return Err(self.error(
                format!(
                    "Expected Iterable, but did not find one for field \"{}.{}\".",
                    info.parent_type, info.field_name
                ),
                nodes,
                path,
            ));
        };

        let futures = items.into_iter().enumerate().map(|(index, item)| {
            let mut item_path = path.to_vec();
            item_path.push(PathSegment::Index(index));
            async move {
                let mut item_errors = Vec::new();
                let completed = self
                    .complete_value(item_type, nodes, info, &item_path, item, &mut item_errors)
                    .await;
                (handle_failure(completed, item_type, &mut item_errors), item_errors)
            }
        });
        let results = self.run_all(futures, false).await;

        let mut completed = Vec::with_capacity(results.len());
        let mut propagated = false;
        for (item, item_errors) in results {
            errors.extend(item_errors);
            match item {
                Ok(value) => completed.push(value),
                Err(_) => propagated = true,
            }
        }
        if propagated {
            Err(Failure::Propagated)
        } else {
            Ok(Value::Array(completed))
        }
    }

    async fn complete_named(
        &self,
        name: &str,
        nodes: &[&'e Field],
        info: &ResolverInfo,
        path: &[PathSegment],
        value: Value,
        errors: &mut Vec<GraphQLError>,
    ) -> Completion {
        match self.schema().get_type(name) {
            Some(TypeDef::Scalar(scalar)) => {
                scalars::serialize(&scalar.name, &value).map_err(|err| self.error(err.0, nodes, path))
            }
            Some(TypeDef::Enum(def)) => match &value {
                Value::String(s) if def.value(s).is_some() => Ok(value),
                _ => Err(self.error(
                    format!("Enum \"{}\" cannot represent value: {value}", def.name),
                    nodes,
                    path,
                )),
            },
            Some(TypeDef::Object(object)) => self.complete_object(object, nodes, path, &value, errors).await,
            Some(TypeDef::Interface(_) | TypeDef::Union(_)) => {
                let object = self.resolve_abstract(name, nodes, info, path, &value)?;
                self.complete_object(object, nodes, path, &value, errors).await
            }
            _ => Err(self.error(
                format!("Cannot complete value of unexpected output type: \"{name}\"."),
                nodes,
                path,
            )),
        }
    }

    /// Finds the object type a value of an interface or union belongs to.
    fn resolve_abstract(
        &self,
        abstract_type: &str,
        nodes: &[&Field],
        info: &ResolverInfo,
        path: &[PathSegment],
        value: &Value,
    ) -> Result<&ObjectDef, Failure> {
        let schema = self.schema();
        let Some(runtime_type) = self
            .executor
            .resolvers
            .resolve_type(abstract_type, value, self.context, info)
        else {
            return Err(self.error(
                format!(
                    "Abstract type \"{abstract_type}\" must resolve to an Object type at runtime for field \"{}.{}\". Either register a type resolver for \"{abstract_type}\" or return a \"__typename\" with the value.",
                    info.parent_type, info.field_name
                ),
                nodes,
                path,
            ));
        };
        match schema.get_type(&runtime_type) {
            None => Err(self.error(
                format!(
                    "Abstract type \"{abstract_type}\" was resolved to a type \"{runtime_type}\" that does not exist inside the schema."
                ),
                nodes,
                path,
            )),
            Some(TypeDef::Object(object)) if schema.is_sub_type(abstract_type, &object.name) => Ok(object),
            Some(TypeDef::Object(object)) => Err(self.error(
                format!(
                    "Runtime Object type \"{}\" is not a possible type for \"{abstract_type}\".",
                    object.name
                ),
                nodes,
                path,
            )),
            Some(_) => Err(self.error(
                format!("Abstract type \"{abstract_type}\" was resolved to a non-object type \"{runtime_type}\"."),
                nodes,
                path,
            )),
        }
    }

    /// Executes the merged sub-selections of `nodes` on `object`.
    async fn complete_object(
        &self,
        object: &ObjectDef,
        nodes: &[&'e Field],
        path: &[PathSegment],
        value: &Value,
        errors: &mut Vec<GraphQLError>,
    ) -> Completion {
        let mut fields = FieldMap::default();
        let mut visited_fragments = FxHashSet::default();
        for node in nodes {
            if let Some(selection_set) = &node.selection_set {
                self.collect_fields(&object.name, selection_set, &mut fields, &mut visited_fragments);
            }
        }
        self.execute_fields(object, value, &fields, path, false, errors)
            .await
            .map(Value::Object)
    }
}

/// Records a new error and turns the failure into a null, or keeps it
/// travelling up when `ty` is non-null.
fn handle_failure(completed: Completion, ty: &TypeRef, errors: &mut Vec<GraphQLError>) -> Completion {
    match completed {
        Ok(value) => Ok(value),
        Err(failure) => {
            if let Failure::Error(error) = failure {
                warn!(path = %display_path(&error.path), message = %error.message, "field error");
                errors.push(error);
            }
            if ty.is_non_null() {
                Err(Failure::Propagated)
            } else {
                Ok(Value::Null)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gqlkit_semantic::{build_schema, BuildSchemaOptions};
    use serde_json::json;

    fn executor(sdl: &str) -> Executor {
        Executor::new(build_schema(&parse(sdl).unwrap(), BuildSchemaOptions::default()).unwrap())
    }

    async fn run(executor: &Executor, query: &str, root: Value) -> ExecutionResult {
        let request = Request::new(parse(query).unwrap()).root_value(root);
        executor.execute(request).await.unwrap()
    }

    #[test]
    fn test_select_operation() {
        let document = parse("query A { a } query B { a }").unwrap();
        assert_eq!(select_operation(&document, Some("B")).unwrap().0, 1);
        assert!(matches!(
            select_operation(&document, None),
            Err(ExecutionError::AmbiguousOperation)
        ));
        assert!(matches!(
            select_operation(&document, Some("C")),
            Err(ExecutionError::UnknownOperation(name)) if name == "C"
        ));

        let document = parse("fragment F on Query { a }").unwrap();
        assert!(matches!(select_operation(&document, None), Err(ExecutionError::NoOperation)));
    }

    #[tokio::test]
    async fn test_execute_simple_query() {
        let executor = executor("type Query { user: User } type User { id: ID name: String }");
        let result = run(
            &executor,
            "{ user { id name __typename } }",
            json!({"user": {"id": 1, "name": "Alice"}}),
        )
        .await;
        assert!(!result.has_errors());
        assert_eq!(
            result.data,
            Some(json!({"user": {"id": "1", "name": "Alice", "__typename": "User"}}))
        );
    }

    #[tokio::test]
    async fn test_execute_with_arguments() {
        let mut resolvers = ResolverMap::new();
        resolvers.register_fn("Query", "greeting", |_parent, args, _ctx, _info| {
            let name: String = args.require("name")?;
            Ok(json!(format!("Hello {name}")))
        });
        let executor = executor("type Query { greeting(name: String = \"you\"): String }")
            .with_resolvers(resolvers);

        let result = run(&executor, "{ a: greeting(name: \"Han Solo\") b: greeting }", Value::Null).await;
        assert_eq!(result.data, Some(json!({"a": "Hello Han Solo", "b": "Hello you"})));
    }

    #[tokio::test]
    async fn test_execute_with_error() {
        let mut resolvers = ResolverMap::new();
        resolvers.register_fn("Query", "user", |_parent, _args, _ctx, _info| {
            Err("User not found".into())
        });
        let executor = executor("type Query { user: String other: String }").with_resolvers(resolvers);

        let result = run(&executor, "{\n  user\n  other\n}", json!({"other": "ok"})).await;
        assert_eq!(result.data, Some(json!({"user": null, "other": "ok"})));
        assert_eq!(
            serde_json::to_value(&result.errors).unwrap(),
            json!([{"message": "User not found", "locations": [{"line": 2, "column": 3}], "path": ["user"]}])
        );
    }

    #[tokio::test]
    async fn test_skip_and_include() {
        let executor = executor("type Query { a: String b: String c: String }");
        let request = Request::new(
            parse("query Q($yes: Boolean!) { a @skip(if: $yes) b @include(if: $yes) ... @skip(if: true) { c } }")
                .unwrap(),
        )
        .root_value(json!({"a": "a", "b": "b", "c": "c"}))
        .variables(json!({"yes": true}).as_object().cloned().unwrap());
        let result = executor.execute(request).await.unwrap();
        assert_eq!(result.data, Some(json!({"b": "b"})));
    }

    #[tokio::test]
    async fn test_leaf_serialization_errors() {
        let executor = executor("enum Color { RED } type Query { n: Int c: Color list: [Int] }");
        let result = run(
            &executor,
            "{ n c list }",
            json!({"n": "abc", "c": "BLUE", "list": 3}),
        )
        .await;
        assert_eq!(result.data, Some(json!({"n": null, "c": null, "list": null})));
        let messages: Vec<_> = result.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            [
                "Int cannot represent non-integer value: \"abc\"",
                "Enum \"Color\" cannot represent value: \"BLUE\"",
                "Expected Iterable, but did not find one for field \"Query.list\".",
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_mutation_type() {
        let executor = executor("type Query { a: String }");
        let err = executor
            .execute(Request::new(parse("mutation { a }").unwrap()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Schema is not configured for mutations.");
    }

    #[tokio::test]
    async fn test_variable_coercion_fails_request() {
        let executor = executor("type Query { a(n: Int): Int }");
        let err = executor
            .execute(Request::new(parse("query ($n: Int!) { a(n: $n) }").unwrap()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Variable \"$n\" of required type \"Int!\" was not provided.");
    }

    #[tokio::test]
    async fn test_execute_query_reports_validation_errors() {
        let executor = executor("type Query { a: String }");
        let result = executor.execute_query("{ b }", Value::Null, Variables::new()).await;
        assert_eq!(result.data, None);
        assert_eq!(result.errors[0].message, "Cannot query field \"b\" on type \"Query\".");

        let result = executor.execute_query("{ a", Value::Null, Variables::new()).await;
        assert!(result.errors[0].message.starts_with("Syntax Error:"));

        let result = executor.execute_query("{ a }", json!({"a": "x"}), Variables::new()).await;
        assert_eq!(result, ExecutionResult::data(json!({"a": "x"})));
    }

    #[tokio::test]
    async fn test_sequential_config_resolves_in_order() {
        let executor = executor("type Query { a: Int b: Int }").with_config(ExecutorConfig {
            concurrent: false,
            tracing: true,
            ..ExecutorConfig::default()
        });
        let result = run(&executor, "{ b a }", json!({"a": 1, "b": 2})).await;
        assert_eq!(
            serde_json::to_string(&result.data).unwrap(),
            r#"{"b":2,"a":1}"#
        );
    }

    #[tokio::test]
    async fn test_nested_lists_of_objects() {
        let executor = executor(
            "type Query { teams: [[Team!]] } type Team { name: String members: [Member] } type Member { handle: String! }",
        );
        let result = run(
            &executor,
            "{ teams { name members { handle } } }",
            json!({"teams": [
                [{"name": "core", "members": [{"handle": "ada"}, {"handle": null}]}],
                [],
            ]}),
        )
        .await;
        assert_eq!(
            result.data,
            Some(json!({"teams": [
                [{"name": "core", "members": [{"handle": "ada"}, null]}],
                [],
            ]}))
        );
        assert_eq!(result.errors.len(), 1);
        assert_eq!(display_path(&result.errors[0].path), "teams.0.0.members.1.handle");
    }
}
