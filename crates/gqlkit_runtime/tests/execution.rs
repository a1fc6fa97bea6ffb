//! Integration tests for the parse, build, validate and execute pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gqlkit_runtime::{
    ExecutionError, ExecutionResult, Executor, ExecutorConfig, PathSegment, Request, ResolverError,
    ResolverMap,
};
use gqlkit_semantic::{build_schema, validate, BuildSchemaOptions, Variables};
use gqlkit_syntax::parse;
use serde_json::{json, Value};

fn executor(sdl: &str, resolvers: ResolverMap) -> Executor {
    let schema = build_schema(&parse(sdl).unwrap(), BuildSchemaOptions::default()).unwrap();
    Executor::new(schema).with_resolvers(resolvers)
}

/// Validates `query` and executes it against `root`.
async fn run(executor: &Executor, query: &str, root: Value) -> ExecutionResult {
    let document = parse(query).unwrap();
    assert_eq!(validate(executor.schema(), &document).unwrap(), vec![]);
    executor
        .execute(Request::new(document).root_value(root))
        .await
        .unwrap()
}

fn variables(value: Value) -> Variables {
    value.as_object().cloned().unwrap()
}

/// A plain string field resolves to its value.
#[tokio::test]
async fn test_hello_query() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "a", |_parent, _args, _ctx, _info| Ok(json!("hello")));
    let executor = executor("type Query { a: String }", resolvers);

    let result = run(&executor, "{ a }", Value::Null).await;
    assert_eq!(result, ExecutionResult::data(json!({"a": "hello"})));
    insta::assert_json_snapshot!(result, @r###"
    {
      "data": {
        "a": "hello"
      }
    }
    "###);
}

/// The wire form carries `errors` only when there are some, after `data`.
#[tokio::test]
async fn test_response_wire_shape() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "a", |_parent, _args, _ctx, _info| Ok(json!("hello")));
    resolvers.register_fn("Query", "b", |_parent, _args, _ctx, _info| {
        Err(ResolverError::new("no b"))
    });
    let executor = executor("type Query { a: String b: String }", resolvers);

    let ok = run(&executor, "{ a }", Value::Null).await;
    assert!(ok.errors.is_empty());
    assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"data":{"a":"hello"}}"#);

    let partial = run(&executor, "{ a b }", Value::Null).await;
    assert_eq!(
        serde_json::to_string(&partial).unwrap(),
        r#"{"data":{"a":"hello","b":null},"errors":[{"message":"no b","locations":[{"line":1,"column":5}],"path":["b"]}]}"#
    );
}

/// A null root field of non-null type nulls the whole response.
#[tokio::test]
async fn test_non_null_root_field_nulls_data() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "a", |_parent, _args, _ctx, _info| Ok(Value::Null));
    let executor = executor("type Query { a: String! }", resolvers);

    let result = run(&executor, "{ a }", Value::Null).await;
    insta::assert_json_snapshot!(result, @r###"
    {
      "data": null,
      "errors": [
        {
          "message": "Cannot return null for non-nullable field Query.a.",
          "locations": [
            {
              "line": 1,
              "column": 3
            }
          ],
          "path": [
            "a"
          ]
        }
      ]
    }
    "###);
}

/// The null travels up to the nearest nullable ancestor and only the
/// originating failure is reported.
#[tokio::test]
async fn test_non_null_propagation() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Inner", "value", |_parent, _args, _ctx, _info| {
        Err(ResolverError::new("value failed"))
    });
    let executor = executor(
        "type Query { outer: Outer sibling: String }
         type Outer { inner: Inner! other: String }
         type Inner { value: String! }",
        resolvers,
    );

    let result = run(
        &executor,
        "{ outer { other inner { value } } sibling }",
        json!({"outer": {"other": "x", "inner": {}}, "sibling": "still here"}),
    )
    .await;
    assert_eq!(result.data, Some(json!({"outer": null, "sibling": "still here"})));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].message, "value failed");
    assert_eq!(
        result.errors[0].path,
        [
            PathSegment::Field("outer".to_string()),
            PathSegment::Field("inner".to_string()),
            PathSegment::Field("value".to_string()),
        ]
    );
}

/// One failing list item does not affect its siblings.
#[tokio::test]
async fn test_list_items_fail_independently() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Item", "name", |parent, _args, _ctx, _info| {
        match parent.get("name") {
            Some(name) => Ok(name.clone()),
            None => Err(ResolverError::new("no name")),
        }
    });
    let executor = executor(
        "type Query { items: [Item] strict: [Int!] loose: [Int] }
         type Item { name: String! }",
        resolvers,
    );

    let result = run(
        &executor,
        "{ items { name } strict loose }",
        json!({
            "items": [{"name": "a"}, {}, {"name": "c"}],
            "strict": [1, null, 3],
            "loose": [1, "two", 3],
        }),
    )
    .await;
    assert_eq!(
        result.data,
        Some(json!({
            "items": [{"name": "a"}, null, {"name": "c"}],
            "strict": null,
            "loose": [1, null, 3],
        }))
    );
    let errors: Vec<_> = result
        .errors
        .iter()
        .map(|e| (e.message.as_str(), serde_json::to_value(&e.path).unwrap()))
        .collect();
    assert_eq!(
        errors,
        [
            ("no name", json!(["items", 1, "name"])),
            ("Cannot return null for non-nullable field Query.strict.", json!(["strict", 1])),
            ("Int cannot represent non-integer value: \"two\"", json!(["loose", 1])),
        ]
    );
}

fn recording_resolvers(parent_type: &str, log: &Arc<Mutex<Vec<String>>>) -> ResolverMap {
    let mut resolvers = ResolverMap::new();
    for (field, delay) in [("first", 30), ("second", 20), ("third", 10)] {
        let log = Arc::clone(log);
        resolvers.register_async(parent_type, field, move |_parent, _args, _ctx, _info| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("start {field}"));
                tokio::time::sleep(Duration::from_millis(delay)).await;
                log.lock().unwrap().push(format!("end {field}"));
                Ok(json!(field))
            }
        });
    }
    resolvers
}

/// Each mutation field settles before the next one starts.
#[tokio::test]
async fn test_mutation_fields_run_serially() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let executor = executor(
        "type Query { noop: String }
         type Mutation { first: String second: String third: String }",
        recording_resolvers("Mutation", &log),
    );

    let result = run(&executor, "mutation { first second third }", Value::Null).await;
    assert_eq!(
        result.data,
        Some(json!({"first": "first", "second": "second", "third": "third"}))
    );
    assert_eq!(
        *log.lock().unwrap(),
        [
            "start first",
            "end first",
            "start second",
            "end second",
            "start third",
            "end third",
        ]
    );
}

/// Query fields resolve concurrently but keep selection order in the
/// response.
#[tokio::test]
async fn test_query_fields_run_concurrently() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let executor = executor(
        "type Query { first: String second: String third: String }",
        recording_resolvers("Query", &log),
    );

    let result = run(&executor, "{ first second third }", Value::Null).await;
    assert_eq!(
        serde_json::to_string(&result.data).unwrap(),
        r#"{"first":"first","second":"second","third":"third"}"#
    );
    assert_eq!(
        *log.lock().unwrap(),
        [
            "start first",
            "start second",
            "start third",
            "end third",
            "end second",
            "end first",
        ]
    );
}

/// Errors come back in selection order, not completion order.
#[tokio::test]
async fn test_error_order_is_deterministic() {
    let mut resolvers = ResolverMap::new();
    for (field, delay) in [("slow", 20), ("fast", 1)] {
        resolvers.register_async("Query", field, move |_parent, _args, _ctx, _info| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Err(ResolverError::new(format!("{field} failed")))
        });
    }
    let executor = executor("type Query { slow: String fast: String }", resolvers);

    let result = run(&executor, "{ slow fast }", Value::Null).await;
    let messages: Vec<_> = result.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, ["slow failed", "fast failed"]);
}

/// Overlapping fields from several fragments merge into one field set.
#[tokio::test]
async fn test_fragments_merge_into_one_selection() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut resolvers = ResolverMap::new();
    let counter = Arc::clone(&calls);
    resolvers.register_fn("User", "friend", move |_parent, _args, _ctx, _info| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(json!({"id": "2", "name": "Bob"}))
    });
    let executor = executor(
        "type Query { user: User } type User { id: ID name: String friend: User }",
        resolvers,
    );

    let result = run(
        &executor,
        "{ user { ...A ...B ... on User { id } } }
         fragment A on User { id name friend { id } }
         fragment B on User { name friend { name } }",
        json!({"user": {"id": "1", "name": "Alice"}}),
    )
    .await;
    assert_eq!(
        serde_json::to_string(&result.data).unwrap(),
        r#"{"user":{"id":"1","name":"Alice","friend":{"id":"2","name":"Bob"}}}"#
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

const PETS: &str = "
    type Query { pets: [Pet] search: [SearchResult] }
    interface Pet { name: String }
    type Dog implements Pet { name: String barks: Boolean }
    type Cat implements Pet { name: String meows: Boolean }
    type Person { name: String }
    union SearchResult = Dog | Person
";

/// Abstract types resolve through a type resolver or `__typename`.
#[tokio::test]
async fn test_abstract_types() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_type_resolver("Pet", |value, _ctx, _info| {
        let name = if value.get("barks").is_some() { "Dog" } else { "Cat" };
        Some(name.to_string())
    });
    let executor = executor(PETS, resolvers);

    let result = run(
        &executor,
        "{
            pets { __typename name ... on Dog { barks } ... on Cat { meows } }
            search { ... on Person { name } ... on Dog { barks } }
        }",
        json!({
            "pets": [{"name": "Odie", "barks": true}, {"name": "Garfield", "meows": false}],
            "search": [{"__typename": "Person", "name": "Jon"}, {"__typename": "Dog", "barks": true}],
        }),
    )
    .await;
    assert!(!result.has_errors());
    assert_eq!(
        result.data,
        Some(json!({
            "pets": [
                {"__typename": "Dog", "name": "Odie", "barks": true},
                {"__typename": "Cat", "name": "Garfield", "meows": false},
            ],
            "search": [{"name": "Jon"}, {"barks": true}],
        }))
    );
}

/// A value whose runtime type cannot be determined is a field error.
#[tokio::test]
async fn test_unresolvable_abstract_type() {
    let executor = executor(PETS, ResolverMap::new());

    let result = run(
        &executor,
        "{ search { ... on Person { name } } }",
        json!({"search": [{"name": "Jon"}, {"__typename": "Cat"}]}),
    )
    .await;
    assert_eq!(result.data, Some(json!({"search": [null, null]})));
    let messages: Vec<_> = result.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        [
            "Abstract type \"SearchResult\" must resolve to an Object type at runtime for field \"Query.search\". Either register a type resolver for \"SearchResult\" or return a \"__typename\" with the value.",
            "Runtime Object type \"Cat\" is not a possible type for \"SearchResult\".",
        ]
    );
}

/// Variables and argument defaults reach the resolver coerced.
#[tokio::test]
async fn test_variables_and_defaults() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "echo", |_parent, args, _ctx, info| {
        Ok(json!({"args": args.all(), "path": info.path}))
    });
    let executor = executor(
        "scalar JSON
         input Filter { limit: Int = 10 tags: [String] }
         type Query { echo(filter: Filter, ratio: Float, flag: Boolean = true): JSON }",
        resolvers,
    );

    let document = parse(
        "query Echo($ratio: Float, $tags: [String]) {
            echo(filter: { tags: $tags }, ratio: $ratio)
        }",
    )
    .unwrap();
    let request = Request::new(document).variables(variables(json!({"ratio": 2, "tags": "one"})));
    let result = executor.execute(request).await.unwrap();
    assert_eq!(
        result.data,
        Some(json!({
            "echo": {
                "args": {"filter": {"limit": 10, "tags": ["one"]}, "ratio": 2.0, "flag": true},
                "path": ["echo"],
            }
        }))
    );
}

/// Invalid argument values are field errors, not request errors.
#[tokio::test]
async fn test_argument_coercion_error_is_a_field_error() {
    let executor = executor("type Query { a(n: Int!): Int b: Int }", ResolverMap::new());

    let document = parse("query Q($n: Int) { a(n: $n) b }").unwrap();
    let result = executor
        .execute(Request::new(document).root_value(json!({"a": 1, "b": 2})))
        .await
        .unwrap();
    assert_eq!(result.data, Some(json!({"a": null, "b": 2})));
    assert_eq!(
        result.errors[0].message,
        "Argument \"n\" of required type \"Int!\" was provided the variable \"$n\" which was not provided a runtime value."
    );
}

/// Request-level failures are returned before any field runs.
#[tokio::test]
async fn test_request_errors() {
    let executor = executor("type Query { a: String }", ResolverMap::new());

    let err = executor
        .execute(Request::new(parse("query A { a } query B { a }").unwrap()))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::AmbiguousOperation));

    let err = executor
        .execute(Request::new(parse("query A { a }").unwrap()).operation_name("B"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Unknown operation named \"B\".");

    let result = executor
        .execute(
            Request::new(parse("query A { a } query B { a }").unwrap())
                .operation_name("B")
                .root_value(json!({"a": "b"})),
        )
        .await
        .unwrap();
    assert_eq!(result.data, Some(json!({"a": "b"})));
}

/// Executing against an invalid schema fails fast unless checks are off.
#[tokio::test]
async fn test_invalid_schema() {
    let schema = build_schema(
        &parse("type Query { a: String } union U = Query | String").unwrap(),
        BuildSchemaOptions::default(),
    )
    .unwrap();
    let schema = Arc::new(schema);

    let err = Executor::new(Arc::clone(&schema))
        .execute(Request::new(parse("{ a }").unwrap()))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::InvalidSchema(_)));

    let result = Executor::new(schema)
        .with_config(ExecutorConfig {
            validate_schema: false,
            ..ExecutorConfig::default()
        })
        .execute(Request::new(parse("{ a }").unwrap()).root_value(json!({"a": "ok"})))
        .await
        .unwrap();
    assert_eq!(result.data, Some(json!({"a": "ok"})));
}
