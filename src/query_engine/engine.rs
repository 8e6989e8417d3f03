//! Query engine orchestration: resolver lookup, SQL rendering, execution,
//! and JSON result shaping.
//!
//! Three request paths, each exactly one backend round trip with no retry:
//! single-object fetch, list fetch (optionally wrapped in a pagination
//! envelope), and REST-style structured find. Zero matching rows is a valid
//! outcome on every path, never an error.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::errors::ExecutionError;
use super::executor::QueryExecutor;
use super::pagination::{resolve_page_window, ConnectionPayload};
use super::parameters::bind_parameters;
use super::registry::{ResolverRegistry, ResultShape};
use super::sql_builder::{build_find_query, FindQuery};

/// Outcome of a named-operation execution.
#[derive(Debug, Clone)]
pub enum QueryResult {
    /// Single-object fetch: the document, or `None` when no row matched.
    Single(Option<Value>),
    /// List fetch: the documents in backend order (possibly empty).
    List(Vec<Value>),
    /// Continuation-mode list fetch: a page plus cursor metadata.
    Connection(ConnectionPayload),
}

pub struct QueryEngine {
    registry: Arc<ResolverRegistry>,
    executor: Arc<dyn QueryExecutor>,
}

impl QueryEngine {
    pub fn new(registry: Arc<ResolverRegistry>, executor: Arc<dyn QueryExecutor>) -> Self {
        QueryEngine { registry, executor }
    }

    pub fn registry(&self) -> &ResolverRegistry {
        &self.registry
    }

    /// Execute a named operation with the given arguments. `paginated`
    /// marks a continuation/pagination request: the list payload is wrapped
    /// in a connection envelope with an end cursor.
    pub async fn execute_operation(
        &self,
        operation: &str,
        arguments: &HashMap<String, Value>,
        paginated: bool,
    ) -> Result<QueryResult, ExecutionError> {
        let resolver = self.registry.lookup(operation)?;

        match resolver.shape {
            ResultShape::Single => {
                let sql = bind_parameters(&resolver.sql_template, arguments)?;
                let payload = self.executor.fetch_first(&sql).await?;
                Ok(QueryResult::Single(parse_single(payload)?))
            }
            ResultShape::List => {
                let (offset, limit) = resolve_page_window(
                    arguments.get("first").and_then(Value::as_i64),
                    arguments.get("after").and_then(Value::as_str),
                )?;
                // Continuation requests over-fetch one row to learn whether
                // another page exists.
                let fetch_limit = if paginated { limit + 1 } else { limit };

                let mut bound = arguments.clone();
                bound.insert("limit".to_string(), Value::from(fetch_limit));
                bound.insert("offset".to_string(), Value::from(offset));

                let sql = bind_parameters(&resolver.sql_template, &bound)?;
                let items = parse_list(self.executor.fetch_first(&sql).await?)?;

                if paginated {
                    Ok(QueryResult::Connection(ConnectionPayload::from_overfetched(
                        items, offset, limit,
                    )))
                } else {
                    Ok(QueryResult::List(items))
                }
            }
        }
    }

    /// Execute a structured find request. Same single-row shaping as the
    /// named single-object fetch: `None` when nothing matched.
    pub async fn execute_find(&self, find: &FindQuery) -> Result<Option<Value>, ExecutionError> {
        let sql = bind_parameters(&build_find_query(find), &find.parameters)?;
        let payload = self.executor.fetch_first(&sql).await?;
        parse_single(payload)
    }
}

/// A single-object payload must be a JSON object; its absence is the valid
/// not-found outcome.
fn parse_single(payload: Option<String>) -> Result<Option<Value>, ExecutionError> {
    let Some(text) = payload else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(Some(Value::Object(map))),
        Ok(other) => Err(ExecutionError::ResultShapeMismatch {
            expected: "object",
            detail: format!("got {}", json_kind(&other)),
        }),
        Err(e) => Err(ExecutionError::ResultShapeMismatch {
            expected: "object",
            detail: e.to_string(),
        }),
    }
}

/// A list payload is one aggregated JSON array; zero backend rows means an
/// empty sequence. Order is whatever the backend returned.
fn parse_list(payload: Option<String>) -> Result<Vec<Value>, ExecutionError> {
    let Some(text) = payload else {
        return Ok(Vec::new());
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(other) => Err(ExecutionError::ResultShapeMismatch {
            expected: "array",
            detail: format!("got {}", json_kind(&other)),
        }),
        Err(e) => Err(ExecutionError::ResultShapeMismatch {
            expected: "array",
            detail: e.to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_engine::registry::QueryResolver;
    use crate::query_engine::sql_builder::Projection;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Canned-response executor that records the SQL it was handed.
    struct StubExecutor {
        response: Option<String>,
        seen_sql: Mutex<Vec<String>>,
    }

    impl StubExecutor {
        fn returning(response: Option<&str>) -> Self {
            StubExecutor {
                response: response.map(str::to_string),
                seen_sql: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QueryExecutor for StubExecutor {
        async fn fetch_first(&self, sql: &str) -> Result<Option<String>, ExecutionError> {
            self.seen_sql.lock().unwrap().push(sql.to_string());
            Ok(self.response.clone())
        }
    }

    fn engine_with(
        resolver: QueryResolver,
        executor: Arc<StubExecutor>,
    ) -> QueryEngine {
        let registry = Arc::new(ResolverRegistry::new());
        registry.register(resolver);
        QueryEngine::new(registry, executor)
    }

    fn single_resolver() -> QueryResolver {
        QueryResolver::new(
            "book_by_pk",
            "SELECT payload FROM app.books WHERE id = $id LIMIT 1",
            ResultShape::Single,
        )
    }

    fn list_resolver() -> QueryResolver {
        QueryResolver::new(
            "book_list",
            "SELECT agg FROM app.books LIMIT $limit OFFSET $offset",
            ResultShape::List,
        )
    }

    #[tokio::test]
    async fn single_fetch_returns_the_document() {
        let executor = Arc::new(StubExecutor::returning(Some(r#"{"id":1,"title":"Dune"}"#)));
        let engine = engine_with(single_resolver(), executor.clone());

        let result = engine
            .execute_operation("book_by_pk", &HashMap::from([("id".to_string(), json!(1))]), false)
            .await
            .unwrap();

        match result {
            QueryResult::Single(Some(doc)) => assert_eq!(doc["title"], "Dune"),
            other => panic!("expected a single document, got {other:?}"),
        }
        // The bound SQL carried the literal, not the placeholder.
        let seen = executor.seen_sql.lock().unwrap();
        assert_eq!(seen[0], "SELECT payload FROM app.books WHERE id = 1 LIMIT 1");
    }

    #[tokio::test]
    async fn single_fetch_with_no_rows_is_an_explicit_absence() {
        let executor = Arc::new(StubExecutor::returning(None));
        let engine = engine_with(single_resolver(), executor);

        let result = engine
            .execute_operation("book_by_pk", &HashMap::from([("id".to_string(), json!(7))]), false)
            .await
            .unwrap();

        assert!(matches!(result, QueryResult::Single(None)));
    }

    #[tokio::test]
    async fn malformed_single_payload_is_a_shape_mismatch() {
        let executor = Arc::new(StubExecutor::returning(Some("[1, 2]")));
        let engine = engine_with(single_resolver(), executor);

        let err = engine
            .execute_operation("book_by_pk", &HashMap::from([("id".to_string(), json!(7))]), false)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::ResultShapeMismatch { expected: "object", .. }));
    }

    #[tokio::test]
    async fn empty_list_payload_is_an_empty_sequence() {
        let executor = Arc::new(StubExecutor::returning(Some("[]")));
        let engine = engine_with(list_resolver(), executor);

        let result = engine
            .execute_operation("book_list", &HashMap::new(), false)
            .await
            .unwrap();

        match result {
            QueryResult::List(items) => assert!(items.is_empty()),
            other => panic!("expected a list, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_order_is_taken_from_the_backend() {
        let executor = Arc::new(StubExecutor::returning(Some(r#"[{"id":3},{"id":1},{"id":2}]"#)));
        let engine = engine_with(list_resolver(), executor);

        let result = engine
            .execute_operation("book_list", &HashMap::new(), false)
            .await
            .unwrap();

        match result {
            QueryResult::List(items) => {
                let ids: Vec<i64> = items.iter().map(|v| v["id"].as_i64().unwrap()).collect();
                assert_eq!(ids, vec![3, 1, 2]);
            }
            other => panic!("expected a list, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn paginated_fetch_overfetches_and_trims() {
        let executor = Arc::new(StubExecutor::returning(Some(
            r#"[{"id":1},{"id":2},{"id":3}]"#,
        )));
        let engine = engine_with(list_resolver(), executor.clone());

        let args = HashMap::from([("first".to_string(), json!(2))]);
        let result = engine
            .execute_operation("book_list", &args, true)
            .await
            .unwrap();

        match result {
            QueryResult::Connection(page) => {
                assert_eq!(page.items.len(), 2);
                assert!(page.has_next_page);
                assert!(page.end_cursor.is_some());
            }
            other => panic!("expected a connection, got {other:?}"),
        }
        // limit+1 was bound into the SQL.
        let seen = executor.seen_sql.lock().unwrap();
        assert_eq!(seen[0], "SELECT agg FROM app.books LIMIT 3 OFFSET 0");
    }

    #[tokio::test]
    async fn unknown_operation_is_resolver_not_found() {
        let executor = Arc::new(StubExecutor::returning(None));
        let engine = engine_with(list_resolver(), executor);

        let err = engine
            .execute_operation("nonexistent", &HashMap::new(), false)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::ResolverNotFound(name) if name == "nonexistent"));
    }

    #[tokio::test]
    async fn find_fetch_shapes_like_a_single_fetch() {
        let executor = Arc::new(StubExecutor::returning(Some(r#"{"id":9}"#)));
        let engine = engine_with(list_resolver(), executor.clone());

        let find = FindQuery {
            database: "app".to_string(),
            table: "books".to_string(),
            projections: vec![Projection {
                column: "id".to_string(),
                exposed: "id".to_string(),
            }],
            predicates: vec![("id".to_string(), "id".to_string())],
            parameters: HashMap::from([("id".to_string(), json!(9))]),
        };

        let found = engine.execute_find(&find).await.unwrap();
        assert_eq!(found.unwrap()["id"], 9);

        let seen = executor.seen_sql.lock().unwrap();
        assert!(seen[0].contains("WHERE t.id = 9 LIMIT 1"));
    }

    #[tokio::test]
    async fn find_with_no_match_is_none() {
        let executor = Arc::new(StubExecutor::returning(None));
        let engine = engine_with(list_resolver(), executor);

        let find = FindQuery {
            database: "app".to_string(),
            table: "books".to_string(),
            projections: vec![],
            predicates: vec![("id".to_string(), "id".to_string())],
            parameters: HashMap::from([("id".to_string(), json!(404))]),
        };

        assert!(engine.execute_find(&find).await.unwrap().is_none());
    }
}
