//! HTTP handlers: the thin outer surface over the query engine.
//!
//! Error mapping follows the execution taxonomy: argument problems are the
//! caller's (400), a missing resolver or backend failure is the server's
//! (500), and an empty result is a successful response, not an error.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::query_engine::{ExecutionError, FindQuery, QueryResult};
use crate::query_engine::sql_builder::entity_projections;

use super::models::{ErrorResponse, OperationRequest};
use super::AppState;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "service": "tablegql",
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// The generated object-type definitions, for the external schema assembler
/// and for debugging.
pub async fn schema_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let types: Vec<Value> = state
        .catalog
        .object_types
        .iter()
        .map(|t| t.to_json())
        .collect();
    Json(json!({ "types": types }))
}

/// Execute a named operation. This is the path the GraphQL execution runtime
/// calls into once it has resolved a query against the generated schema.
pub async fn operation_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OperationRequest>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let result = state
        .engine
        .execute_operation(&request.operation, &request.arguments, request.paginated)
        .await
        .map_err(execution_error_response)?;

    let body = match result {
        QueryResult::Single(document) => json!({ "value": document }),
        QueryResult::List(items) => json!({ "values": items }),
        QueryResult::Connection(page) => {
            serde_json::to_value(page).unwrap_or_else(|_| json!(null))
        }
    };
    Ok(Json(body).into_response())
}

/// REST-style find-by-key: `GET /api/{entity}/{field}/{value}`. The field is
/// an exposed field name; the value is compared against its backing column.
pub async fn find_handler(
    State(state): State<Arc<AppState>>,
    Path((entity, field, value)): Path<(String, String, String)>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let Some(record) = state.catalog.registry.get(&entity) else {
        return Err(not_found(format!("unknown entity `{entity}`")));
    };

    let projections = entity_projections(record);
    let Some(projection) = projections.iter().find(|p| p.exposed == field) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!(
                "`{field}` is not an exposed field of `{entity}`"
            ))),
        ));
    };

    // Path segments are text; numeric keys are compared numerically.
    let bound_value = value
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or(Value::String(value));

    let find = FindQuery {
        database: record.object.database.clone(),
        table: record.object.name.clone(),
        predicates: vec![(projection.column.clone(), "key".to_string())],
        projections,
        parameters: HashMap::from([("key".to_string(), bound_value)]),
    };

    match state.engine.execute_find(&find).await {
        Ok(Some(document)) => Ok(Json(document).into_response()),
        Ok(None) => Err(not_found(format!("no `{entity}` matched `{field}`"))),
        Err(e) => Err(execution_error_response(e)),
    }
}

fn not_found(message: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new(message)))
}

fn execution_error_response(error: ExecutionError) -> (StatusCode, Json<ErrorResponse>) {
    if error.is_caller_error() {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(error.to_string())),
        )
    } else {
        // Registry misses and backend failures are server-side problems;
        // log the detail, keep the response generic.
        log::error!("operation execution failed: {error}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("query execution failed")),
        )
    }
}
