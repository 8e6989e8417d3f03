//! SQL synthesis for entity fetches.
//!
//! Every query projects its columns through
//! `formatRowNoNewline('JSONEachRow', ...)` so the backend itself pre-shapes
//! each row as a type-preserving JSON document in a single column. List
//! queries additionally aggregate the per-row documents into one JSON array,
//! so every execution path reads at most one payload row.

use std::collections::HashMap;

use serde_json::Value;

use crate::schema_catalog::{EntityRecord, SourceKind};

use super::registry::{QueryResolver, ResultShape};

/// One projected column: physical name and the exposed field name it is
/// serialized under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub column: String,
    pub exposed: String,
}

/// Table alias used by all generated queries.
const ALIAS: &str = "t";

/// The projections an entity exposes: its role-permitted columns (all
/// columns for procedures), under their aliased names.
pub fn entity_projections(record: &EntityRecord) -> Vec<Projection> {
    record
        .object
        .definition
        .columns
        .iter()
        .filter(|column| {
            record.object.is_procedure() || record.permissions.column_has_any_role(&column.name)
        })
        .map(|column| Projection {
            column: column.name.clone(),
            exposed: record.config.exposed_column_name(&column.name).to_string(),
        })
        .collect()
}

/// `formatRowNoNewline('JSONEachRow', t.col AS exposed, ...)`: one JSON
/// object per row, exposed field names as keys, native value types kept.
fn json_row_expr(projections: &[Projection]) -> String {
    if projections.is_empty() {
        return "'{}'".to_string();
    }
    let columns: Vec<String> = projections
        .iter()
        .map(|p| format!("{ALIAS}.{} AS {}", p.column, p.exposed))
        .collect();
    format!("formatRowNoNewline('JSONEachRow', {})", columns.join(", "))
}

fn qualified(database: &str, table: &str) -> String {
    format!("{database}.{table}")
}

fn predicate_clause(columns: &[(String, String)]) -> String {
    columns
        .iter()
        .map(|(column, parameter)| format!("{ALIAS}.{column} = ${parameter}"))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Single-object fetch: zero or one payload row, keyed by the given columns.
/// Each key column binds a parameter of the same name.
pub fn build_item_query(
    database: &str,
    table: &str,
    projections: &[Projection],
    key_columns: &[String],
) -> String {
    let predicates: Vec<(String, String)> = key_columns
        .iter()
        .map(|c| (c.clone(), c.clone()))
        .collect();
    format!(
        "SELECT {} FROM {} AS {ALIAS} WHERE {} LIMIT 1",
        json_row_expr(projections),
        qualified(database, table),
        predicate_clause(&predicates),
    )
}

/// List fetch: exactly one payload row holding a JSON array of documents.
/// The inner query applies ordering and `$limit`/`$offset` before the rows
/// are aggregated, so an empty match still yields `[]`.
pub fn build_list_query(
    database: &str,
    table: &str,
    projections: &[Projection],
    order_by: &[String],
) -> String {
    let order_clause = if order_by.is_empty() {
        String::new()
    } else {
        let keys: Vec<String> = order_by.iter().map(|c| format!("{ALIAS}.{c}")).collect();
        format!(" ORDER BY {}", keys.join(", "))
    };
    format!(
        "SELECT concat('[', arrayStringConcat(groupArray(row_payload), ','), ']') \
         FROM (SELECT {} AS row_payload FROM {} AS {ALIAS}{} LIMIT $limit OFFSET $offset)",
        json_row_expr(projections),
        qualified(database, table),
        order_clause,
    )
}

/// REST-path query descriptor, built per request and never persisted.
#[derive(Debug, Clone)]
pub struct FindQuery {
    pub database: String,
    pub table: String,
    pub projections: Vec<Projection>,
    /// Column/parameter pairs forming the identity predicate.
    pub predicates: Vec<(String, String)>,
    /// Values for the predicate parameters.
    pub parameters: HashMap<String, Value>,
}

/// Render a find descriptor into single-row query text. Binding the
/// parameters happens separately, with the same rules as named operations.
pub fn build_find_query(find: &FindQuery) -> String {
    format!(
        "SELECT {} FROM {} AS {ALIAS} WHERE {} LIMIT 1",
        json_row_expr(&find.projections),
        qualified(&find.database, &find.table),
        predicate_clause(&find.predicates),
    )
}

/// The canonical resolvers registered for one entity at startup: a by-key
/// single fetch (when the relation declares a primary key) and a list fetch.
/// Procedures are invoked differently and get no canonical templates.
pub fn entity_resolver_templates(record: &EntityRecord) -> Vec<QueryResolver> {
    if record.object.kind == SourceKind::StoredProcedure {
        return Vec::new();
    }

    let projections = entity_projections(record);
    let name = record.config.name.to_lowercase();
    let database = &record.object.database;
    let table = &record.object.name;
    let primary_key = &record.object.definition.primary_key;

    let mut resolvers = Vec::with_capacity(2);
    if !primary_key.is_empty() {
        resolvers.push(QueryResolver::new(
            format!("{name}_by_pk"),
            build_item_query(database, table, &projections, primary_key),
            ResultShape::Single,
        ));
    } else {
        log::warn!(
            "entity `{}` has no primary key; skipping its by-key resolver",
            record.config.name
        );
    }
    resolvers.push(QueryResolver::new(
        format!("{name}_list"),
        build_list_query(database, table, &projections, primary_key),
        ResultShape::List,
    ));
    resolvers
}
