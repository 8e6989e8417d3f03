//! ClickHouse table metadata discovery.
//!
//! Builds a [`SourceDefinition`] from `system.columns` so deployments do not
//! have to hand-write column metadata. Typed default values cannot be
//! recovered from `default_expression` text and stay `None` here; catalogs
//! that need default-value directives declare columns inline instead.

use clickhouse::Client;
use log::debug;
use thiserror::Error;

use super::errors::SchemaBuildError;
use super::metadata::{ColumnDefinition, SourceDefinition};
use super::type_mapper::parse_clickhouse_type;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to query columns for {database}.{table}: {source}")]
    Query {
        database: String,
        table: String,
        #[source]
        source: clickhouse::error::Error,
    },

    #[error("table {database}.{table} has no columns (does it exist?)")]
    NoColumns { database: String, table: String },

    #[error(transparent)]
    Mapping(#[from] SchemaBuildError),
}

#[derive(Debug, serde::Deserialize, clickhouse::Row)]
pub struct SystemColumnRow {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub default_kind: String,
    pub is_in_primary_key: u8,
}

/// Fetch column metadata for one table and map it onto a source definition.
pub async fn discover_source_definition(
    client: &Client,
    database: &str,
    table: &str,
) -> Result<SourceDefinition, DiscoveryError> {
    let query = format!(
        "SELECT name, type, default_kind, is_in_primary_key \
         FROM system.columns WHERE database = '{database}' AND table = '{table}' \
         ORDER BY position"
    );
    debug!("discovering columns for {database}.{table}");

    let rows: Vec<SystemColumnRow> =
        client
            .query(&query)
            .fetch_all()
            .await
            .map_err(|e| DiscoveryError::Query {
                database: database.to_string(),
                table: table.to_string(),
                source: e,
            })?;

    if rows.is_empty() {
        return Err(DiscoveryError::NoColumns {
            database: database.to_string(),
            table: table.to_string(),
        });
    }

    let definition = source_definition_from_rows(rows)?;
    debug!(
        "discovered {} columns for {database}.{table} (primary key: {:?})",
        definition.columns.len(),
        definition.primary_key
    );
    Ok(definition)
}

/// Pure mapping step, split out so it is testable without a live backend.
pub fn source_definition_from_rows(
    rows: Vec<SystemColumnRow>,
) -> Result<SourceDefinition, SchemaBuildError> {
    let mut columns = Vec::with_capacity(rows.len());
    let mut primary_key = Vec::new();

    for row in rows {
        let parsed = parse_clickhouse_type(&row.name, &row.column_type)?;
        // MATERIALIZED and ALIAS columns are computed by the server and can
        // never be written by a client.
        let is_autogenerated = matches!(row.default_kind.as_str(), "MATERIALIZED" | "ALIAS");

        if row.is_in_primary_key != 0 {
            primary_key.push(row.name.clone());
        }
        columns.push(ColumnDefinition {
            name: row.name,
            column_type: parsed.column_type,
            nullable: parsed.nullable,
            is_autogenerated,
            default_value: None,
        });
    }

    Ok(SourceDefinition {
        columns,
        primary_key,
        relationship_metadata: Default::default(),
    })
}
