//! Backing-relation metadata: tables, views, and stored procedures as the
//! database reports them, independent of any user-facing entity naming.
//!
//! Loaded once at startup (from discovery or from a prebuilt catalog) and
//! never mutated afterwards.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The twelve column primitives the mapping layer understands.
///
/// This is a closed set: anything else must be rejected at the boundary that
/// parses external type strings, not silently coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Single,
    Double,
    Decimal,
    Text,
    Boolean,
    DateTime,
    Bytes,
    Uuid,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::TinyInt => "tiny_int",
            ColumnType::SmallInt => "small_int",
            ColumnType::Int => "int",
            ColumnType::BigInt => "big_int",
            ColumnType::Single => "single",
            ColumnType::Double => "double",
            ColumnType::Decimal => "decimal",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::DateTime => "date_time",
            ColumnType::Bytes => "bytes",
            ColumnType::Uuid => "uuid",
        };
        f.write_str(name)
    }
}

/// A typed literal default, one variant per supported scalar kind.
///
/// Kept as a closed tagged enum so that adding a scalar kind forces every
/// consumer (scalar naming, literal encoding) to handle it at compile time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
    Text(String),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Bytes(Vec<u8>),
    Uuid(uuid::Uuid),
}

impl DefaultValue {
    /// The column type this literal belongs to.
    pub fn column_type(&self) -> ColumnType {
        match self {
            DefaultValue::TinyInt(_) => ColumnType::TinyInt,
            DefaultValue::SmallInt(_) => ColumnType::SmallInt,
            DefaultValue::Int(_) => ColumnType::Int,
            DefaultValue::BigInt(_) => ColumnType::BigInt,
            DefaultValue::Single(_) => ColumnType::Single,
            DefaultValue::Double(_) => ColumnType::Double,
            DefaultValue::Decimal(_) => ColumnType::Decimal,
            DefaultValue::Text(_) => ColumnType::Text,
            DefaultValue::Boolean(_) => ColumnType::Boolean,
            DefaultValue::DateTime(_) => ColumnType::DateTime,
            DefaultValue::Bytes(_) => ColumnType::Bytes,
            DefaultValue::Uuid(_) => ColumnType::Uuid,
        }
    }
}

/// One column of a backing relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
    #[serde(default)]
    pub nullable: bool,
    /// Populated by the backend (MATERIALIZED/ALIAS columns and the like).
    #[serde(default)]
    pub is_autogenerated: bool,
    #[serde(default)]
    pub default_value: Option<DefaultValue>,
}

/// A foreign key between two backing relations.
///
/// Only consulted to answer "is any column in this set nullable" when
/// resolving relationship fields; column lists are positionally paired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyDefinition {
    /// Qualified name (`database.table`) of the referencing relation.
    pub referencing_object: String,
    /// Qualified name of the referenced relation.
    pub referenced_object: String,
    pub referencing_columns: Vec<String>,
    pub referenced_columns: Vec<String>,
}

/// Column set, key, and relationship metadata of one backing relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Columns in backend declaration order. Names are unique.
    pub columns: Vec<ColumnDefinition>,
    /// Names of the primary-key columns, if any.
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Foreign keys connecting this relation to other entities, keyed by the
    /// target entity name. Each list keeps declaration order; the first entry
    /// wins when several keys connect the same pair of relations.
    #[serde(default)]
    pub relationship_metadata: HashMap<String, Vec<ForeignKeyDefinition>>,
}

impl SourceDefinition {
    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.primary_key.iter().any(|k| k == column)
    }

    pub fn foreign_keys_to(&self, target_entity: &str) -> Option<&[ForeignKeyDefinition]> {
        self.relationship_metadata
            .get(target_entity)
            .map(|fks| fks.as_slice())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Table,
    View,
    StoredProcedure,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Table => f.write_str("table"),
            SourceKind::View => f.write_str("view"),
            SourceKind::StoredProcedure => f.write_str("stored_procedure"),
        }
    }
}

/// One backing relation: table, view, or stored procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseObject {
    pub database: String,
    pub name: String,
    pub kind: SourceKind,
    pub definition: SourceDefinition,
}

impl DatabaseObject {
    /// Qualified `database.name` form, the identity used in foreign-key
    /// side comparisons.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.database, self.name)
    }

    pub fn is_procedure(&self) -> bool {
        self.kind == SourceKind::StoredProcedure
    }
}
