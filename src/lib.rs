//! TableGQL - GraphQL surface derivation for ClickHouse tables
//!
//! This crate turns relational metadata plus declarative entity configuration
//! into a GraphQL API surface:
//! - Object-type generation from table/view/procedure definitions
//! - Relationship fields with nullability inferred from foreign keys
//! - Named query resolvers rendered into parameterized ClickHouse SQL
//! - JSON result shaping for single-object, list, and find-by-key fetches

pub mod config;
pub mod query_engine;
pub mod schema_catalog;
pub mod server;
