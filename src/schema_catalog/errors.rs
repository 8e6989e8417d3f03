//! Error types for schema conversion and catalog construction.
//!
//! Everything in here is a startup-time failure: a broken mapping aborts the
//! whole build for the affected entity, and the server refuses to start.
//! Nothing is recoverable at request time.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchemaBuildError {
    #[error(
        "no GraphQL scalar mapping for column type `{column_type}` (column `{column}`); \
         a new mapping case must be added before this column can be exposed"
    )]
    UnsupportedTypeMapping { column: String, column_type: String },

    #[error("cannot encode default value of column `{column}` as a GraphQL literal: {reason}")]
    UnsupportedDefaultValueMapping { column: String, reason: String },

    #[error("relationship `{relationship}` references unknown entity `{target}`")]
    UnknownTargetEntity {
        relationship: String,
        target: String,
    },

    #[error(
        "no foreign key metadata connects `{source_entity}` to `{target}` \
         (required by relationship `{relationship}`)"
    )]
    MissingRelationshipMetadata {
        relationship: String,
        source_entity: String,
        target: String,
    },

    #[error("unsupported cardinality `{value}` on relationship `{relationship}` (expected `one` or `many`)")]
    UnsupportedCardinality {
        relationship: String,
        value: String,
    },

    #[error("field `{field}` is defined more than once on entity `{entity}`")]
    FieldNameCollision { entity: String, field: String },

    #[error(
        "primary key column `{column}` of entity `{entity}` has no granted roles; \
         grant at least one role or remove the column from the key"
    )]
    InaccessiblePrimaryKey { entity: String, column: String },
}
