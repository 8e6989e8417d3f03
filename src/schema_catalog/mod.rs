//! Schema mapping engine: relational metadata plus entity configuration in,
//! GraphQL object-type definitions out.
//!
//! Conversion runs once at startup, before any query traffic; everything it
//! produces is immutable afterwards.

pub mod discovery;
pub mod entity_config;
pub mod errors;
pub mod metadata;
pub mod object_type;
pub mod relationship_resolver;
pub mod schema_converter;
pub mod type_mapper;

pub use entity_config::{
    Cardinality, EntityConfig, EntityPermissions, EntityRecord, EntityRegistry, FkSide,
    RelationshipConfig,
};
pub use errors::SchemaBuildError;
pub use metadata::{
    ColumnDefinition, ColumnType, DatabaseObject, DefaultValue, ForeignKeyDefinition,
    SourceDefinition, SourceKind,
};
pub use object_type::{DirectiveNode, FieldDefinition, ObjectTypeDefinition};
pub use schema_converter::{convert_all, convert_entity};
