//! User-declared entity configuration: the name an API consumer sees for a
//! backing relation, plus aliasing, relationships, and role grants.
//!
//! These records are handed in by an external loader; every struct is plain
//! serde data so YAML/JSON catalogs deserialize straight into them. The
//! entity graph is naturally cyclic (A references B references A), so
//! entities live in a name-keyed registry and relationships carry name
//! references resolved through it at conversion time.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::SchemaBuildError;
use super::metadata::DatabaseObject;

/// Relationship multiplicity. `One` produces a direct object reference,
/// `Many` a paginated connection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

impl Cardinality {
    /// Parse boundary for loaders that carry cardinality as a raw string.
    pub fn parse(relationship: &str, raw: &str) -> Result<Cardinality, SchemaBuildError> {
        match raw {
            "one" => Ok(Cardinality::One),
            "many" => Ok(Cardinality::Many),
            other => Err(SchemaBuildError::UnsupportedCardinality {
                relationship: relationship.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::One => f.write_str("one"),
            Cardinality::Many => f.write_str("many"),
        }
    }
}

/// Which side of a foreign key governs a relationship's nullability.
/// When absent, the side is determined by comparing the key's referencing
/// relation against the source object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FkSide {
    Referencing,
    Referenced,
}

/// One declared relationship from an entity to a target entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipConfig {
    /// Field name on the generated object type.
    pub name: String,
    pub target_entity: String,
    pub cardinality: Cardinality,
    /// Optional override for nullability inference.
    #[serde(default)]
    pub nullability_side: Option<FkSide>,
}

/// Role grants for one entity: type-level access plus per-column access.
/// A column with no granted roles is omitted from the generated type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityPermissions {
    #[serde(default)]
    pub entity_roles: Vec<String>,
    #[serde(default)]
    pub field_roles: HashMap<String, Vec<String>>,
}

impl EntityPermissions {
    pub fn column_has_any_role(&self, column: &str) -> bool {
        self.field_roles
            .get(column)
            .map(|roles| !roles.is_empty())
            .unwrap_or(false)
    }
}

/// User-facing configuration of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Declared entity name; also the default GraphQL type name.
    pub name: String,
    /// Overrides the GraphQL type name when present. No pluralization or
    /// singularization is ever derived from it.
    #[serde(default)]
    pub singular_name: Option<String>,
    /// Physical column name -> exposed field name.
    #[serde(default)]
    pub column_aliases: HashMap<String, String>,
    /// Relationships in declaration order.
    #[serde(default)]
    pub relationships: Vec<RelationshipConfig>,
}

impl EntityConfig {
    /// The GraphQL type name for this entity: the configured singular display
    /// name if present, else the declared name as-is.
    pub fn graphql_type_name(&self) -> &str {
        self.singular_name.as_deref().unwrap_or(&self.name)
    }

    /// Exposed field name for a physical column.
    pub fn exposed_column_name<'a>(&'a self, column: &'a str) -> &'a str {
        self.column_aliases
            .get(column)
            .map(String::as_str)
            .unwrap_or(column)
    }
}

/// One fully assembled entity: configuration plus its backing relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub config: EntityConfig,
    pub object: DatabaseObject,
    #[serde(default)]
    pub permissions: EntityPermissions,
}

/// Name-keyed store of all entities, built once at startup. Relationship
/// targets are looked up here by name instead of holding object references,
/// which keeps cyclic entity graphs trivially representable.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: HashMap<String, EntityRecord>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: EntityRecord) {
        self.entities.insert(record.config.name.clone(), record);
    }

    pub fn get(&self, entity_name: &str) -> Option<&EntityRecord> {
        self.entities.get(entity_name)
    }

    /// Lookup that fails the build when the target is not declared.
    pub fn require(
        &self,
        relationship: &str,
        entity_name: &str,
    ) -> Result<&EntityRecord, SchemaBuildError> {
        self.entities
            .get(entity_name)
            .ok_or_else(|| SchemaBuildError::UnknownTargetEntity {
                relationship: relationship.to_string(),
                target: entity_name.to_string(),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &EntityRecord)> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_catalog::metadata::{SourceDefinition, SourceKind};

    fn record(name: &str) -> EntityRecord {
        EntityRecord {
            config: EntityConfig {
                name: name.to_string(),
                singular_name: None,
                column_aliases: HashMap::new(),
                relationships: vec![],
            },
            object: DatabaseObject {
                database: "app".to_string(),
                name: name.to_lowercase(),
                kind: SourceKind::Table,
                definition: SourceDefinition::default(),
            },
            permissions: EntityPermissions::default(),
        }
    }

    #[test]
    fn cardinality_parse_rejects_unknown_values() {
        assert_eq!(Cardinality::parse("author", "one"), Ok(Cardinality::One));
        assert_eq!(Cardinality::parse("books", "many"), Ok(Cardinality::Many));
        assert_eq!(
            Cardinality::parse("books", "several"),
            Err(SchemaBuildError::UnsupportedCardinality {
                relationship: "books".to_string(),
                value: "several".to_string(),
            })
        );
    }

    #[test]
    fn registry_require_reports_unknown_targets() {
        let mut registry = EntityRegistry::new();
        registry.insert(record("Book"));

        assert!(registry.require("author", "Book").is_ok());
        assert_eq!(
            registry.require("author", "Author"),
            Err(SchemaBuildError::UnknownTargetEntity {
                relationship: "author".to_string(),
                target: "Author".to_string(),
            })
        );
    }

    #[test]
    fn type_name_prefers_singular_display_name() {
        let mut config = EntityConfig {
            name: "books".to_string(),
            singular_name: None,
            column_aliases: HashMap::from([("pub_year".to_string(), "year".to_string())]),
            relationships: vec![],
        };
        assert_eq!(config.graphql_type_name(), "books");

        config.singular_name = Some("Book".to_string());
        assert_eq!(config.graphql_type_name(), "Book");
        assert_eq!(config.exposed_column_name("pub_year"), "year");
        assert_eq!(config.exposed_column_name("title"), "title");
    }

    #[test]
    fn entity_config_deserializes_from_yaml() {
        let yaml = r#"
name: Book
singular_name: Book
column_aliases:
  pub_year: year
relationships:
  - name: author
    target_entity: Author
    cardinality: one
"#;
        let config: EntityConfig = serde_yaml::from_str(yaml).expect("valid entity config");
        assert_eq!(config.relationships.len(), 1);
        assert_eq!(config.relationships[0].cardinality, Cardinality::One);
        assert_eq!(config.relationships[0].nullability_side, None);
    }
}
