//! Startup catalog assembly.
//!
//! Runs once, before the server accepts any traffic: entity declarations are
//! combined with column metadata (inline or discovered from ClickHouse) into
//! the entity registry, every entity is converted to its object type, and
//! the canonical resolvers are registered. Any failure here aborts startup.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{bail, Context};
use clickhouse::Client;
use serde::Deserialize;

use crate::query_engine::sql_builder::entity_resolver_templates;
use crate::query_engine::ResolverRegistry;
use crate::schema_catalog::discovery::discover_source_definition;
use crate::schema_catalog::{
    convert_all, Cardinality, ColumnDefinition, DatabaseObject, EntityConfig, EntityPermissions,
    EntityRecord, EntityRegistry, FkSide, ForeignKeyDefinition, ObjectTypeDefinition,
    RelationshipConfig, SourceDefinition, SourceKind,
};

/// Top-level catalog document, as the external loader hands it in.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDeclaration {
    /// Default database for sources that do not name one.
    pub database: String,
    pub entities: Vec<EntityDeclaration>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityDeclaration {
    pub name: String,
    #[serde(default)]
    pub singular_name: Option<String>,
    pub source: SourceDeclaration,
    /// Inline column metadata. When absent, columns are discovered from
    /// `system.columns`, which requires a ClickHouse connection.
    #[serde(default)]
    pub columns: Option<Vec<ColumnDefinition>>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub column_aliases: HashMap<String, String>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDeclaration>,
    #[serde(default)]
    pub permissions: EntityPermissions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceDeclaration {
    pub table: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default = "default_source_kind")]
    pub kind: SourceKind,
}

fn default_source_kind() -> SourceKind {
    SourceKind::Table
}

/// A declared relationship plus the foreign-key columns backing it.
/// ClickHouse does not model foreign keys, so the declaration carries them.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationshipDeclaration {
    pub name: String,
    pub target_entity: String,
    pub cardinality: Cardinality,
    #[serde(default)]
    pub source_columns: Vec<String>,
    #[serde(default)]
    pub target_columns: Vec<String>,
    #[serde(default)]
    pub nullability_side: Option<FkSide>,
}

/// Everything the request path needs, produced by one bootstrap pass.
#[derive(Debug)]
pub struct Catalog {
    pub registry: EntityRegistry,
    pub object_types: Vec<ObjectTypeDefinition>,
    pub resolvers: Arc<ResolverRegistry>,
}

/// Read a catalog declaration from a YAML file.
pub fn load_catalog_declaration(path: &str) -> anyhow::Result<CatalogDeclaration> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file `{path}`"))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse catalog file `{path}`"))
}

/// Assemble the catalog: resolve column metadata, wire relationship foreign
/// keys, convert every entity, and register the canonical resolvers.
pub async fn build_catalog(
    declaration: CatalogDeclaration,
    client: Option<&Client>,
) -> anyhow::Result<Catalog> {
    // Pass 1: resolve each entity's source definition so foreign keys can
    // reference any entity regardless of declaration order.
    let mut definitions: HashMap<String, (SourceDeclaration, SourceDefinition)> = HashMap::new();
    for entity in &declaration.entities {
        let definition = match &entity.columns {
            Some(columns) => SourceDefinition {
                columns: columns.clone(),
                primary_key: entity.primary_key.clone(),
                relationship_metadata: HashMap::new(),
            },
            None => {
                let Some(client) = client else {
                    bail!(
                        "entity `{}` declares no inline columns and no ClickHouse \
                         connection is available for discovery",
                        entity.name
                    );
                };
                let database = entity
                    .source
                    .database
                    .as_deref()
                    .unwrap_or(&declaration.database);
                let mut discovered =
                    discover_source_definition(client, database, &entity.source.table)
                        .await
                        .with_context(|| {
                            format!("failed to discover columns for entity `{}`", entity.name)
                        })?;
                if !entity.primary_key.is_empty() {
                    discovered.primary_key = entity.primary_key.clone();
                }
                discovered
            }
        };
        definitions.insert(entity.name.clone(), (entity.source.clone(), definition));
    }

    let qualified = |entity: &EntityDeclaration| {
        let database = entity
            .source
            .database
            .as_deref()
            .unwrap_or(&declaration.database);
        format!("{database}.{}", entity.source.table)
    };
    let qualified_names: HashMap<String, String> = declaration
        .entities
        .iter()
        .map(|e| (e.name.clone(), qualified(e)))
        .collect();

    // Pass 2: attach relationship metadata and build the registry.
    let mut registry = EntityRegistry::new();
    for entity in &declaration.entities {
        let Some((source, mut definition)) = definitions.remove(&entity.name) else {
            bail!("duplicate entity name `{}` in catalog", entity.name);
        };

        for relationship in &entity.relationships {
            if relationship.source_columns.is_empty() {
                // Left for conversion to reject with the precise error.
                continue;
            }
            let Some(target_qualified) = qualified_names.get(&relationship.target_entity) else {
                continue; // conversion reports the unknown target
            };
            definition
                .relationship_metadata
                .entry(relationship.target_entity.clone())
                .or_default()
                .push(ForeignKeyDefinition {
                    referencing_object: qualified_names[&entity.name].clone(),
                    referenced_object: target_qualified.clone(),
                    referencing_columns: relationship.source_columns.clone(),
                    referenced_columns: relationship.target_columns.clone(),
                });
        }

        let database = source
            .database
            .clone()
            .unwrap_or_else(|| declaration.database.clone());
        registry.insert(EntityRecord {
            config: EntityConfig {
                name: entity.name.clone(),
                singular_name: entity.singular_name.clone(),
                column_aliases: entity.column_aliases.clone(),
                relationships: entity
                    .relationships
                    .iter()
                    .map(|r| RelationshipConfig {
                        name: r.name.clone(),
                        target_entity: r.target_entity.clone(),
                        cardinality: r.cardinality,
                        nullability_side: r.nullability_side,
                    })
                    .collect(),
            },
            object: DatabaseObject {
                database,
                name: source.table.clone(),
                kind: source.kind,
                definition,
            },
            permissions: entity.permissions.clone(),
        });
    }

    // Conversion is all-or-nothing: one broken entity fails startup.
    let object_types = convert_all(&registry).context("schema conversion failed")?;
    log::info!(
        "converted {} entities into {} object types",
        registry.len(),
        object_types.len()
    );

    let resolvers = Arc::new(ResolverRegistry::new());
    for (_, record) in registry.iter() {
        for resolver in entity_resolver_templates(record) {
            resolvers.register(resolver);
        }
    }
    log::info!(
        "registered {} resolvers: {:?}",
        resolvers.len(),
        resolvers.operation_names()
    );

    Ok(Catalog {
        registry,
        object_types,
        resolvers,
    })
}
