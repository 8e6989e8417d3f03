//! Relationship-field resolution: turns a declared relationship plus the
//! source relation's foreign-key metadata into a GraphQL field type and its
//! nullability.

use async_graphql::dynamic::TypeRef;

use super::entity_config::{Cardinality, EntityRegistry, FkSide, RelationshipConfig};
use super::errors::SchemaBuildError;
use super::metadata::{DatabaseObject, ForeignKeyDefinition};

/// A resolved relationship field: the (already nullability-wrapped) type
/// reference, the flag it was derived from, and the target type name the
/// relationship directive carries.
#[derive(Debug, Clone)]
pub struct ResolvedRelationshipField {
    pub ty: TypeRef,
    pub nullable: bool,
    pub target_type_name: String,
}

/// Name of the generated pagination type wrapping a singular type.
pub fn connection_type_name(target_type: &str) -> String {
    format!("{target_type}Connection")
}

/// Resolve one declared relationship against the entity registry.
///
/// Fails when the target entity is undeclared or when no foreign key connects
/// the two relations; both are hard build errors, never downgraded to a
/// default. Nullability comes from the foreign-key columns on whichever side
/// belongs to the source relation (the first key in declaration order when
/// several connect the same pair).
pub fn resolve_relationship_field(
    source_object: &DatabaseObject,
    relationship: &RelationshipConfig,
    registry: &EntityRegistry,
) -> Result<ResolvedRelationshipField, SchemaBuildError> {
    let target = registry.require(&relationship.name, &relationship.target_entity)?;
    let target_type_name = target.config.graphql_type_name().to_string();

    let foreign_key = source_object
        .definition
        .foreign_keys_to(&relationship.target_entity)
        .and_then(|fks| fks.first())
        .ok_or_else(|| SchemaBuildError::MissingRelationshipMetadata {
            relationship: relationship.name.clone(),
            source_entity: source_object.qualified_name(),
            target: relationship.target_entity.clone(),
        })?;

    let nullable = owning_side_is_nullable(source_object, relationship, foreign_key)?;

    let ty = match relationship.cardinality {
        Cardinality::One => {
            if nullable {
                TypeRef::named(target_type_name.clone())
            } else {
                TypeRef::named_nn(target_type_name.clone())
            }
        }
        // Connection fields are always present; emptiness lives inside the
        // connection payload, not in field nullability.
        Cardinality::Many => TypeRef::named_nn(connection_type_name(&target_type_name)),
    };

    Ok(ResolvedRelationshipField {
        ty,
        nullable,
        target_type_name,
    })
}

/// "Any column in the owning side's column set is nullable", where the owning
/// side is the one belonging to the source relation (or the configured
/// override). The examined columns always live on the source relation.
fn owning_side_is_nullable(
    source_object: &DatabaseObject,
    relationship: &RelationshipConfig,
    foreign_key: &ForeignKeyDefinition,
) -> Result<bool, SchemaBuildError> {
    let side = match relationship.nullability_side {
        Some(side) => side,
        None => {
            if foreign_key.referencing_object == source_object.qualified_name() {
                FkSide::Referencing
            } else {
                FkSide::Referenced
            }
        }
    };

    let columns = match side {
        FkSide::Referencing => &foreign_key.referencing_columns,
        FkSide::Referenced => &foreign_key.referenced_columns,
    };

    let mut nullable = false;
    for column in columns {
        let definition = source_object.definition.column(column).ok_or_else(|| {
            // A key column the source relation does not declare means the
            // metadata is inconsistent, the same failure as a missing key.
            SchemaBuildError::MissingRelationshipMetadata {
                relationship: relationship.name.clone(),
                source_entity: source_object.qualified_name(),
                target: relationship.target_entity.clone(),
            }
        })?;
        nullable |= definition.nullable;
    }
    Ok(nullable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema_catalog::entity_config::{
        EntityConfig, EntityPermissions, EntityRecord,
    };
    use crate::schema_catalog::metadata::{
        ColumnDefinition, ColumnType, SourceDefinition, SourceKind,
    };
    use std::collections::HashMap;

    fn column(name: &str, nullable: bool) -> ColumnDefinition {
        ColumnDefinition {
            name: name.to_string(),
            column_type: ColumnType::Int,
            nullable,
            is_autogenerated: false,
            default_value: None,
        }
    }

    fn registry_with_author() -> EntityRegistry {
        let mut registry = EntityRegistry::new();
        registry.insert(EntityRecord {
            config: EntityConfig {
                name: "Author".to_string(),
                singular_name: None,
                column_aliases: HashMap::new(),
                relationships: vec![],
            },
            object: DatabaseObject {
                database: "app".to_string(),
                name: "authors".to_string(),
                kind: SourceKind::Table,
                definition: SourceDefinition {
                    columns: vec![column("id", false)],
                    primary_key: vec!["id".to_string()],
                    relationship_metadata: HashMap::new(),
                },
            },
            permissions: EntityPermissions::default(),
        });
        registry
    }

    fn book_object(author_id_nullable: bool) -> DatabaseObject {
        let fk = ForeignKeyDefinition {
            referencing_object: "app.books".to_string(),
            referenced_object: "app.authors".to_string(),
            referencing_columns: vec!["author_id".to_string()],
            referenced_columns: vec!["id".to_string()],
        };
        DatabaseObject {
            database: "app".to_string(),
            name: "books".to_string(),
            kind: SourceKind::Table,
            definition: SourceDefinition {
                columns: vec![column("id", false), column("author_id", author_id_nullable)],
                primary_key: vec!["id".to_string()],
                relationship_metadata: HashMap::from([(
                    "Author".to_string(),
                    vec![fk],
                )]),
            },
        }
    }

    fn relationship(cardinality: Cardinality) -> RelationshipConfig {
        RelationshipConfig {
            name: "author".to_string(),
            target_entity: "Author".to_string(),
            cardinality,
            nullability_side: None,
        }
    }

    #[test]
    fn nullable_foreign_key_yields_nullable_reference() {
        let resolved = resolve_relationship_field(
            &book_object(true),
            &relationship(Cardinality::One),
            &registry_with_author(),
        )
        .unwrap();

        assert!(resolved.nullable);
        assert_eq!(resolved.ty.to_string(), "Author");
        assert_eq!(resolved.target_type_name, "Author");
    }

    #[test]
    fn non_nullable_foreign_key_yields_required_reference() {
        let resolved = resolve_relationship_field(
            &book_object(false),
            &relationship(Cardinality::One),
            &registry_with_author(),
        )
        .unwrap();

        assert!(!resolved.nullable);
        assert_eq!(resolved.ty.to_string(), "Author!");
    }

    #[test]
    fn many_side_is_a_required_connection() {
        let resolved = resolve_relationship_field(
            &book_object(true),
            &relationship(Cardinality::Many),
            &registry_with_author(),
        )
        .unwrap();

        assert_eq!(resolved.ty.to_string(), "AuthorConnection!");
    }

    #[test]
    fn unknown_target_fails_the_build() {
        let rel = RelationshipConfig {
            name: "publisher".to_string(),
            target_entity: "Publisher".to_string(),
            cardinality: Cardinality::One,
            nullability_side: None,
        };
        let err =
            resolve_relationship_field(&book_object(false), &rel, &registry_with_author())
                .unwrap_err();
        assert_eq!(
            err,
            SchemaBuildError::UnknownTargetEntity {
                relationship: "publisher".to_string(),
                target: "Publisher".to_string(),
            }
        );
    }

    #[test]
    fn missing_foreign_key_is_a_hard_error() {
        let mut object = book_object(false);
        object.definition.relationship_metadata.clear();

        let err = resolve_relationship_field(
            &object,
            &relationship(Cardinality::One),
            &registry_with_author(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SchemaBuildError::MissingRelationshipMetadata { .. }
        ));
    }

    #[test]
    fn explicit_side_override_is_honored() {
        // Source carries the referenced side of the key: examine those
        // columns instead of the referencing ones.
        let mut rel = relationship(Cardinality::One);
        rel.nullability_side = Some(FkSide::Referenced);

        let mut object = book_object(true);
        // The referenced column list names `id`, which is non-nullable here.
        let resolved =
            resolve_relationship_field(&object, &rel, &registry_with_author()).unwrap();
        assert!(!resolved.nullable);

        // Flip the examined column's nullability and the inference follows.
        object.definition.columns[0] = column("id", true);
        let resolved =
            resolve_relationship_field(&object, &rel, &registry_with_author()).unwrap();
        assert!(resolved.nullable);
    }
}
