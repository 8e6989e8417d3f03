//! Entity-to-object-type conversion.
//!
//! `convert_entity` is deterministic and side-effect-free: the same metadata,
//! configuration, and role grants always produce the same object type. Any
//! failure aborts the conversion for that entity; no partial type is ever
//! emitted.

use async_graphql::dynamic::TypeRef;
use async_graphql::Value;
use std::collections::HashSet;

use super::entity_config::{EntityConfig, EntityPermissions, EntityRegistry};
use super::errors::SchemaBuildError;
use super::metadata::{ColumnDefinition, DatabaseObject};
use super::object_type::{
    DirectiveNode, FieldDefinition, ObjectTypeDefinition, DIRECTIVE_AUTHORIZE,
    DIRECTIVE_AUTOGENERATED, DIRECTIVE_DEFAULT_VALUE, DIRECTIVE_MODEL, DIRECTIVE_PRIMARY_KEY,
    DIRECTIVE_RELATIONSHIP,
};
use super::relationship_resolver::resolve_relationship_field;
use super::type_mapper::{encode_default, scalar_name};

/// Element type of the synthetic `result` field emitted for stored
/// procedures that declare no output columns.
const OPAQUE_RESULT_SCALAR: &str = "JSON";

/// Convert one configured entity into its GraphQL object-type definition.
///
/// Column fields come first, in the backing definition's column order, then
/// relationship fields in declaration order. A column appears only if at
/// least one role is granted on it (procedures bypass the per-field gate:
/// they expose at most one atomic action). The type's own name is the
/// configured singular display name when present, else the entity name.
pub fn convert_entity(
    entity_name: &str,
    object: &DatabaseObject,
    config: &EntityConfig,
    registry: &EntityRegistry,
    permissions: &EntityPermissions,
) -> Result<ObjectTypeDefinition, SchemaBuildError> {
    let type_name = config.graphql_type_name().to_string();
    let mut fields: Vec<FieldDefinition> = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    if object.is_procedure() && object.definition.columns.is_empty() {
        // A procedure with no declared output shape still returns rows; the
        // caller gets them as an untyped nullable list.
        fields.push(FieldDefinition::new(
            "result",
            TypeRef::named_list(OPAQUE_RESULT_SCALAR),
        ));
        seen_names.insert("result".to_string());
    } else {
        for column in &object.definition.columns {
            let included = object.is_procedure() || permissions.column_has_any_role(&column.name);
            if !included {
                if object.definition.is_primary_key(&column.name) {
                    return Err(SchemaBuildError::InaccessiblePrimaryKey {
                        entity: entity_name.to_string(),
                        column: column.name.clone(),
                    });
                }
                continue;
            }

            let exposed = config.exposed_column_name(&column.name).to_string();
            if !seen_names.insert(exposed.clone()) {
                return Err(SchemaBuildError::FieldNameCollision {
                    entity: entity_name.to_string(),
                    field: exposed,
                });
            }
            fields.push(column_field(object, config, column, exposed)?);
        }
    }

    for relationship in &config.relationships {
        let resolved = resolve_relationship_field(object, relationship, registry)?;
        if !seen_names.insert(relationship.name.clone()) {
            return Err(SchemaBuildError::FieldNameCollision {
                entity: entity_name.to_string(),
                field: relationship.name.clone(),
            });
        }
        fields.push(
            FieldDefinition::new(relationship.name.clone(), resolved.ty).directive(
                DirectiveNode::new(DIRECTIVE_RELATIONSHIP)
                    .argument("target", Value::String(resolved.target_type_name))
                    .argument(
                        "cardinality",
                        Value::String(relationship.cardinality.to_string()),
                    ),
            ),
        );
    }

    let mut directives = vec![DirectiveNode::new(DIRECTIVE_MODEL)
        .argument("name", Value::String(entity_name.to_string()))];
    if !permissions.entity_roles.is_empty() {
        let roles = permissions
            .entity_roles
            .iter()
            .map(|r| Value::String(r.clone()))
            .collect();
        directives.push(
            DirectiveNode::new(DIRECTIVE_AUTHORIZE).argument("roles", Value::List(roles)),
        );
    }

    Ok(ObjectTypeDefinition {
        name: type_name,
        fields,
        directives,
    })
}

fn column_field(
    object: &DatabaseObject,
    config: &EntityConfig,
    column: &ColumnDefinition,
    exposed: String,
) -> Result<FieldDefinition, SchemaBuildError> {
    let scalar = scalar_name(column.column_type);
    let ty = if column.nullable {
        TypeRef::named(scalar)
    } else {
        TypeRef::named_nn(scalar)
    };
    let mut field = FieldDefinition::new(exposed, ty);

    // Key, generation, and default markers describe relational storage;
    // a procedure invocation has none of them.
    if !object.is_procedure() {
        if object.definition.is_primary_key(&column.name) {
            field = field.directive(DirectiveNode::new(DIRECTIVE_PRIMARY_KEY));
        }
        if column.is_autogenerated {
            field = field.directive(DirectiveNode::new(DIRECTIVE_AUTOGENERATED));
        }
        if let Some(default) = &column.default_value {
            let literal = encode_default(&column.name, default)?;
            field = field.directive(
                DirectiveNode::new(DIRECTIVE_DEFAULT_VALUE).argument("value", literal),
            );
        }
    }

    // Aliased fields keep their physical column name discoverable.
    let alias_applied = config.exposed_column_name(&column.name) != column.name;
    if alias_applied {
        field = field.directive(
            DirectiveNode::new("column").argument("name", Value::String(column.name.clone())),
        );
    }

    Ok(field)
}

/// Convert every entity in the registry, in name order so the output is
/// stable across runs. Fails on the first broken entity.
pub fn convert_all(
    registry: &EntityRegistry,
) -> Result<Vec<ObjectTypeDefinition>, SchemaBuildError> {
    let mut entries: Vec<_> = registry.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let mut definitions = Vec::with_capacity(entries.len());
    for (name, record) in entries {
        let definition = convert_entity(
            name,
            &record.object,
            &record.config,
            registry,
            &record.permissions,
        )?;
        log::debug!("generated object type:\n{definition}");
        definitions.push(definition);
    }
    Ok(definitions)
}
