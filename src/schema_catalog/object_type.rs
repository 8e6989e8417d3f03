//! Generated GraphQL object-type definitions.
//!
//! These are plain data records consumed by an external schema assembler:
//! a type name, ordered field definitions, and directive annotations carrying
//! the model/authorization/column metadata. `TypeRef` and `Value` come from
//! async-graphql so type references and literals speak the ecosystem's
//! vocabulary.

use std::fmt;

use async_graphql::dynamic::indexmap::IndexMap;
use async_graphql::dynamic::TypeRef;
use async_graphql::{Name, Value};
use serde_json::json;

/// Marks a generated type as backed by a configured entity.
pub const DIRECTIVE_MODEL: &str = "model";
/// Carries the role set granted at entity or field level.
pub const DIRECTIVE_AUTHORIZE: &str = "authorize";
/// Marks a field as part of the backing primary key.
pub const DIRECTIVE_PRIMARY_KEY: &str = "primaryKey";
/// Marks a field whose value the backend generates.
pub const DIRECTIVE_AUTOGENERATED: &str = "autoGenerated";
/// Carries a field's literal default.
pub const DIRECTIVE_DEFAULT_VALUE: &str = "defaultValue";
/// Carries relationship target and cardinality on graph fields.
pub const DIRECTIVE_RELATIONSHIP: &str = "relationship";

/// A directive annotation: name plus named literal arguments.
#[derive(Debug, Clone)]
pub struct DirectiveNode {
    pub name: String,
    pub arguments: IndexMap<Name, Value>,
}

impl DirectiveNode {
    pub fn new(name: impl Into<String>) -> Self {
        DirectiveNode {
            name: name.into(),
            arguments: IndexMap::new(),
        }
    }

    pub fn argument(mut self, key: &str, value: Value) -> Self {
        self.arguments.insert(Name::new(key), value);
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        let arguments: serde_json::Map<String, serde_json::Value> = self
            .arguments
            .iter()
            .map(|(k, v)| {
                let value = v.clone().into_json().unwrap_or(serde_json::Value::Null);
                (k.to_string(), value)
            })
            .collect();
        json!({ "name": self.name, "arguments": arguments })
    }
}

impl fmt::Display for DirectiveNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.arguments.is_empty() {
            let args: Vec<String> = self
                .arguments
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect();
            write!(f, "({})", args.join(", "))?;
        }
        Ok(())
    }
}

/// One field of a generated object type.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Exposed name (column alias or relationship name).
    pub name: String,
    pub ty: TypeRef,
    pub directives: Vec<DirectiveNode>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        FieldDefinition {
            name: name.into(),
            ty,
            directives: Vec::new(),
        }
    }

    pub fn directive(mut self, directive: DirectiveNode) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn is_nullable(&self) -> bool {
        !matches!(self.ty, TypeRef::NonNull(_))
    }

    pub fn has_directive(&self, name: &str) -> bool {
        self.directives.iter().any(|d| d.name == name)
    }

    pub fn find_directive(&self, name: &str) -> Option<&DirectiveNode> {
        self.directives.iter().find(|d| d.name == name)
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "type": self.ty.to_string(),
            "nullable": self.is_nullable(),
            "directives": self.directives.iter().map(DirectiveNode::to_json).collect::<Vec<_>>(),
        })
    }
}

/// A complete generated object type for one entity. Built once at startup
/// and treated as read-only afterwards.
#[derive(Debug, Clone)]
pub struct ObjectTypeDefinition {
    pub name: String,
    /// Column-derived fields first (in backing column order), then
    /// relationship fields (in declaration order).
    pub fields: Vec<FieldDefinition>,
    pub directives: Vec<DirectiveNode>,
}

impl ObjectTypeDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_directive(&self, name: &str) -> bool {
        self.directives.iter().any(|d| d.name == name)
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "name": self.name,
            "directives": self.directives.iter().map(DirectiveNode::to_json).collect::<Vec<_>>(),
            "fields": self.fields.iter().map(FieldDefinition::to_json).collect::<Vec<_>>(),
        })
    }
}

/// SDL-like rendering, for logs and debugging only.
impl fmt::Display for ObjectTypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type {}", self.name)?;
        for directive in &self.directives {
            write!(f, " {directive}")?;
        }
        writeln!(f, " {{")?;
        for field in &self.fields {
            write!(f, "  {}: {}", field.name, field.ty)?;
            for directive in &field.directives {
                write!(f, " {directive}")?;
            }
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nullability_follows_the_type_wrapper() {
        let nullable = FieldDefinition::new("pages", TypeRef::named("Int"));
        let required = FieldDefinition::new("id", TypeRef::named_nn("Int"));
        assert!(nullable.is_nullable());
        assert!(!required.is_nullable());
    }

    #[test]
    fn display_renders_sdl_like_output() {
        let def = ObjectTypeDefinition {
            name: "Book".to_string(),
            fields: vec![
                FieldDefinition::new("id", TypeRef::named_nn("Int"))
                    .directive(DirectiveNode::new(DIRECTIVE_PRIMARY_KEY)),
                FieldDefinition::new("title", TypeRef::named_nn("String")),
            ],
            directives: vec![DirectiveNode::new(DIRECTIVE_MODEL)
                .argument("name", Value::String("Book".to_string()))],
        };

        let rendered = def.to_string();
        assert!(rendered.contains("type Book @model(name: \"Book\")"));
        assert!(rendered.contains("id: Int! @primaryKey"));
        assert!(rendered.contains("title: String!"));
    }

    #[test]
    fn json_form_carries_directive_arguments() {
        let def = FieldDefinition::new("author_id", TypeRef::named("Int")).directive(
            DirectiveNode::new(DIRECTIVE_DEFAULT_VALUE)
                .argument("value", Value::Number(7.into())),
        );
        let as_json = def.to_json();
        assert_eq!(as_json["type"], "Int");
        assert_eq!(as_json["nullable"], true);
        assert_eq!(as_json["directives"][0]["arguments"]["value"], 7);
    }
}
