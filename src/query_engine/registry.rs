//! Resolver registry: named operation -> parameterized SQL template.
//!
//! Populated during the single-writer startup phase, read-only afterwards.
//! `register` is deliberately inert once a name exists so that multiple
//! startup code paths can re-run registration without clobbering anything;
//! after startup the hot path only ever calls `lookup`.

use std::collections::HashMap;
use std::sync::RwLock;

use super::errors::ExecutionError;

/// Whether an operation's execution expects a single row or an aggregated
/// list payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    Single,
    List,
}

/// One registered operation: its SQL template (with `$name` placeholders)
/// and the shape its result is read with.
#[derive(Debug, Clone)]
pub struct QueryResolver {
    pub operation: String,
    pub sql_template: String,
    pub shape: ResultShape,
}

impl QueryResolver {
    pub fn new(operation: impl Into<String>, sql_template: impl Into<String>, shape: ResultShape) -> Self {
        QueryResolver {
            operation: operation.into(),
            sql_template: sql_template.into(),
            shape,
        }
    }
}

#[derive(Debug, Default)]
pub struct ResolverRegistry {
    resolvers: RwLock<HashMap<String, QueryResolver>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver. A second registration under the same name is a
    /// no-op: registration has already completed and repeat calls from other
    /// startup paths must be inert.
    pub fn register(&self, resolver: QueryResolver) {
        let mut resolvers = self
            .resolvers
            .write()
            .expect("resolver registry lock poisoned");
        if resolvers.contains_key(&resolver.operation) {
            log::debug!(
                "resolver `{}` already registered, keeping the existing template",
                resolver.operation
            );
            return;
        }
        resolvers.insert(resolver.operation.clone(), resolver);
    }

    /// Look up a registered operation. A miss is an internal inconsistency
    /// (the startup path registers everything it serves), never caller input.
    pub fn lookup(&self, operation: &str) -> Result<QueryResolver, ExecutionError> {
        self.resolvers
            .read()
            .expect("resolver registry lock poisoned")
            .get(operation)
            .cloned()
            .ok_or_else(|| ExecutionError::ResolverNotFound(operation.to_string()))
    }

    pub fn len(&self) -> usize {
        self.resolvers
            .read()
            .expect("resolver registry lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn operation_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .resolvers
            .read()
            .expect("resolver registry lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}
