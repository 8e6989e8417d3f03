//! Request-time error types.
//!
//! `ResolverNotFound` signals a startup-ordering or wiring bug and is always
//! surfaced as a server-side failure; argument-binding problems are the only
//! variants attributable to caller input. Empty results are not errors
//! anywhere in this module.

use thiserror::Error;

/// Binding a caller-supplied argument into SQL failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParameterBindingError {
    #[error("missing required parameter `{0}`")]
    MissingParameter(String),

    #[error("invalid parameter name `{0}` (alphanumeric and underscore only)")]
    InvalidParameterName(String),

    #[error("parameter `{name}` has no SQL literal form: {reason}")]
    UnsupportedValue { name: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Internal inconsistency: the operation was never registered. Never a
    /// caller error.
    #[error("no resolver registered for operation `{0}`")]
    ResolverNotFound(String),

    #[error(transparent)]
    Binding(#[from] ParameterBindingError),

    #[error("invalid pagination cursor: {0}")]
    InvalidCursor(String),

    #[error("backend query failed: {0}")]
    Backend(#[from] clickhouse::error::Error),

    #[error("failed reading the result cursor: {0}")]
    CursorRead(#[from] std::io::Error),

    /// The backend's pre-shaped payload was not the JSON form this operation
    /// expects (object for single fetches, array for list fetches).
    #[error("result payload does not match the expected {expected} shape: {detail}")]
    ResultShapeMismatch {
        expected: &'static str,
        detail: String,
    },
}

impl ExecutionError {
    /// Whether the failure is attributable to caller input rather than the
    /// server or backend.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            ExecutionError::Binding(_) | ExecutionError::InvalidCursor(_)
        )
    }
}
