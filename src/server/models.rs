//! Request and response bodies for the HTTP surface.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /operation`: a named operation with its arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationRequest {
    pub operation: String,
    #[serde(default)]
    pub arguments: HashMap<String, Value>,
    /// Marks a continuation/pagination request; list results come back
    /// wrapped in a connection envelope.
    #[serde(default)]
    pub paginated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorResponse {
            error: message.into(),
        }
    }
}
