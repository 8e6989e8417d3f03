//! Argument binding: replaces `$name` placeholders in a SQL template with
//! escaped literal values.
//!
//! Values arrive as JSON (the wire form of GraphQL arguments). Strings are
//! escaped for ClickHouse string-literal rules, arrays render as ClickHouse
//! array literals, objects have no SQL form and are rejected.

use std::collections::HashMap;

use serde_json::Value;

use super::errors::ParameterBindingError;

/// ClickHouse string-literal escaping. Backslash replacement must run before
/// any escape sequence is introduced.
fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            _ => out.push(ch),
        }
    }
    out
}

fn literal(name: &str, value: &Value) -> Result<String, ParameterBindingError> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(true) => Ok("1".to_string()),
        Value::Bool(false) => Ok("0".to_string()),
        Value::String(s) => Ok(format!("'{}'", escape_string(s))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Ok(u.to_string())
            } else if let Some(f) = n.as_f64() {
                if f.is_finite() {
                    Ok(f.to_string())
                } else {
                    Err(ParameterBindingError::UnsupportedValue {
                        name: name.to_string(),
                        reason: format!("non-finite float `{f}`"),
                    })
                }
            } else {
                Err(ParameterBindingError::UnsupportedValue {
                    name: name.to_string(),
                    reason: "unrepresentable number".to_string(),
                })
            }
        }
        Value::Array(items) => {
            let rendered: Result<Vec<String>, ParameterBindingError> =
                items.iter().map(|item| literal(name, item)).collect();
            Ok(format!("[{}]", rendered?.join(", ")))
        }
        Value::Object(_) => Err(ParameterBindingError::UnsupportedValue {
            name: name.to_string(),
            reason: "objects cannot be bound as SQL literals".to_string(),
        }),
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Render a SQL template by substituting every `$name` placeholder with the
/// escaped literal of `arguments[name]`.
///
/// A placeholder without a supplied value is an error; supplied values
/// without a placeholder are ignored (templates bind only what they use).
/// A `$` not followed by a name character passes through untouched.
pub fn bind_parameters(
    template: &str,
    arguments: &HashMap<String, Value>,
) -> Result<String, ParameterBindingError> {
    let mut out = String::with_capacity(template.len() * 2);
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            out.push(ch);
            continue;
        }

        let mut name = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_alphanumeric() || next == '_' {
                name.push(next);
                chars.next();
            } else {
                break;
            }
        }

        if name.is_empty() {
            out.push('$');
            continue;
        }
        if !valid_name(&name) {
            return Err(ParameterBindingError::InvalidParameterName(name));
        }
        let value = arguments
            .get(&name)
            .ok_or_else(|| ParameterBindingError::MissingParameter(name.clone()))?;
        out.push_str(&literal(&name, value)?);
    }

    Ok(out)
}
