//! Offset-cursor pagination for list fetches.
//!
//! Cursors are opaque base64 strings over an offset; continuation requests
//! decode the cursor, over-fetch by one row, and report whether another page
//! exists.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Serialize;
use serde_json::Value;

use super::errors::ExecutionError;

/// Default page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: i64 = 25;
/// Hard cap on requested page sizes.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A page of list results plus continuation metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPayload {
    pub items: Vec<Value>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

impl ConnectionPayload {
    /// Build a page from rows fetched with `limit + 1`: the extra row only
    /// signals that another page exists and is not returned.
    pub fn from_overfetched(mut items: Vec<Value>, offset: i64, limit: i64) -> Self {
        let has_next_page = items.len() as i64 > limit;
        if has_next_page {
            items.truncate(limit as usize);
        }
        let end_cursor = if items.is_empty() {
            None
        } else {
            Some(encode_cursor(offset + items.len() as i64 - 1))
        };
        ConnectionPayload {
            items,
            has_next_page,
            end_cursor,
        }
    }
}

pub fn encode_cursor(offset: i64) -> String {
    BASE64.encode(format!("offset:{offset}"))
}

pub fn decode_cursor(cursor: &str) -> Result<i64, ExecutionError> {
    let bytes = BASE64
        .decode(cursor)
        .map_err(|_| ExecutionError::InvalidCursor("not base64".to_string()))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| ExecutionError::InvalidCursor("not UTF-8".to_string()))?;
    let offset = text
        .strip_prefix("offset:")
        .ok_or_else(|| ExecutionError::InvalidCursor("unexpected prefix".to_string()))?;
    offset
        .parse()
        .map_err(|_| ExecutionError::InvalidCursor("not a number".to_string()))
}

/// Resolve `first`/`after` arguments into an `(offset, limit)` window.
pub fn resolve_page_window(
    first: Option<i64>,
    after: Option<&str>,
) -> Result<(i64, i64), ExecutionError> {
    let limit = first.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = match after {
        Some(cursor) => decode_cursor(cursor)? + 1,
        None => 0,
    };
    Ok((offset, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cursor_round_trip() {
        for offset in [0, 1, 24, 99_999] {
            assert_eq!(decode_cursor(&encode_cursor(offset)).unwrap(), offset);
        }
    }

    #[test]
    fn malformed_cursors_are_rejected() {
        assert!(decode_cursor("not-base64!").is_err());
        assert!(decode_cursor(&BASE64.encode("garbage:7")).is_err());
    }

    #[test]
    fn window_defaults_and_caps() {
        assert_eq!(resolve_page_window(None, None).unwrap(), (0, 25));
        assert_eq!(resolve_page_window(Some(10), None).unwrap(), (0, 10));
        assert_eq!(resolve_page_window(Some(10_000), None).unwrap(), (0, 100));

        let cursor = encode_cursor(24);
        assert_eq!(
            resolve_page_window(Some(25), Some(&cursor)).unwrap(),
            (25, 25)
        );
    }

    #[test]
    fn overfetched_page_trims_and_flags_continuation() {
        let items = vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 3})];
        let page = ConnectionPayload::from_overfetched(items, 0, 2);

        assert_eq!(page.items.len(), 2);
        assert!(page.has_next_page);
        assert_eq!(decode_cursor(page.end_cursor.as_deref().unwrap()).unwrap(), 1);
    }

    #[test]
    fn final_page_has_no_continuation() {
        let items = vec![json!({"id": 1})];
        let page = ConnectionPayload::from_overfetched(items, 4, 2);

        assert_eq!(page.items.len(), 1);
        assert!(!page.has_next_page);
        assert_eq!(decode_cursor(page.end_cursor.as_deref().unwrap()).unwrap(), 4);
    }

    #[test]
    fn empty_page_has_no_cursor() {
        let page = ConnectionPayload::from_overfetched(vec![], 0, 2);
        assert!(page.items.is_empty());
        assert!(!page.has_next_page);
        assert!(page.end_cursor.is_none());
    }
}
