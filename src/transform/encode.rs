//! Cell encoding
//!
//! Nested lists and maps are stored in a single CSV column as compact JSON,
//! which parses back to the same value.

use crate::error::{Error, Result};
use crate::types::JsonValue;

/// Encode a nested value as one text cell
pub fn encode_nested(value: &JsonValue) -> Result<String> {
    serde_json::to_string(value).map_err(Error::from)
}

/// Decode a cell produced by [`encode_nested`]
pub fn decode_nested(text: &str) -> Result<JsonValue> {
    serde_json::from_str(text).map_err(Error::from)
}

/// Render any value as cell text
///
/// Scalars are written verbatim, nested values through [`encode_nested`].
pub fn render_cell(value: &JsonValue) -> Result<String> {
    match value {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        JsonValue::Null => Ok(String::new()),
        JsonValue::Array(_) | JsonValue::Object(_) => encode_nested(value),
    }
}
