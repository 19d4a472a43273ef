//! Argument parsing helpers for tool implementations.
//!
//! Providers send arguments as raw JSON text. An empty string means "no
//! arguments" and parses to an empty object.
//!
//! ```rust
//! use ptooling::{parse_arguments, required_string};
//!
//! let args = parse_arguments(r#"{"query":"rust"}"#).expect("object should parse");
//! let query = required_string(&args, "query").expect("query should be present");
//! assert_eq!(query, "rust");
//!
//! assert!(parse_arguments("  ").expect("blank is allowed").is_empty());
//! ```

use serde_json::{Map, Value};

use crate::ToolError;

pub fn parse_arguments(args_text: &str) -> Result<Map<String, Value>, ToolError> {
    if args_text.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str::<Value>(args_text)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ToolError::invalid_arguments(format!(
            "expected JSON object arguments, got {}",
            json_type_name(&other)
        ))),
    }
}

pub fn required_string(args: &Map<String, Value>, key: &str) -> Result<String, ToolError> {
    optional_string(args, key)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required string: '{key}'")))
}

pub fn optional_string(args: &Map<String, Value>, key: &str) -> Option<String> {
    args.get(key).and_then(Value::as_str).map(ToString::to_string)
}

pub fn required_i64(args: &Map<String, Value>, key: &str) -> Result<i64, ToolError> {
    args.get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| ToolError::invalid_arguments(format!("missing required integer: '{key}'")))
}

pub fn optional_bool(args: &Map<String, Value>, key: &str) -> Option<bool> {
    args.get(key).and_then(Value::as_bool)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
