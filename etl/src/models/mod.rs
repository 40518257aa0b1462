use serde_json::{Map, Value};

/// One brewery object exactly as the upstream API returned it.
///
/// Kept as a generic key/value map so upstream schema drift (new, missing or
/// retyped fields) never breaks extraction.
pub type Record = Map<String, Value>;

/// Reads a field as text the way the silver layer stores it.
pub fn field_as_str<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}
