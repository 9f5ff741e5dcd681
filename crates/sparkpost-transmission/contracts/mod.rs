//! SparkPost Transmission Contracts
//!
//! Wire shapes for the transmissions endpoint: the outgoing request payload
//! and the two reply shapes the API produces (200 success, 400 failure).
//!
//! Request-side unions (`Recipient`, `Content`) are decided per value by field
//! presence and are modeled as explicit enum variants. Reply shapes keep any
//! field the API adds in a flattened side map so newer API versions still
//! coerce.

mod responses;
mod transmission;

pub use responses::*;
pub use transmission::*;

use serde_json::Value;

/// Free-form JSON object used for metadata and substitution data
pub type JsonObject = serde_json::Map<String, Value>;

/// Short human name for a JSON value's type, used in coercion diagnostics
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// True when `key` is present on the object and not `null`
pub(crate) fn has_non_null(object: &JsonObject, key: &str) -> bool {
    object.get(key).map_or(false, |v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&json!(null)), "null");
        assert_eq!(json_kind(&json!(1)), "number");
        assert_eq!(json_kind(&json!("x")), "string");
        assert_eq!(json_kind(&json!([1])), "array");
        assert_eq!(json_kind(&json!({})), "object");
    }

    #[test]
    fn test_has_non_null() {
        let object = json!({"address": null, "subject": "hi"});
        let object = object.as_object().unwrap();
        assert!(!has_non_null(object, "address"));
        assert!(has_non_null(object, "subject"));
        assert!(!has_non_null(object, "missing"));
    }
}
