//! Lenient response decoding
//!
//! The proxy's responses are read field by field. A missing body, a body
//! that is not an object, a missing field, or a field of the wrong JSON type
//! all fall back to the caller's default instead of failing. This masks
//! malformed responses at the call site; callers that need strict checking
//! should use [`KachyClient::raw_command`](super::KachyClient::raw_command)
//! and inspect the value themselves.

use serde_json::Value;

fn field<'a>(body: Option<&'a Value>, name: &str) -> Option<&'a Value> {
    body?.as_object()?.get(name)
}

pub(crate) fn bool_or(body: Option<&Value>, name: &str, default: bool) -> bool {
    field(body, name).and_then(Value::as_bool).unwrap_or(default)
}

pub(crate) fn i64_or(body: Option<&Value>, name: &str, default: i64) -> i64 {
    field(body, name).and_then(Value::as_i64).unwrap_or(default)
}

/// Strings are returned as-is; other non-null scalars as their JSON text.
pub(crate) fn string(body: Option<&Value>, name: &str) -> Option<String> {
    match field(body, name)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub(crate) fn value(body: Option<&Value>, name: &str) -> Value {
    field(body, name).cloned().unwrap_or(Value::Null)
}

pub(crate) fn array(body: Option<&Value>, name: &str) -> Vec<Value> {
    field(body, name).and_then(Value::as_array).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_present_fields() {
        let body = json!({"success": true, "ttl": 42, "value": "v", "results": [1, "OK"]});
        assert!(bool_or(Some(&body), "success", false));
        assert_eq!(i64_or(Some(&body), "ttl", -2), 42);
        assert_eq!(string(Some(&body), "value"), Some("v".to_string()));
        assert_eq!(array(Some(&body), "results"), vec![json!(1), json!("OK")]);
    }

    #[test]
    fn test_missing_body_uses_defaults() {
        assert!(!bool_or(None, "success", false));
        assert_eq!(i64_or(None, "ttl", -2), -2);
        assert_eq!(string(None, "value"), None);
        assert_eq!(value(None, "result"), Value::Null);
        assert!(array(None, "results").is_empty());
    }

    #[test]
    fn test_wrong_shapes_use_defaults() {
        let not_object = json!(["success"]);
        assert!(!bool_or(Some(&not_object), "success", false));

        let wrong_types = json!({"success": "yes", "ttl": "soon", "results": {"a": 1}});
        assert!(!bool_or(Some(&wrong_types), "success", false));
        assert_eq!(i64_or(Some(&wrong_types), "ttl", -2), -2);
        assert!(array(Some(&wrong_types), "results").is_empty());
    }

    #[test]
    fn test_string_rendering() {
        let body = json!({"a": null, "b": 7, "c": false});
        assert_eq!(string(Some(&body), "a"), None);
        assert_eq!(string(Some(&body), "b"), Some("7".to_string()));
        assert_eq!(string(Some(&body), "c"), Some("false".to_string()));
    }
}
