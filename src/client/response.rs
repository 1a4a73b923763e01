//! Response body helpers.

use serde_json::{Map, Value};

const REDACTED_FIELDS: [&str; 2] = ["password", "hash"];

/// Read the `_id` string field of a JSON object body
///
/// Returns an empty string when the body is not a JSON object or has no
/// string `_id`; callers check the outcome separately.
#[must_use]
pub fn extract_remote_id(body: &str) -> String {
    serde_json::from_str::<Map<String, Value>>(body)
        .ok()
        .and_then(|object| match object.get("_id") {
            Some(Value::String(id)) => Some(id.clone()),
            _ => None,
        })
        .unwrap_or_default()
}

/// Mask credential fields of a JSON object body before it is logged
///
/// Bodies that are not JSON objects are returned unchanged.
#[must_use]
pub fn redact_secrets(body: &str) -> String {
    let Ok(mut object) = serde_json::from_str::<Map<String, Value>>(body) else {
        return body.to_string();
    };
    let mut redacted = false;
    for field in REDACTED_FIELDS {
        if let Some(value) = object.get_mut(field) {
            *value = Value::String("***".to_string());
            redacted = true;
        }
    }
    if redacted {
        Value::Object(object).to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_remote_id() {
        assert_eq!(
            extract_remote_id(r#"{"_id":"xyz","_version":1,"monitor":{"name":"m"}}"#),
            "xyz"
        );
    }

    #[test]
    fn test_extract_remote_id_missing_or_malformed() {
        assert_eq!(extract_remote_id(r#"{"status":"OK"}"#), "");
        assert_eq!(extract_remote_id(r#"{"_id":42}"#), "");
        assert_eq!(extract_remote_id("not json"), "");
        assert_eq!(extract_remote_id(r#"["_id"]"#), "");
        assert_eq!(extract_remote_id(""), "");
    }

    #[test]
    fn test_redact_secrets() {
        let redacted = redact_secrets(r#"{"password":"hunter2","backend_roles":["a"]}"#);
        assert!(!redacted.contains("hunter2"));
        assert!(redacted.contains("backend_roles"));

        let untouched = r#"{"cluster_permissions":[]}"#;
        assert_eq!(redact_secrets(untouched), untouched);
        assert_eq!(redact_secrets("plain text"), "plain text");
    }
}
