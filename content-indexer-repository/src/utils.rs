//! Utility functions for the content indexer repository.

use serde_json::Value;

/// Extract a human-readable message from an engine error body.
///
/// Understands `{"error": {"msg": ...}}`, OpenSearch's
/// `{"error": {"reason": ...}}` (preferring the root cause), and
/// `{"error": "..."}`. Anything else is returned as the raw body.
///
/// # Example
///
/// ```
/// use content_indexer_repository::extract_error_message;
///
/// let body = r#"{"error": {"msg": "unknown field 'foo'"}, "status": 400}"#;
/// assert_eq!(extract_error_message(body), "unknown field 'foo'");
/// ```
pub fn extract_error_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    match parsed.get("error") {
        Some(Value::String(message)) => message.clone(),
        Some(error @ Value::Object(_)) => {
            if let Some(message) = error.get("msg").and_then(Value::as_str) {
                return message.to_string();
            }
            let root_cause = error
                .get("root_cause")
                .and_then(Value::as_array)
                .and_then(|causes| causes.first())
                .and_then(|cause| cause.get("reason"))
                .and_then(Value::as_str);
            root_cause
                .or_else(|| error.get("reason").and_then(Value::as_str))
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string())
        }
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_msg() {
        let body = r#"{"error": {"msg": "Document is missing mandatory uniqueKey field: id", "code": 400}}"#;
        assert_eq!(
            extract_error_message(body),
            "Document is missing mandatory uniqueKey field: id"
        );
    }

    #[test]
    fn test_extract_opensearch_root_cause() {
        let body = r#"{
            "error": {
                "root_cause": [{"type": "mapper_parsing_exception", "reason": "failed to parse field [uid]"}],
                "type": "mapper_parsing_exception",
                "reason": "outer reason"
            },
            "status": 400
        }"#;
        assert_eq!(extract_error_message(body), "failed to parse field [uid]");
    }

    #[test]
    fn test_extract_reason_without_root_cause() {
        let body = r#"{"error": {"type": "index_not_found_exception", "reason": "no such index [core_en]"}}"#;
        assert_eq!(extract_error_message(body), "no such index [core_en]");
    }

    #[test]
    fn test_extract_string_error_and_plain_text() {
        assert_eq!(extract_error_message(r#"{"error": "boom"}"#), "boom");
        assert_eq!(extract_error_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(extract_error_message(r#"{"status": 500}"#), r#"{"status": 500}"#);
    }
}
