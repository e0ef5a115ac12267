use base64::{Engine as _, engine::general_purpose};
use serde_json::Value;
use std::collections::HashMap;

use crate::core::config::parse_bool;
use crate::errors::SummaryError;

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path).and_then(|v| v.as_str())
}

pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}

/// HTTP method of a Function URL (payload v2) or REST API (v1) event.
#[must_use]
pub fn request_method(payload: &Value) -> &str {
    v_str(payload, &["requestContext", "http", "method"])
        .or_else(|| v_str(payload, &["httpMethod"]))
        .unwrap_or("GET")
}

#[must_use]
pub fn request_path(payload: &Value) -> &str {
    v_str(payload, &["rawPath"])
        .or_else(|| v_str(payload, &["path"]))
        .unwrap_or("/")
}

/// Query parameters from `rawQueryString`, else `queryStringParameters`.
#[must_use]
pub fn query_params(payload: &Value) -> HashMap<String, String> {
    if let Some(raw) = v_str(payload, &["rawQueryString"]).filter(|q| !q.is_empty()) {
        return url::form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect();
    }

    payload
        .get("queryStringParameters")
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Reads a boolean query flag; absent or unparseable values use `default`.
#[must_use]
pub fn query_bool(params: &HashMap<String, String>, key: &str, default: bool) -> bool {
    params
        .get(key)
        .and_then(|v| parse_bool(v))
        .unwrap_or(default)
}

/// Raw request body, base64-decoded when the event says so. A missing body is empty.
///
/// # Errors
///
/// Returns a parse error for a body that is not valid base64 or not UTF-8.
pub fn extract_body(payload: &Value) -> Result<String, SummaryError> {
    let body = payload.get("body").and_then(Value::as_str).unwrap_or("");
    let encoded = payload
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if !encoded {
        return Ok(body.to_string());
    }

    let bytes = general_purpose::STANDARD
        .decode(body)
        .map_err(|e| SummaryError::ParseError(format!("Invalid base64 body: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| SummaryError::ParseError(format!("Body is not valid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_and_path_from_either_payload_version() {
        let v2 = json!({ "rawPath": "/health", "requestContext": { "http": { "method": "POST" } } });
        assert_eq!(request_method(&v2), "POST");
        assert_eq!(request_path(&v2), "/health");

        let v1 = json!({ "path": "/api/status", "httpMethod": "GET" });
        assert_eq!(request_method(&v1), "GET");
        assert_eq!(request_path(&v1), "/api/status");
    }

    #[test]
    fn test_query_params_prefers_raw_query_string() {
        let payload = json!({
            "rawQueryString": "thread_id=T%201&create_ticket=false",
            "queryStringParameters": { "thread_id": "ignored" }
        });
        let params = query_params(&payload);
        assert_eq!(params.get("thread_id").map(String::as_str), Some("T 1"));
        assert!(!query_bool(&params, "create_ticket", true));
        assert!(query_bool(&params, "send_to_crm", true));
    }

    #[test]
    fn test_extract_body_decodes_base64() {
        let payload = json!({ "body": "eyJhIjoxfQ==", "isBase64Encoded": true });
        assert_eq!(extract_body(&payload).unwrap(), "{\"a\":1}");

        let bad = json!({ "body": "%%%", "isBase64Encoded": true });
        assert!(matches!(extract_body(&bad), Err(SummaryError::ParseError(_))));

        assert_eq!(extract_body(&json!({})).unwrap(), "");
    }

    #[test]
    fn test_get_header_value_case_insensitive() {
        let headers = json!({ "x-livechat-signature": "abc" });
        assert_eq!(get_header_value(&headers, "X-LiveChat-Signature"), Some("abc"));
    }
}
