//! Response builders shared by the API handlers.
//!
//! Every response is an API Gateway / Function URL proxy result:
//! `{"statusCode", "headers", "body"}` with a JSON string body.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;

/// Returns a response with the given status code and serializable body.
#[must_use]
pub fn json_response<T: Serialize>(status_code: u16, body: &T) -> Value {
    match serde_json::to_string(body) {
        Ok(body) => json!({
            "statusCode": status_code,
            "headers": { "Content-Type": "application/json" },
            "body": body
        }),
        Err(e) => {
            error!("Failed to serialize response body: {}", e);
            err_response(500, "Failed to serialize response")
        }
    }
}

/// Returns a 200 OK response with the given body.
#[must_use]
pub fn ok_json<T: Serialize>(body: &T) -> Value {
    json_response(200, body)
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json!({
        "statusCode": status_code,
        "headers": { "Content-Type": "application/json" },
        "body": json!({ "error": message }).to_string()
    })
}

/// Adds `Access-Control-Allow-Origin` from the configured origins.
///
/// A wildcard anywhere in the list wins; otherwise the origins are joined.
#[must_use]
pub fn with_cors(mut response: Value, origins: &[String]) -> Value {
    if origins.is_empty() {
        return response;
    }

    let allow = if origins.iter().any(|o| o == "*") {
        "*".to_string()
    } else {
        origins.join(",")
    };

    if let Some(obj) = response.as_object_mut() {
        let headers = obj.entry("headers").or_insert_with(|| json!({}));
        if let Some(map) = headers.as_object_mut() {
            map.insert("Access-Control-Allow-Origin".to_string(), Value::String(allow));
        }
    }
    response
}

/// Parses the JSON body back out of a response built here.
#[must_use]
pub fn response_body(response: &Value) -> Value {
    response
        .get("body")
        .and_then(Value::as_str)
        .and_then(|b| serde_json::from_str(b).ok())
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_err_response_shape() {
        let resp = err_response(404, "Not found");
        assert_eq!(resp["statusCode"], 404);
        assert_eq!(response_body(&resp)["error"], "Not found");
    }

    #[test]
    fn test_with_cors_wildcard_and_list() {
        let wildcard = with_cors(ok_json(&json!({})), &["https://a.example".into(), "*".into()]);
        assert_eq!(wildcard["headers"]["Access-Control-Allow-Origin"], "*");

        let listed = with_cors(
            ok_json(&json!({})),
            &["https://a.example".into(), "https://b.example".into()],
        );
        assert_eq!(
            listed["headers"]["Access-Control-Allow-Origin"],
            "https://a.example,https://b.example"
        );

        let none = with_cors(ok_json(&json!({})), &[]);
        assert!(none["headers"].get("Access-Control-Allow-Origin").is_none());
    }
}
