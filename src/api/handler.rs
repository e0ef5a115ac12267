//! API Lambda handler - thin router that delegates to specialized handlers.
//!
//! This module handles:
//! - Request decoding (method, path, base64 body, query string)
//! - Webhook deliveries (delegated to `webhook_handler`)
//! - Manual summarize, preview, and status routes (delegated to `summarize_handler`)

use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Value, json};
use tracing::{error, info};

use super::{helpers, parsing, summarize_handler, webhook_handler};
use crate::core::models::SummarizeRequest;
use crate::service::SummaryService;

pub use self::function_handler as handler;

/// Lambda handler for the API entrypoint.
///
/// # Errors
///
/// Never fails; every problem becomes an error response.
#[tracing::instrument(level = "info", skip(service, event))]
pub async fn function_handler(
    service: &SummaryService,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    Ok(handle_request(service, &event.payload).await)
}

/// Routes one proxy event and attaches CORS headers to the response.
pub async fn handle_request(service: &SummaryService, payload: &Value) -> Value {
    let response = route(service, payload).await;
    helpers::with_cors(response, &service.config().cors_origins)
}

async fn route(service: &SummaryService, payload: &Value) -> Value {
    let method = parsing::request_method(payload).to_ascii_uppercase();
    let path = parsing::request_path(payload).trim_end_matches('/');
    let path = if path.is_empty() { "/" } else { path };
    info!(method = %method, path = %path, "API request");

    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match (method.as_str(), segments.as_slice()) {
        ("GET", [""] | ["health"]) => summarize_handler::health(),
        ("GET", ["webhooks", "health"]) => webhook_handler::webhook_health(service),
        ("POST", ["webhooks", "livechat"]) => {
            let body = match parsing::extract_body(payload) {
                Ok(b) => b,
                Err(e) => return helpers::err_response(400, &e.to_string()),
            };
            let headers = payload.get("headers").cloned().unwrap_or_else(|| json!({}));
            webhook_handler::handle_livechat_webhook(service, &body, &headers).await
        }
        ("POST", ["api", "summarize"]) => {
            let body = match parsing::extract_body(payload) {
                Ok(b) => b,
                Err(e) => return helpers::err_response(400, &e.to_string()),
            };
            match serde_json::from_str::<SummarizeRequest>(&body) {
                Ok(request) => summarize_handler::handle_summarize(service, &request).await,
                Err(e) => {
                    error!("Invalid summarize request: {}", e);
                    helpers::err_response(400, &format!("Invalid request: {e}"))
                }
            }
        }
        ("GET", ["api", "summarize", chat_id]) if !chat_id.is_empty() => {
            let params = parsing::query_params(payload);
            let request = SummarizeRequest {
                chat_id: decode_segment(chat_id),
                thread_id: params.get("thread_id").cloned(),
                create_ticket: parsing::query_bool(&params, "create_ticket", true),
                send_to_crm: parsing::query_bool(&params, "send_to_crm", true),
            };
            summarize_handler::handle_summarize(service, &request).await
        }
        ("GET", ["api", "preview", chat_id]) if !chat_id.is_empty() => {
            let params = parsing::query_params(payload);
            summarize_handler::handle_preview(
                service,
                &decode_segment(chat_id),
                params.get("thread_id").map(String::as_str),
            )
            .await
        }
        ("GET", ["api", "status"]) => summarize_handler::handle_status(service),
        _ => helpers::err_response(404, &format!("Route not found: {method} {path}")),
    }
}

fn decode_segment(segment: &str) -> String {
    urlencoding::decode(segment).map_or_else(|_| segment.to_string(), |s| s.into_owned())
}
