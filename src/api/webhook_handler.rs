//! Handler for LiveChat webhook deliveries.
//!
//! Chat-closing events are queued for the worker; everything else is
//! acknowledged without work.

use serde_json::{Value, json};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::helpers::{err_response, ok_json};
use super::{parsing, signature, sqs};
use crate::core::models::{ProcessingTask, WebhookPayload};
use crate::service::SummaryService;
use crate::worker::summarize::summarize_task;

const CHAT_CLOSING_ACTIONS: &[&str] = &["chat_deactivated", "chat_thread_closed"];

/// Whether `action` marks the end of a conversation.
#[must_use]
pub fn is_chat_closing(action: &str) -> bool {
    CHAT_CLOSING_ACTIONS.contains(&action)
}

pub async fn handle_livechat_webhook(
    service: &SummaryService,
    body: &str,
    headers: &Value,
) -> Value {
    let sig = parsing::get_header_value(headers, "X-LiveChat-Signature");
    let secret = service.config().livechat.webhook_secret.as_deref();
    if !signature::verify_livechat_signature(body.as_bytes(), sig, secret) {
        return err_response(401, "Invalid webhook signature");
    }

    let webhook: WebhookPayload = match serde_json::from_str(body) {
        Ok(w) => w,
        Err(e) => {
            error!("Invalid webhook payload: {}", e);
            return err_response(400, &format!("Invalid webhook payload: {e}"));
        }
    };

    let action = webhook.action.as_str();
    info!(action, webhook_id = webhook.webhook_id.as_deref().unwrap_or(""), "Received LiveChat webhook");

    match (action, webhook.chat_id()) {
        (a, Some(chat_id)) if is_chat_closing(a) => {
            let thread_id = parsing::v_str(&webhook.payload, &["chat", "thread", "id"])
                .or_else(|| parsing::v_str(&webhook.payload, &["thread_id"]))
                .map(ToString::to_string);
            let task = ProcessingTask {
                correlation_id: Uuid::new_v4().to_string(),
                chat_id: chat_id.to_string(),
                thread_id,
                action: a.to_string(),
            };

            if let Err(response) = dispatch(service, &task).await {
                return response;
            }

            ok_json(&json!({
                "status": "accepted",
                "message": format!("Processing chat {chat_id}"),
                "action": a,
            }))
        }
        ("incoming_chat", Some(_)) => ok_json(&json!({
            "status": "acknowledged",
            "message": "Chat started, waiting for completion",
            "action": action,
        })),
        _ => ok_json(&json!({
            "status": "acknowledged",
            "message": "Event received but not processed",
            "action": action,
        })),
    }
}

/// Hands the task to the worker queue, or runs it here when no queue is configured.
async fn dispatch(service: &SummaryService, task: &ProcessingTask) -> Result<(), Value> {
    match service.config().processing_queue_url.as_deref() {
        Some(queue_url) => {
            sqs::send_to_sqs(task, queue_url).await.map_err(|e| {
                error!(
                    "Failed to enqueue chat {}: {} (corr_id={})",
                    task.chat_id, e, task.correlation_id
                );
                err_response(500, "Failed to queue chat for processing")
            })?;
            info!(corr_id = %task.correlation_id, "Queued chat {} for processing", task.chat_id);
        }
        None => {
            warn!("PROCESSING_QUEUE_URL not set, processing chat {} inline", task.chat_id);
            if let Err(e) = summarize_task(service, task).await {
                error!(
                    "Inline processing failed for chat {}: {} (corr_id={})",
                    task.chat_id, e, task.correlation_id
                );
            }
        }
    }
    Ok(())
}

#[must_use]
pub fn webhook_health(service: &SummaryService) -> Value {
    let verification = service
        .config()
        .livechat
        .webhook_secret
        .as_deref()
        .is_some_and(|s| !s.is_empty());
    ok_json(&json!({
        "status": "healthy",
        "endpoint": "/webhooks/livechat",
        "signature_verification": verification,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_chat_closing() {
        assert!(is_chat_closing("chat_deactivated"));
        assert!(is_chat_closing("chat_thread_closed"));
        assert!(!is_chat_closing("incoming_chat"));
        assert!(!is_chat_closing("Chat_Deactivated"));
    }
}
