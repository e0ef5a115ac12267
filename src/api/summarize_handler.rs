//! Manual summarization endpoints and service status.

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{error, info};

use super::helpers::{err_response, ok_json};
use crate::clients::CrmSink;
use crate::core::models::{HealthResponse, SummarizeRequest, SummarizeResponse};
use crate::service::SummaryService;
use crate::worker::deliver::{DeliveryOptions, MANUAL_TAG};

pub const NO_MESSAGES: &str = "No messages found in the chat";

#[must_use]
pub fn health() -> Value {
    ok_json(&HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Fetch, summarize, and deliver one chat on request.
pub async fn handle_summarize(service: &SummaryService, request: &SummarizeRequest) -> Value {
    let chat_id = request.chat_id.as_str();
    info!(chat_id, "Manual summarization requested");

    let transcript = match service.fetch(chat_id, request.thread_id.as_deref()).await {
        Ok(t) => t,
        Err(e) => {
            error!(chat_id, "Failed to fetch chat: {}", e);
            return err_response(404, &format!("Could not fetch chat {chat_id}: {e}"));
        }
    };

    if transcript.messages.is_empty() {
        return ok_json(&SummarizeResponse {
            success: false,
            chat_id: chat_id.to_string(),
            ticket_id: None,
            summary: None,
            crm_sent: false,
            message: Some(NO_MESSAGES.to_string()),
        });
    }

    let summary = match service.summarize(&transcript).await {
        Ok(s) => s,
        Err(e) => {
            error!(chat_id, "Summarization failed: {}", e);
            return err_response(500, &format!("Summarization failed: {e}"));
        }
    };

    let options = DeliveryOptions::new(request.create_ticket, request.send_to_crm, MANUAL_TAG);
    let delivery = service
        .deliver(chat_id, &transcript, &summary, &options)
        .await;

    ok_json(&SummarizeResponse {
        success: true,
        chat_id: chat_id.to_string(),
        ticket_id: delivery.ticket_id,
        summary: Some(summary),
        crm_sent: delivery.crm_sent,
        message: Some("Summarization completed successfully".to_string()),
    })
}

/// Summary only; nothing is delivered.
pub async fn handle_preview(
    service: &SummaryService,
    chat_id: &str,
    thread_id: Option<&str>,
) -> Value {
    let transcript = match service.fetch(chat_id, thread_id).await {
        Ok(t) => t,
        Err(e) => {
            error!(chat_id, "Preview fetch failed: {}", e);
            return err_response(500, &format!("Preview failed: {e}"));
        }
    };

    if transcript.messages.is_empty() {
        return ok_json(&json!({
            "success": false,
            "chat_id": chat_id,
            "message": "No messages found",
        }));
    }

    match service.summarize(&transcript).await {
        Ok(summary) => ok_json(&json!({
            "success": true,
            "chat_id": chat_id,
            "summary": summary,
            "message_count": transcript.messages.len(),
            "customer": transcript.customer_label(),
        })),
        Err(e) => {
            error!(chat_id, "Preview summarization failed: {}", e);
            err_response(500, &format!("Preview failed: {e}"))
        }
    }
}

#[must_use]
pub fn handle_status(service: &SummaryService) -> Value {
    let config = service.config();
    let crm_mode = if config.crm.use_webhook {
        "webhook"
    } else {
        "rest_api"
    };

    ok_json(&json!({
        "livechat": {
            "configured": !config.livechat.client_id.is_empty(),
            "api_url": config.livechat.api_url,
            "webhook_verification": config.livechat.webhook_secret.is_some(),
        },
        "openai": {
            "configured": !config.openai.api_key.is_empty(),
            "model": config.openai.model,
        },
        "crm": {
            "configured": service.crm().is_configured(),
            "mode": crm_mode,
            "auto_send": config.auto_send_to_crm,
        },
        "features": {
            "auto_create_ticket": config.auto_create_ticket,
            "auto_send_to_crm": config.auto_send_to_crm,
            "include_raw_transcript": config.crm.include_raw_transcript,
            "queue": config.processing_queue_url.is_some(),
        },
    }))
}
