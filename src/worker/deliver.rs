use tracing::{error, info, warn};

use crate::clients::{CrmSink, TicketSink};
use crate::core::models::{ChatTranscript, SummaryResult, TicketRequest};

/// Tag attached to tickets opened from the webhook/worker path.
pub const AUTO_TAG: &str = "auto-summarized";
/// Tag attached to tickets opened from the manual summarize endpoints.
pub const MANUAL_TAG: &str = "manual-summary";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOptions {
    pub create_ticket: bool,
    pub send_to_crm: bool,
    pub tag: String,
}

impl DeliveryOptions {
    #[must_use]
    pub fn new(create_ticket: bool, send_to_crm: bool, tag: &str) -> Self {
        Self {
            create_ticket,
            send_to_crm,
            tag: tag.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub ticket_id: Option<String>,
    pub crm_sent: bool,
}

/// Ticket id used for the CRM when no ticket was created.
#[must_use]
pub fn fallback_ticket_id(chat_id: &str) -> String {
    let prefix: String = chat_id.chars().take(8).collect();
    format!("LC-{prefix}")
}

#[must_use]
pub fn ticket_request(
    chat_id: &str,
    transcript: &ChatTranscript,
    summary: &SummaryResult,
    tag: &str,
) -> TicketRequest {
    TicketRequest {
        chat_id: chat_id.to_string(),
        subject: summary.ticket_subject(),
        message: summary.summary.clone(),
        requester_email: transcript.customer_email.clone(),
        requester_name: transcript.customer_name.clone(),
        tags: vec![tag.to_string()],
    }
}

/// Opens a ticket and forwards to the CRM as requested. Either side may
/// fail without affecting the other; failures are logged and reflected in
/// the outcome.
pub async fn deliver_summary(
    tickets: &dyn TicketSink,
    crm: &dyn CrmSink,
    chat_id: &str,
    transcript: &ChatTranscript,
    summary: &SummaryResult,
    options: &DeliveryOptions,
) -> DeliveryOutcome {
    let mut outcome = DeliveryOutcome::default();

    if options.create_ticket {
        let request = ticket_request(chat_id, transcript, summary, &options.tag);
        match tickets.create_ticket(&request).await {
            Ok(Some(id)) => {
                info!(chat_id, ticket_id = %id, "Created ticket");
                outcome.ticket_id = Some(id);
            }
            Ok(None) => {
                warn!(chat_id, "Ticket created but no id was returned");
            }
            Err(e) => {
                error!(chat_id, "Failed to create ticket: {}", e);
            }
        }
    }

    if options.send_to_crm {
        if crm.is_configured() {
            let ticket_id = outcome
                .ticket_id
                .clone()
                .unwrap_or_else(|| fallback_ticket_id(chat_id));
            let payload = crm.build_payload(&ticket_id, chat_id, summary, Some(transcript));
            match crm.send(&payload).await {
                Ok(_) => {
                    info!(chat_id, ticket_id = %ticket_id, "Sent summary to CRM");
                    outcome.crm_sent = true;
                }
                Err(e) => {
                    error!(chat_id, "Failed to send to CRM: {}", e);
                }
            }
        } else {
            info!(chat_id, "CRM not configured, skipping");
        }
    }

    outcome
}
