use tracing::{info, instrument, warn};

use super::deliver::{AUTO_TAG, DeliveryOptions};
use crate::core::models::ProcessingTask;
use crate::errors::SummaryError;
use crate::service::{ChatOutcome, SummaryService};

/// Runs a queued task through the pipeline using the automatic delivery flags.
#[instrument(level = "info", skip(service, task), fields(corr_id = %task.correlation_id, chat_id = %task.chat_id, action = %task.action))]
pub async fn summarize_task(
    service: &SummaryService,
    task: &ProcessingTask,
) -> Result<ChatOutcome, SummaryError> {
    let config = service.config();
    let options = DeliveryOptions::new(
        config.auto_create_ticket,
        config.auto_send_to_crm,
        AUTO_TAG,
    );

    let outcome = service
        .process_chat(&task.chat_id, task.thread_id.as_deref(), &options)
        .await?;

    match &outcome {
        ChatOutcome::NoMessages => {
            warn!("No messages found in chat {}", task.chat_id);
        }
        ChatOutcome::Processed { delivery, .. } => {
            info!(
                ticket_id = delivery.ticket_id.as_deref().unwrap_or("none"),
                crm_sent = delivery.crm_sent,
                "Processed chat {}",
                task.chat_id
            );
        }
    }

    Ok(outcome)
}
