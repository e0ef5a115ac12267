use crate::core::models::ProcessingTask;
use crate::errors::SummaryError;
use aws_sdk_sqs::Client as SqsClient;

/// # Errors
///
/// Returns an error if serialization fails or the message cannot be sent to SQS.
pub async fn send_to_sqs(task: &ProcessingTask, queue_url: &str) -> Result<(), SummaryError> {
    let shared_config = aws_config::from_env().load().await;
    let client = SqsClient::new(&shared_config);
    let message_body = serde_json::to_string(task)
        .map_err(|e| SummaryError::ParseError(format!("Failed to serialize task: {e}")))?;

    client
        .send_message()
        .queue_url(queue_url)
        .message_body(message_body)
        .send()
        .await
        .map_err(|e| SummaryError::AwsError(format!("Failed to send message to SQS: {e}")))?;
    Ok(())
}
