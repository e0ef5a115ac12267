use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

use super::summarize;
use crate::core::models::ProcessingTask;
use crate::errors::SummaryError;
use crate::service::SummaryService;

/// Per-batch counters, logged once the batch is done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
}

/// Extracts every `Records[].body` of an SQS event as a task. Records that
/// cannot be parsed come back as errors in their original position.
#[must_use]
pub fn parse_tasks(payload: &Value) -> Vec<Result<ProcessingTask, SummaryError>> {
    payload
        .get("Records")
        .and_then(Value::as_array)
        .map(|records| {
            records
                .iter()
                .map(|record| {
                    let body = record
                        .get("body")
                        .and_then(Value::as_str)
                        .ok_or_else(|| {
                            SummaryError::ParseError("SQS record has no body".to_string())
                        })?;
                    serde_json::from_str::<ProcessingTask>(body).map_err(|e| {
                        SummaryError::ParseError(format!(
                            "Failed to parse SQS message body into ProcessingTask: {e}"
                        ))
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Processes every record in the batch. One failing record never stops the rest.
pub async fn process_batch(service: &SummaryService, payload: &Value) -> BatchReport {
    let mut report = BatchReport::default();

    for parsed in parse_tasks(payload) {
        let task = match parsed {
            Ok(task) => task,
            Err(e) => {
                error!("Skipping SQS record: {}", e);
                report.failed += 1;
                continue;
            }
        };

        match summarize::summarize_task(service, &task).await {
            Ok(_) => report.processed += 1,
            Err(e) => {
                error!(
                    "Failed to process chat {}: {} (corr_id={})",
                    task.chat_id, e, task.correlation_id
                );
                report.failed += 1;
            }
        }
    }

    report
}

/// Lambda handler for the Worker entrypoint.
pub async fn function_handler(
    service: &SummaryService,
    event: LambdaEvent<Value>,
) -> Result<(), Error> {
    let report = process_batch(service, &event.payload).await;
    info!(
        processed = report.processed,
        failed = report.failed,
        "Worker batch complete"
    );
    Ok(())
}

pub use self::function_handler as handler;
