// This is the Lambda bootstrap entry point for the Worker function

use anyhow::Context;
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use livechat_summarizer::core::config::AppConfig;
use livechat_summarizer::service::SummaryService;
use livechat_summarizer::worker::handler;
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    livechat_summarizer::setup_logging();

    let config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;
    let service = SummaryService::from_config(config);
    let service = &service;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        handler(service, event).await
    }))
    .await
}
