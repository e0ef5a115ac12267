#![recursion_limit = "256"]

use anyhow::Context;
use lambda_runtime::{LambdaEvent, service_fn};
use livechat_summarizer::api::handler;
use livechat_summarizer::core::config::AppConfig;
use livechat_summarizer::service::SummaryService;
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    livechat_summarizer::setup_logging();

    let config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;
    let service = SummaryService::from_config(config);
    let service = &service;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handler(service, event).await
    }))
    .await
}
