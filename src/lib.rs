/// LiveChat Summarizer - turns finished LiveChat conversations into structured
/// summaries, support tickets, and CRM records.
///
/// This crate implements a two-Lambda architecture:
/// 1. An API Lambda that verifies LiveChat webhooks and serves the manual
///    summarize/preview/status routes, queueing closed chats for processing
/// 2. A Worker Lambda that fetches queued chats, filters the transcript,
///    summarizes it with an LLM, and delivers the result
///
/// # Architecture
///
/// The system uses:
/// - AWS Lambda for serverless execution
/// - SQS for task queuing between Lambdas
/// - reqwest for the LiveChat, OpenAI, and CRM HTTP APIs
/// - openai-api-rs message types for the chat-completions prompt
/// - Tokio for async runtime
///
/// # Example
///
/// ```
/// use livechat_summarizer::core::config::FilterRules;
/// use livechat_summarizer::core::models::{AuthorRole, ChatMessage, ChatTranscript};
/// use livechat_summarizer::utils::{MessageFilter, format_for_summarization};
///
/// let mut transcript = ChatTranscript::new("CHAT1");
/// transcript.messages = vec![
///     ChatMessage::new("1", AuthorRole::System, "Chat started"),
///     ChatMessage::new("2", AuthorRole::Customer, "My order never arrived"),
/// ];
///
/// let filter = MessageFilter::new(FilterRules::default());
/// let filtered = filter.filter_transcript(&transcript);
/// assert_eq!(filtered.messages.len(), 1);
/// assert!(format_for_summarization(&filtered).contains("Customer: My order never arrived"));
/// ```
// Module declarations
pub mod ai;
pub mod api;
pub mod clients;
pub mod core;
pub mod errors;
pub mod service;
pub mod utils;
pub mod worker;

pub use errors::SummaryError;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration. The level comes from `RUST_LOG` and defaults
/// to `info` (`debug` with the `debug-logs` feature). Calling it more than once
/// is harmless.
///
/// # Example
///
/// ```
/// // Initialize structured logging at the start of your Lambda handler
/// livechat_summarizer::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;

    let default_level = if cfg!(feature = "debug-logs") {
        "debug"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
