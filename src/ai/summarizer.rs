//! Filter, render, summarize, and validate one transcript.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::CompletionProvider;
use super::prompt_builder::{SUMMARIZATION_PROMPT, transcript_user_content};
use crate::core::config::OpenAISettings;
use crate::core::models::{ChatTranscript, Sentiment, SummaryResult, Urgency};
use crate::errors::SummaryError;
use crate::utils::filters::{MessageFilter, format_for_summarization};

pub const EMPTY_TRANSCRIPT_SUMMARY: &str =
    "The chat transcript is empty or contains no meaningful content.";
pub const EMPTY_RESPONSE_SUMMARY: &str = "Failed to generate summary: Empty response";
pub const MISSING_SUMMARY: &str = "Summary unavailable";

/// Longest slice of an unparseable model response kept as the summary.
pub const RAW_FALLBACK_CHARS: usize = 500;

pub struct Summarizer {
    filter: MessageFilter,
    provider: Arc<dyn CompletionProvider>,
    max_tokens: u32,
    temperature: f32,
}

impl Summarizer {
    #[must_use]
    pub fn new(
        filter: MessageFilter,
        provider: Arc<dyn CompletionProvider>,
        settings: &OpenAISettings,
    ) -> Self {
        Self {
            filter,
            provider,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }

    /// Summarizes `transcript`, optionally filtering it first.
    ///
    /// Empty input short-circuits to a fixed result without calling the
    /// provider, and malformed model output is repaired locally.
    ///
    /// # Errors
    ///
    /// Only a failure of the provider call itself is returned.
    #[instrument(level = "info", skip(self, transcript), fields(chat_id = %transcript.chat_id))]
    pub async fn summarize(
        &self,
        transcript: &ChatTranscript,
        apply_filter: bool,
    ) -> Result<SummaryResult, SummaryError> {
        let filtered = if apply_filter {
            self.filter.filter_transcript(transcript)
        } else {
            transcript.clone()
        };

        let formatted_text = format_for_summarization(&filtered);

        if formatted_text.trim().is_empty() || filtered.messages.is_empty() {
            info!("Nothing left to summarize after filtering");
            return Ok(empty_transcript_result());
        }

        info!(
            messages = filtered.messages.len(),
            dropped = transcript.messages.len() - filtered.messages.len(),
            "Summarizing transcript"
        );

        let content = self
            .provider
            .complete(
                SUMMARIZATION_PROMPT,
                &transcript_user_content(&formatted_text),
                self.max_tokens,
                self.temperature,
            )
            .await?;

        Ok(parse_summary_response(&content))
    }
}

/// Terminal result for a transcript with no usable messages.
#[must_use]
pub fn empty_transcript_result() -> SummaryResult {
    SummaryResult {
        urgency: Urgency::Low,
        ..SummaryResult::fallback(EMPTY_TRANSCRIPT_SUMMARY)
    }
}

/// Turns raw model output into a [`SummaryResult`]. Never fails.
///
/// Output that is not a JSON object becomes the summary text itself, cut to
/// [`RAW_FALLBACK_CHARS`] characters.
#[must_use]
pub fn parse_summary_response(content: &str) -> SummaryResult {
    if content.is_empty() {
        return SummaryResult::fallback(EMPTY_RESPONSE_SUMMARY);
    }

    match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(data)) => summary_from_object(&data),
        Ok(_) => {
            warn!("Model response was JSON but not an object");
            SummaryResult::fallback(truncate_chars(content, RAW_FALLBACK_CHARS))
        }
        Err(e) => {
            warn!("Model response was not valid JSON: {}", e);
            SummaryResult::fallback(truncate_chars(content, RAW_FALLBACK_CHARS))
        }
    }
}

fn summary_from_object(data: &Map<String, Value>) -> SummaryResult {
    SummaryResult {
        summary: data
            .get("summary")
            .and_then(Value::as_str)
            .unwrap_or(MISSING_SUMMARY)
            .to_string(),
        key_issues: string_list(data.get("key_issues")),
        resolution: data
            .get("resolution")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        action_items: string_list(data.get("action_items")),
        sentiment: data
            .get("sentiment")
            .and_then(Value::as_str)
            .map(Sentiment::coerce)
            .unwrap_or_default(),
        urgency: data
            .get("urgency")
            .and_then(Value::as_str)
            .map(Urgency::coerce)
            .unwrap_or_default(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
