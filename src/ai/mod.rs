//! All AI/LLM functionality

pub mod client;
pub mod prompt_builder;
pub mod summarizer;

use async_trait::async_trait;

use crate::errors::SummaryError;

// Re-export main types for convenience
pub use client::{LlmClient, estimate_tokens};
pub use summarizer::{Summarizer, parse_summary_response};

/// A language model that turns a system instruction plus user text into raw text.
///
/// Implementations must ask the provider for a single JSON object response.
/// Transport failures are returned as-is; callers decide what to do with them.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, SummaryError>;
}
