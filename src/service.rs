//! Wiring of the summarization pipeline: one instance per Lambda container.

use std::sync::Arc;
use tracing::info;

use crate::ai::{LlmClient, Summarizer};
use crate::clients::{ChatSource, CrmClient, CrmSink, LiveChatClient, TicketSink};
use crate::core::config::AppConfig;
use crate::core::models::{ChatTranscript, SummaryResult};
use crate::errors::SummaryError;
use crate::utils::MessageFilter;
use crate::worker::deliver::{DeliveryOptions, DeliveryOutcome, deliver_summary};

/// Result of running one chat through fetch, summarize, and delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    NoMessages,
    Processed {
        summary: SummaryResult,
        delivery: DeliveryOutcome,
    },
}

pub struct SummaryService {
    config: AppConfig,
    source: Arc<dyn ChatSource>,
    tickets: Arc<dyn TicketSink>,
    crm: Arc<dyn CrmSink>,
    summarizer: Summarizer,
}

impl SummaryService {
    /// Builds the production collaborators from `config`.
    #[must_use]
    pub fn from_config(config: AppConfig) -> Self {
        let livechat = Arc::new(LiveChatClient::new(&config.livechat));
        let llm = Arc::new(LlmClient::new(&config.openai));
        let crm = Arc::new(CrmClient::new(&config.crm));
        let summarizer = Summarizer::new(
            MessageFilter::new(config.filter_rules.clone()),
            llm,
            &config.openai,
        );

        Self {
            source: livechat.clone(),
            tickets: livechat,
            crm,
            summarizer,
            config,
        }
    }

    #[must_use]
    pub fn new(
        config: AppConfig,
        source: Arc<dyn ChatSource>,
        tickets: Arc<dyn TicketSink>,
        crm: Arc<dyn CrmSink>,
        summarizer: Summarizer,
    ) -> Self {
        Self {
            config,
            source,
            tickets,
            crm,
            summarizer,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn crm(&self) -> &dyn CrmSink {
        self.crm.as_ref()
    }

    pub async fn fetch(
        &self,
        chat_id: &str,
        thread_id: Option<&str>,
    ) -> Result<ChatTranscript, SummaryError> {
        self.source.fetch_transcript(chat_id, thread_id).await
    }

    pub async fn summarize(&self, transcript: &ChatTranscript) -> Result<SummaryResult, SummaryError> {
        self.summarizer.summarize(transcript, true).await
    }

    pub async fn deliver(
        &self,
        chat_id: &str,
        transcript: &ChatTranscript,
        summary: &SummaryResult,
        options: &DeliveryOptions,
    ) -> DeliveryOutcome {
        deliver_summary(
            self.tickets.as_ref(),
            self.crm.as_ref(),
            chat_id,
            transcript,
            summary,
            options,
        )
        .await
    }

    /// Full pipeline for one chat. A transcript without messages stops
    /// before the model is called.
    ///
    /// # Errors
    ///
    /// Fetch and summarization failures are returned; delivery failures are
    /// only reflected in the outcome.
    pub async fn process_chat(
        &self,
        chat_id: &str,
        thread_id: Option<&str>,
        options: &DeliveryOptions,
    ) -> Result<ChatOutcome, SummaryError> {
        let transcript = self.fetch(chat_id, thread_id).await?;
        if transcript.messages.is_empty() {
            return Ok(ChatOutcome::NoMessages);
        }

        let summary = self.summarize(&transcript).await?;
        info!(chat_id, summary_len = summary.summary.len(), "Generated summary");

        let delivery = self.deliver(chat_id, &transcript, &summary, options).await;
        Ok(ChatOutcome::Processed { summary, delivery })
    }
}
