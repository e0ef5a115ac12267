//! Adapters for the external systems around the summarizer.

pub mod crm_client;
pub mod livechat_client;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::models::{ChatTranscript, CrmPayload, SummaryResult, TicketRequest};
use crate::errors::SummaryError;

pub use crm_client::CrmClient;
pub use livechat_client::LiveChatClient;

/// Where transcripts come from.
#[async_trait]
pub trait ChatSource: Send + Sync {
    async fn fetch_transcript(
        &self,
        chat_id: &str,
        thread_id: Option<&str>,
    ) -> Result<ChatTranscript, SummaryError>;
}

/// Opens support tickets. Returns the ticket id when the platform reports one.
#[async_trait]
pub trait TicketSink: Send + Sync {
    async fn create_ticket(&self, request: &TicketRequest) -> Result<Option<String>, SummaryError>;
}

/// Receives finished summaries.
#[async_trait]
pub trait CrmSink: Send + Sync {
    fn is_configured(&self) -> bool;

    /// Whether payloads should carry the rendered, unfiltered transcript.
    fn include_raw_transcript(&self) -> bool {
        false
    }

    /// Assembles the payload for this sink's raw-transcript setting.
    fn build_payload(
        &self,
        ticket_id: &str,
        chat_id: &str,
        summary: &SummaryResult,
        transcript: Option<&ChatTranscript>,
    ) -> CrmPayload {
        crm_client::build_crm_payload(
            ticket_id,
            chat_id,
            summary,
            transcript,
            self.include_raw_transcript(),
        )
    }

    async fn send(&self, payload: &CrmPayload) -> Result<Value, SummaryError>;
}
