//! CRM delivery over REST or webhook.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use super::CrmSink;
use crate::core::config::CrmSettings;
use crate::core::models::{ChatTranscript, CrmPayload, SummaryResult};
use crate::errors::SummaryError;
use crate::utils::filters::format_for_summarization;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CLIENT_USER_AGENT: &str = "LiveChatSummarizer/1.0";
const WEBHOOK_EVENT: &str = "chat_summarized";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Rest,
    Webhook,
}

impl DeliveryMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rest => "rest_api",
            Self::Webhook => "webhook",
        }
    }
}

pub struct CrmClient {
    settings: CrmSettings,
    http: Client,
}

impl CrmClient {
    #[must_use]
    pub fn new(settings: &CrmSettings) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            settings: settings.clone(),
            http,
        }
    }

    #[must_use]
    pub fn mode(&self) -> DeliveryMode {
        if self.settings.use_webhook {
            DeliveryMode::Webhook
        } else {
            DeliveryMode::Rest
        }
    }

    /// Target URL for the configured mode. Webhook mode falls back to the REST endpoint.
    #[must_use]
    pub fn target_url(&self) -> Option<&str> {
        let endpoint = self.settings.endpoint_url.as_deref();
        match self.mode() {
            DeliveryMode::Rest => endpoint,
            DeliveryMode::Webhook => self.settings.webhook_url.as_deref().or(endpoint),
        }
    }

    /// Builds the request headers. Custom headers are applied last and win.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a header name or value is not valid HTTP.
    pub fn headers(&self) -> Result<HeaderMap, SummaryError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        if let Some(key) = &self.settings.api_key {
            headers.insert("Authorization", header_value(&format!("Bearer {key}"))?);
            headers.insert("X-API-Key", header_value(key)?);
        }

        for (name, value) in &self.settings.custom_headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                SummaryError::ConfigError(format!("Invalid CRM header name '{name}': {e}"))
            })?;
            headers.insert(name, header_value(value)?);
        }

        Ok(headers)
    }

    /// Body actually posted for `payload` in the configured mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn request_body(&self, payload: &CrmPayload) -> Result<Value, SummaryError> {
        let data = serde_json::to_value(payload)?;
        Ok(match self.mode() {
            DeliveryMode::Rest => data,
            DeliveryMode::Webhook => json!({
                "event": WEBHOOK_EVENT,
                "timestamp": Utc::now().to_rfc3339(),
                "data": data,
            }),
        })
    }
}

#[async_trait]
impl CrmSink for CrmClient {
    fn is_configured(&self) -> bool {
        self.target_url().is_some_and(|u| !u.is_empty())
    }

    fn include_raw_transcript(&self) -> bool {
        self.settings.include_raw_transcript
    }

    #[instrument(level = "info", skip(self, payload), fields(chat_id = %payload.chat_id, mode = self.mode().as_str()))]
    async fn send(&self, payload: &CrmPayload) -> Result<Value, SummaryError> {
        let Some(url) = self.target_url() else {
            return Err(SummaryError::ConfigError(match self.mode() {
                DeliveryMode::Rest => "CRM endpoint URL is not configured".to_string(),
                DeliveryMode::Webhook => "CRM webhook/endpoint URL is not configured".to_string(),
            }));
        };

        let body = self.request_body(payload)?;
        let response = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            error!(status = %status, "CRM delivery failed");
            return Err(SummaryError::CrmError(format!(
                "CRM returned {status}: {body_text}"
            )));
        }

        info!(status = %status, "CRM delivery succeeded");

        let text = response.text().await.unwrap_or_default();
        Ok(serde_json::from_str::<Value>(&text).unwrap_or_else(|_| {
            warn!("CRM response was not JSON");
            delivered_ack(status.as_u16(), self.mode())
        }))
    }
}

/// The raw transcript is only attached when `include_raw_transcript` is set,
/// and is rendered from the unfiltered transcript.
#[must_use]
pub fn build_crm_payload(
    ticket_id: &str,
    chat_id: &str,
    summary: &SummaryResult,
    transcript: Option<&ChatTranscript>,
    include_raw_transcript: bool,
) -> CrmPayload {
    let raw_transcript = transcript
        .filter(|_| include_raw_transcript)
        .map(format_for_summarization);

    CrmPayload {
        ticket_id: ticket_id.to_string(),
        chat_id: chat_id.to_string(),
        customer_email: transcript.and_then(|t| t.customer_email.clone()),
        customer_name: transcript.and_then(|t| t.customer_name.clone()),
        summary: summary.summary.clone(),
        key_issues: summary.key_issues.clone(),
        resolution: summary.resolution.clone(),
        action_items: summary.action_items.clone(),
        sentiment: summary.sentiment,
        urgency: summary.urgency,
        timestamp: Utc::now(),
        raw_transcript,
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, SummaryError> {
    HeaderValue::from_str(raw)
        .map_err(|e| SummaryError::ConfigError(format!("Invalid CRM header value: {e}")))
}

/// Stand-in response when the CRM accepts the payload without a JSON body.
#[must_use]
pub fn delivered_ack(status_code: u16, mode: DeliveryMode) -> Value {
    let message = match mode {
        DeliveryMode::Rest => "Payload delivered successfully",
        DeliveryMode::Webhook => "Webhook delivered successfully",
    };
    json!({
        "success": true,
        "status_code": status_code,
        "message": message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{AuthorRole, ChatMessage, Sentiment, Urgency};

    fn settings() -> CrmSettings {
        CrmSettings {
            endpoint_url: Some("https://crm.example.com/api/summaries".to_string()),
            api_key: Some("secret-key".to_string()),
            ..CrmSettings::default()
        }
    }

    fn summary() -> SummaryResult {
        SummaryResult {
            summary: "Late order resolved".to_string(),
            key_issues: vec!["Late order".to_string()],
            resolution: Some("Refund issued".to_string()),
            action_items: vec![],
            sentiment: Sentiment::Positive,
            urgency: Urgency::High,
        }
    }

    fn transcript() -> ChatTranscript {
        let mut t = ChatTranscript::new("CHAT123");
        t.customer_name = Some("Jane".to_string());
        t.customer_email = Some("jane@example.com".to_string());
        t.messages.push(ChatMessage::new("1", AuthorRole::System, "Chat started"));
        t
    }

    #[test]
    fn test_is_configured_per_mode() {
        assert!(CrmClient::new(&settings()).is_configured());
        assert!(!CrmClient::new(&CrmSettings::default()).is_configured());

        let webhook_only = CrmSettings {
            use_webhook: true,
            webhook_url: Some("https://hooks.example.com/x".to_string()),
            ..CrmSettings::default()
        };
        assert!(CrmClient::new(&webhook_only).is_configured());

        let rest_without_endpoint = CrmSettings {
            webhook_url: Some("https://hooks.example.com/x".to_string()),
            ..CrmSettings::default()
        };
        assert!(!CrmClient::new(&rest_without_endpoint).is_configured());
    }

    #[test]
    fn test_webhook_mode_falls_back_to_endpoint() {
        let client = CrmClient::new(&CrmSettings {
            use_webhook: true,
            ..settings()
        });
        assert_eq!(client.target_url(), Some("https://crm.example.com/api/summaries"));
    }

    #[test]
    fn test_headers_include_key_and_custom_overrides() {
        let mut s = settings();
        s.custom_headers
            .insert("X-Tenant".to_string(), "acme".to_string());
        s.custom_headers
            .insert("User-Agent".to_string(), "Custom/2.0".to_string());
        let headers = CrmClient::new(&s).headers().unwrap();

        assert_eq!(headers["Authorization"], "Bearer secret-key");
        assert_eq!(headers["X-API-Key"], "secret-key");
        assert_eq!(headers["X-Tenant"], "acme");
        assert_eq!(headers["User-Agent"], "Custom/2.0");
        assert_eq!(headers["Content-Type"], "application/json");
    }

    #[test]
    fn test_build_payload_omits_raw_transcript_by_default() {
        let client = CrmClient::new(&settings());
        let t = transcript();
        let payload = client.build_payload("T-1", "CHAT123", &summary(), Some(&t));

        assert_eq!(payload.customer_email.as_deref(), Some("jane@example.com"));
        assert_eq!(payload.urgency, Urgency::High);
        assert!(payload.raw_transcript.is_none());
    }

    #[test]
    fn test_build_payload_with_raw_transcript() {
        let client = CrmClient::new(&CrmSettings {
            include_raw_transcript: true,
            ..settings()
        });
        let t = transcript();
        let payload = client.build_payload("T-1", "CHAT123", &summary(), Some(&t));

        assert_eq!(
            payload.raw_transcript.as_deref(),
            Some("Customer: Jane\n\n[] System: Chat started")
        );
    }

    #[test]
    fn test_webhook_body_wraps_payload() {
        let client = CrmClient::new(&CrmSettings {
            use_webhook: true,
            ..settings()
        });
        let payload = client.build_payload("T-1", "CHAT123", &summary(), None);
        let body = client.request_body(&payload).unwrap();

        assert_eq!(body["event"], "chat_summarized");
        assert_eq!(body["data"]["ticket_id"], "T-1");
        assert_eq!(body["data"]["sentiment"], "positive");
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn test_delivered_ack_message() {
        let ack = delivered_ack(204, DeliveryMode::Webhook);
        assert_eq!(ack["success"], true);
        assert_eq!(ack["status_code"], 204);
        assert_eq!(ack["message"], "Webhook delivered successfully");
    }
}
