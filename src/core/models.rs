use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorRole {
    Customer,
    Agent,
    System,
}

impl AuthorRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Agent => "agent",
            Self::System => "system",
        }
    }

    /// Capitalized role name, used when a message has no author display name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Agent => "Agent",
            Self::System => "System",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: String,
    pub author_role: AuthorRole,
    pub author_id: Option<String>,
    pub author_name: Option<String>,
    pub text: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessage {
    #[must_use]
    pub fn new(message_id: impl Into<String>, author_role: AuthorRole, text: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            author_role,
            author_id: None,
            author_name: None,
            text: text.into(),
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_author(mut self, author_id: Option<String>, author_name: Option<String>) -> Self {
        self.author_id = author_id;
        self.author_name = author_name;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// A chat conversation and its participants. Messages are kept in chronological order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChatTranscript {
    pub chat_id: String,
    pub thread_id: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    #[serde(default)]
    pub agent_ids: Vec<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ChatTranscript {
    #[must_use]
    pub fn new(chat_id: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            ..Self::default()
        }
    }

    /// Customer display name, falling back to the email address.
    #[must_use]
    pub fn customer_label(&self) -> Option<&str> {
        self.customer_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.customer_email.as_deref().filter(|s| !s.is_empty()))
    }

    /// Same metadata, different message list.
    #[must_use]
    pub fn with_messages(&self, messages: Vec<ChatMessage>) -> Self {
        Self {
            chat_id: self.chat_id.clone(),
            thread_id: self.thread_id.clone(),
            customer_email: self.customer_email.clone(),
            customer_name: self.customer_name.clone(),
            agent_ids: self.agent_ids.clone(),
            messages,
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl Sentiment {
    /// Lower-cases and trims `raw`; anything unrecognized becomes `Neutral`.
    #[must_use]
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            _ => Self::Neutral,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl From<String> for Sentiment {
    fn from(raw: String) -> Self {
        Self::coerce(&raw)
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Urgency {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Urgency {
    /// Lower-cases and trims `raw`; anything unrecognized becomes `Normal`.
    #[must_use]
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "critical" => Self::Critical,
            _ => Self::Normal,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl From<String> for Urgency {
    fn from(raw: String) -> Self {
        Self::coerce(&raw)
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result of summarizing one transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    #[serde(default)]
    pub key_issues: Vec<String>,
    pub resolution: Option<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub sentiment: Sentiment,
    #[serde(default)]
    pub urgency: Urgency,
}

impl SummaryResult {
    /// A result carrying only `summary`, with every other field at its default.
    #[must_use]
    pub fn fallback(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            key_issues: Vec::new(),
            resolution: None,
            action_items: Vec::new(),
            sentiment: Sentiment::Neutral,
            urgency: Urgency::Normal,
        }
    }

    /// Ticket subject derived from the first key issue.
    #[must_use]
    pub fn ticket_subject(&self) -> String {
        let topic = self
            .key_issues
            .first()
            .map_or("Support Request", String::as_str);
        format!("Chat Summary: {topic}")
    }
}

/// Request for the ticketing collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketRequest {
    pub chat_id: String,
    pub subject: String,
    pub message: String,
    pub requester_email: Option<String>,
    pub requester_name: Option<String>,
    pub tags: Vec<String>,
}

/// Payload forwarded to the CRM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrmPayload {
    pub ticket_id: String,
    pub chat_id: String,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub summary: String,
    pub key_issues: Vec<String>,
    pub resolution: Option<String>,
    pub action_items: Vec<String>,
    pub sentiment: Sentiment,
    pub urgency: Urgency,
    pub timestamp: DateTime<Utc>,
    pub raw_transcript: Option<String>,
}

/// Background job handed from the API function to the worker via SQS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingTask {
    pub correlation_id: String,
    pub chat_id: String,
    pub thread_id: Option<String>,
    pub action: String,
}

/// Incoming webhook envelope from LiveChat.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub webhook_id: Option<String>,
    pub secret_key: Option<String>,
    pub action: String,
    pub license_id: Option<i64>,
    #[serde(default)]
    pub payload: Value,
    pub additional_data: Option<Value>,
}

impl WebhookPayload {
    #[must_use]
    pub fn chat_id(&self) -> Option<&str> {
        self.payload
            .get("chat")
            .and_then(|chat| chat.get("id"))
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizeRequest {
    pub chat_id: String,
    pub thread_id: Option<String>,
    #[serde(default = "default_true")]
    pub create_ticket: bool,
    #[serde(default = "default_true")]
    pub send_to_crm: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummarizeResponse {
    pub success: bool,
    pub chat_id: String,
    pub ticket_id: Option<String>,
    pub summary: Option<SummaryResult>,
    pub crm_sent: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
