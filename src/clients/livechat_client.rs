//! LiveChat Agent API client
//!
//! Fetches chat transcripts and opens tickets, with OAuth client-credentials
//! token caching and retry on transient failures.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

use super::{ChatSource, TicketSink};
use crate::core::config::LiveChatSettings;
use crate::core::models::{AuthorRole, ChatMessage, ChatTranscript, TicketRequest};
use crate::errors::SummaryError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;
const UNKNOWN_AUTHOR: &str = "Unknown";

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

pub struct LiveChatClient {
    api_url: String,
    accounts_url: String,
    client_id: String,
    client_secret: String,
    http: Client,
    token: Mutex<Option<CachedToken>>,
}

impl LiveChatClient {
    #[must_use]
    pub fn new(settings: &LiveChatSettings) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            accounts_url: settings.accounts_url.trim_end_matches('/').to_string(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            http,
            token: Mutex::new(None),
        }
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, SummaryError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, SummaryError>> + Send,
        T: Send,
    {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(2);

        RetryIf::spawn(strategy, operation, is_transient).await
    }

    async fn access_token(&self) -> Result<String, SummaryError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && Utc::now() < token.expires_at
        {
            return Ok(token.value.clone());
        }

        let credentials = general_purpose::STANDARD
            .encode(format!("{}:{}", self.client_id, self.client_secret));
        let form = format!(
            "grant_type=client_credentials&client_id={}&client_secret={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.client_secret)
        );

        let response: TokenResponse = self
            .with_retry(|| async {
                let resp = self
                    .http
                    .post(format!("{}/v2/token", self.accounts_url))
                    .header(AUTHORIZATION, format!("Basic {credentials}"))
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(form.clone())
                    .send()
                    .await?;
                let resp = check_status(resp, "token").await?;
                resp.json::<TokenResponse>().await.map_err(|e| {
                    SummaryError::LiveChatError(format!("Invalid token response: {e}"))
                })
            })
            .await?;

        let ttl = response.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_SECS) - TOKEN_EXPIRY_MARGIN_SECS;
        let token = CachedToken {
            value: response.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(ttl.max(0)),
        };
        debug!(expires_at = %token.expires_at, "Obtained LiveChat access token");

        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn agent_action(&self, action: &str, body: &Value) -> Result<Value, SummaryError> {
        let token = self.access_token().await?;
        let url = format!("{}/agent/action/{action}", self.api_url);

        self.with_retry(|| async {
            let resp = self
                .http
                .post(&url)
                .bearer_auth(&token)
                .json(body)
                .send()
                .await?;
            let resp = check_status(resp, action).await?;
            resp.json::<Value>().await.map_err(|e| {
                SummaryError::LiveChatError(format!("Invalid {action} response: {e}"))
            })
        })
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the LiveChat API call fails or the response cannot be read.
    pub async fn get_chat(
        &self,
        chat_id: &str,
        thread_id: Option<&str>,
    ) -> Result<ChatTranscript, SummaryError> {
        let mut request = json!({ "chat_id": chat_id });
        if let Some(thread_id) = thread_id {
            request["thread_id"] = Value::String(thread_id.to_string());
        }

        let response = self.agent_action("get_chat", &request).await?;
        let raw: RawChat = serde_json::from_value(response).map_err(|e| {
            SummaryError::LiveChatError(format!("Unexpected get_chat response shape: {e}"))
        })?;

        let transcript = transcript_from_chat(chat_id, thread_id, &raw);
        info!(
            chat_id = %chat_id,
            messages = transcript.messages.len(),
            "Fetched chat transcript"
        );
        Ok(transcript)
    }

    /// # Errors
    ///
    /// Returns an error if the LiveChat API call fails.
    pub async fn open_ticket(&self, request: &TicketRequest) -> Result<Value, SummaryError> {
        self.agent_action("create_ticket", &ticket_body(request)).await
    }
}

#[async_trait]
impl ChatSource for LiveChatClient {
    async fn fetch_transcript(
        &self,
        chat_id: &str,
        thread_id: Option<&str>,
    ) -> Result<ChatTranscript, SummaryError> {
        self.get_chat(chat_id, thread_id).await
    }
}

#[async_trait]
impl TicketSink for LiveChatClient {
    async fn create_ticket(&self, request: &TicketRequest) -> Result<Option<String>, SummaryError> {
        let response = self.open_ticket(request).await?;
        Ok(response.get("id").and_then(|id| match id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }))
    }
}

fn is_transient(error: &SummaryError) -> bool {
    matches!(error, SummaryError::HttpError(_))
}

/// Maps a non-2xx response to an error; 429 and 5xx count as transient.
async fn check_status(
    resp: reqwest::Response,
    action: &str,
) -> Result<reqwest::Response, SummaryError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read body>".to_string());
    warn!(action = %action, status = %status, "LiveChat request failed");

    let message = format!("LiveChat {action} returned {status}: {body}");
    if status.as_u16() == 429 || status.is_server_error() {
        Err(SummaryError::HttpError(message))
    } else {
        Err(SummaryError::LiveChatError(message))
    }
}

/// JSON body for `agent/action/create_ticket`.
#[must_use]
pub fn ticket_body(request: &TicketRequest) -> Value {
    let mut body = json!({
        "message": request.message,
        "subject": request.subject,
    });

    if let Some(email) = request.requester_email.as_deref().filter(|e| !e.is_empty()) {
        let name = request
            .requester_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(email);
        body["requester"] = json!({ "email": email, "name": name });
    }

    if !request.tags.is_empty() {
        body["tags"] = json!(request.tags);
    }

    body["source"] = json!({ "type": "chat", "id": request.chat_id });
    body
}

// ============================================================================
// get_chat response shape
// ============================================================================

/// The chat body is either the response root or nested under `chat`.
#[derive(Debug, Default, Deserialize)]
pub struct RawChat {
    #[serde(default)]
    pub chat: Option<Box<RawChat>>,
    #[serde(default)]
    pub users: Vec<RawUser>,
    #[serde(default)]
    pub threads: Option<Vec<RawThread>>,
    #[serde(default)]
    pub thread: Option<RawThread>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawUser {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawThread {
    #[serde(default)]
    pub events: Vec<RawEvent>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// RFC 3339 timestamp, or `None` when absent or malformed.
#[must_use]
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.filter(|s| !s.is_empty())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Builds a [`ChatTranscript`] out of a `get_chat` response.
#[must_use]
pub fn transcript_from_chat(chat_id: &str, thread_id: Option<&str>, raw: &RawChat) -> ChatTranscript {
    let body = raw.chat.as_deref().unwrap_or(raw);
    let threads: Vec<&RawThread> = match &body.threads {
        Some(threads) => threads.iter().collect(),
        None => raw.thread.iter().collect(),
    };

    let is_kind = |user: &RawUser, kind: &str| user.kind.as_deref() == Some(kind);
    let customer = body.users.iter().find(|u| is_kind(u, "customer"));
    let agent_ids: Vec<String> = body
        .users
        .iter()
        .filter(|u| is_kind(u, "agent"))
        .map(|u| u.id.clone())
        .collect();

    let mut messages = Vec::new();
    let mut started_at = None;
    let mut ended_at = None;

    for thread in threads {
        if started_at.is_none() {
            started_at = parse_timestamp(thread.created_at.as_deref());
        }

        for event in thread
            .events
            .iter()
            .filter(|e| e.kind.as_deref() == Some("message"))
        {
            let author_id = event.author_id.clone().unwrap_or_default();
            let role = if agent_ids.contains(&author_id) {
                AuthorRole::Agent
            } else if author_id.starts_with("system") {
                AuthorRole::System
            } else {
                AuthorRole::Customer
            };

            let author_name = body
                .users
                .iter()
                .find(|u| u.id == author_id)
                .and_then(|u| {
                    u.name
                        .clone()
                        .filter(|n| !n.is_empty())
                        .or_else(|| u.email.clone().filter(|e| !e.is_empty()))
                })
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

            let mut message = ChatMessage::new(
                event.id.clone().unwrap_or_default(),
                role,
                event.text.clone().unwrap_or_default(),
            )
            .with_author(Some(author_id), Some(author_name));
            message.timestamp = parse_timestamp(event.created_at.as_deref());
            messages.push(message);
        }

        if let Some(closed) = parse_timestamp(thread.closed_at.as_deref()) {
            ended_at = Some(closed);
        }
    }

    ChatTranscript {
        chat_id: chat_id.to_string(),
        thread_id: thread_id.map(ToString::to_string),
        customer_email: customer.and_then(|c| c.email.clone()),
        customer_name: customer.and_then(|c| c.name.clone()),
        agent_ids,
        messages,
        started_at,
        ended_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chat() -> Value {
        json!({
            "id": "CHAT123",
            "users": [
                { "id": "cust-1", "type": "customer", "name": "Jane Doe", "email": "jane@example.com" },
                { "id": "agent-1", "type": "agent", "name": "Bob", "email": "bob@example.com" },
                { "id": "agent-2", "type": "agent", "email": "amy@example.com" }
            ],
            "thread": {
                "id": "T1",
                "created_at": "2024-05-01T14:00:00.000000Z",
                "closed_at": "2024-05-01T14:30:00Z",
                "events": [
                    { "id": "e1", "type": "message", "author_id": "cust-1", "text": "My order is late", "created_at": "2024-05-01T14:01:00Z" },
                    { "id": "e2", "type": "system_message", "author_id": "system", "text": "Bob joined" },
                    { "id": "e3", "type": "message", "author_id": "agent-1", "text": "Let me check", "created_at": "2024-05-01T14:02:00Z" },
                    { "id": "e4", "type": "message", "author_id": "agent-2", "text": "Escalated", "created_at": "not-a-date" },
                    { "id": "e5", "type": "message", "author_id": "system-bot", "text": "Chat archived" }
                ]
            }
        })
    }

    #[test]
    fn test_transcript_from_root_level_thread() {
        let raw: RawChat = serde_json::from_value(sample_chat()).unwrap();
        let transcript = transcript_from_chat("CHAT123", None, &raw);

        assert_eq!(transcript.customer_name.as_deref(), Some("Jane Doe"));
        assert_eq!(transcript.customer_email.as_deref(), Some("jane@example.com"));
        assert_eq!(transcript.agent_ids, vec!["agent-1", "agent-2"]);
        assert_eq!(transcript.messages.len(), 4);

        let roles: Vec<AuthorRole> = transcript.messages.iter().map(|m| m.author_role).collect();
        assert_eq!(
            roles,
            vec![AuthorRole::Customer, AuthorRole::Agent, AuthorRole::Agent, AuthorRole::System]
        );

        assert_eq!(transcript.messages[2].author_name.as_deref(), Some("amy@example.com"));
        assert_eq!(transcript.messages[3].author_name.as_deref(), Some("Unknown"));
        assert!(transcript.messages[2].timestamp.is_none());
        assert!(transcript.started_at.is_some());
        assert!(transcript.ended_at.is_some());
    }

    #[test]
    fn test_transcript_from_nested_chat_with_threads() {
        let value = json!({
            "chat": {
                "users": [{ "id": "c", "type": "customer", "email": "only@example.com" }],
                "threads": [
                    { "created_at": "2024-01-01T10:00:00Z", "events": [
                        { "id": "1", "type": "message", "author_id": "c", "text": "first" }
                    ]},
                    { "closed_at": "2024-01-01T11:00:00Z", "events": [
                        { "id": "2", "type": "message", "author_id": "c", "text": "second" }
                    ]}
                ]
            }
        });
        let raw: RawChat = serde_json::from_value(value).unwrap();
        let transcript = transcript_from_chat("C1", Some("T9"), &raw);

        assert_eq!(transcript.thread_id.as_deref(), Some("T9"));
        assert_eq!(transcript.customer_name, None);
        assert_eq!(transcript.customer_label(), Some("only@example.com"));
        let texts: Vec<&str> = transcript.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(
            transcript.ended_at,
            parse_timestamp(Some("2024-01-01T11:00:00Z"))
        );
    }

    #[test]
    fn test_ticket_body_with_requester_and_tags() {
        let request = TicketRequest {
            chat_id: "CHAT123".to_string(),
            subject: "Chat Summary: Late order".to_string(),
            message: "Customer order delayed".to_string(),
            requester_email: Some("jane@example.com".to_string()),
            requester_name: None,
            tags: vec!["auto-summarized".to_string()],
        };
        let body = ticket_body(&request);

        assert_eq!(body["requester"]["email"], "jane@example.com");
        assert_eq!(body["requester"]["name"], "jane@example.com");
        assert_eq!(body["tags"][0], "auto-summarized");
        assert_eq!(body["source"]["type"], "chat");
        assert_eq!(body["source"]["id"], "CHAT123");
    }

    #[test]
    fn test_ticket_body_without_requester() {
        let request = TicketRequest {
            chat_id: "C".to_string(),
            subject: "s".to_string(),
            message: "m".to_string(),
            requester_email: None,
            requester_name: Some("Jane".to_string()),
            tags: Vec::new(),
        };
        let body = ticket_body(&request);
        assert!(body.get("requester").is_none());
        assert!(body.get("tags").is_none());
    }
}
