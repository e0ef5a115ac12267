//! LLM (`OpenAI`) API client module
//!
//! Encapsulates the chat-completions call used to produce structured summaries.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use super::CompletionProvider;
use super::prompt_builder::build_prompt;
use crate::core::config::OpenAISettings;
use crate::errors::SummaryError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4 + 1
}

/// LLM API client for generating summaries
pub struct LlmClient {
    api_key: String,
    org_id: Option<String>,
    model_name: String,
    api_url: String,
    http: Client,
}

impl LlmClient {
    #[must_use]
    pub fn new(settings: &OpenAISettings) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key: settings.api_key.clone(),
            org_id: settings.org_id.clone(),
            model_name: settings.model.clone(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    fn headers(&self) -> Result<reqwest::header::HeaderMap, SummaryError> {
        let mut headers = reqwest::header::HeaderMap::new();
        let auth_value = format!("Bearer {}", self.api_key)
            .parse()
            .map_err(|e| SummaryError::HttpError(format!("Invalid Authorization header: {e}")))?;
        headers.insert("Authorization", auth_value);

        let content_type_value = "application/json"
            .parse()
            .map_err(|e| SummaryError::HttpError(format!("Invalid Content-Type header: {e}")))?;
        headers.insert("Content-Type", content_type_value);

        if let Some(org) = &self.org_id {
            let org_value = org.parse().map_err(|e| {
                SummaryError::HttpError(format!("Invalid OpenAI-Organization header: {e}"))
            })?;
            headers.insert("OpenAI-Organization", org_value);
        }

        Ok(headers)
    }

    /// Request body for the chat-completions endpoint in JSON-object mode.
    #[must_use]
    pub fn build_request_body(
        &self,
        prompt: &[ChatCompletionMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Value {
        json!({
            "model": self.model_name,
            "messages": build_chat_messages(prompt),
            "max_tokens": max_tokens,
            "temperature": temperature,
            "response_format": { "type": "json_object" }
        })
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, SummaryError> {
        let prompt = build_prompt(system_prompt, user_text);

        #[cfg(feature = "debug-logs")]
        info!("Using OpenAI prompt:\n{:?}", prompt);

        info!(
            model = %self.model_name,
            estimated_input_tokens = estimate_tokens(system_prompt) + estimate_tokens(user_text),
            "Requesting structured summary"
        );

        let request_body = self.build_request_body(&prompt, max_tokens, temperature);

        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_url))
            .headers(self.headers()?)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| SummaryError::HttpError(format!("OpenAI API request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(SummaryError::OpenAIError(format!(
                "OpenAI API error (status {status}): {error_text}"
            )));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            SummaryError::OpenAIError(format!("Failed to parse OpenAI response: {e}"))
        })?;

        let content = extract_message_content(&response_json);
        debug!(content_len = content.len(), "Received completion");
        Ok(content)
    }
}

/// Text of the first choice. A missing or null content is an empty string.
#[must_use]
pub fn extract_message_content(response_json: &Value) -> String {
    response_json
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Converts a chat prompt into the `messages` array of a chat-completions request.
/// Image parts are dropped; only text is ever sent.
pub(crate) fn build_chat_messages(prompt: &[ChatCompletionMessage]) -> Vec<Value> {
    prompt
        .iter()
        .filter_map(|m| {
            let role_str = match m.role {
                MessageRole::system => "system",
                MessageRole::user | MessageRole::function | MessageRole::tool => "user",
                MessageRole::assistant => "assistant",
            };

            match &m.content {
                Content::Text(t) => Some(json!({
                    "role": role_str,
                    "content": t
                })),
                Content::ImageUrl(_) => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> OpenAISettings {
        OpenAISettings {
            api_key: "test_key".to_string(),
            org_id: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1000,
            temperature: 0.3,
            api_url: "https://api.openai.com/v1/".to_string(),
        }
    }

    #[test]
    fn test_request_body_asks_for_json_object() {
        let client = LlmClient::new(&settings());
        let prompt = build_prompt("system text", "user text");
        let body = client.build_request_body(&prompt, 500, 0.2);

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 500);
        assert_eq!(body["response_format"]["type"], "json_object");

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "system text");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "user text");
    }

    #[test]
    fn test_api_url_trailing_slash_is_trimmed() {
        let client = LlmClient::new(&settings());
        assert_eq!(client.api_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_extract_message_content() {
        let response = json!({
            "choices": [{ "message": { "role": "assistant", "content": "{\"summary\":\"ok\"}" } }]
        });
        assert_eq!(extract_message_content(&response), "{\"summary\":\"ok\"}");

        let null_content = json!({ "choices": [{ "message": { "content": null } }] });
        assert_eq!(extract_message_content(&null_content), "");

        assert_eq!(extract_message_content(&json!({})), "");
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("abcdefgh"), 3);
    }
}
