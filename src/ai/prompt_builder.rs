use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};

/// System instruction for structured chat summaries.
pub const SUMMARIZATION_PROMPT: &str = r#"You are an expert customer service analyst. Your task is to analyze chat transcripts and provide structured summaries.

Analyze the provided chat conversation and extract:

1. **Summary**: A concise 2-3 sentence summary of the conversation, focusing on the main topic and outcome.

2. **Key Issues**: List the main issues or questions raised by the customer (1-5 items).

3. **Resolution**: Describe how the issue was resolved, or note if it remains unresolved.

4. **Action Items**: List any follow-up actions mentioned or implied (can be empty).

5. **Sentiment**: Assess the customer's overall sentiment:
   - "positive": Customer expressed satisfaction or gratitude
   - "neutral": Professional, no strong emotions either way
   - "negative": Customer expressed frustration, disappointment, or anger

6. **Urgency**: Assess the urgency level:
   - "low": Routine inquiry, no time pressure
   - "normal": Standard support request
   - "high": Time-sensitive issue, customer waiting for resolution
   - "critical": Major problem, significant business impact, immediate attention needed

Respond ONLY with a valid JSON object in this exact format:
{
    "summary": "string",
    "key_issues": ["string"],
    "resolution": "string or null",
    "action_items": ["string"],
    "sentiment": "positive|neutral|negative",
    "urgency": "low|normal|high|critical"
}

Do not include any text before or after the JSON object."#;

/// Wraps the rendered transcript as the user turn.
#[must_use]
pub fn transcript_user_content(formatted_transcript: &str) -> String {
    format!("Chat Transcript:\n\n{formatted_transcript}")
}

/// Builds the two-message chat prompt: system instruction, then user text.
#[must_use]
pub fn build_prompt(system_prompt: &str, user_text: &str) -> Vec<ChatCompletionMessage> {
    vec![
        ChatCompletionMessage {
            role: MessageRole::system,
            content: Content::Text(system_prompt.to_string()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        },
        ChatCompletionMessage {
            role: MessageRole::user,
            content: Content::Text(user_text.to_string()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        },
    ]
}
