//! Noise removal and transcript rendering ahead of summarization.
//!
//! Each message is judged on its own against a [`FilterRules`] set; no state
//! carries over from one message to the next. Filtering never mutates its
//! input transcript.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::core::config::FilterRules;
use crate::core::models::{AuthorRole, ChatMessage, ChatTranscript};

/// Agent sign-off boilerplate. Each pattern must cover the whole trimmed text,
/// except the `[signature]` marker which only needs to lead it.
static SIGNATURE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^-{2,}\s*$",
        r"(?i)^={2,}\s*$",
        r"(?i)^best\s+regards?,?\s*$",
        r"(?i)^kind\s+regards?,?\s*$",
        r"(?i)^sincerely,?\s*$",
        r"(?i)^thanks?,?\s*$",
        r"(?i)^\[signature\]",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex compile"))
    .collect()
});

static GREETING_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(hi|hello|hey|thanks|thank you|bye|goodbye|good\s+(morning|afternoon|evening))\.?!?\s*$",
    )
    .expect("static regex compile")
});

/// A rule set with its removal patterns compiled once.
#[derive(Debug, Clone)]
pub struct MessageFilter {
    rules: FilterRules,
    patterns: Vec<fancy_regex::Regex>,
}

impl MessageFilter {
    /// Compiles `rules.remove_patterns` case-insensitively in multi-line mode.
    /// Look-around and backreferences are allowed. Patterns that fail to
    /// compile are skipped.
    #[must_use]
    pub fn new(rules: FilterRules) -> Self {
        let patterns = rules
            .remove_patterns
            .iter()
            .filter_map(|pattern| {
                match fancy_regex::Regex::new(&format!("(?im){pattern}")) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!(pattern = %pattern, "Skipping invalid filter pattern: {}", e);
                        None
                    }
                }
            })
            .collect();

        Self { rules, patterns }
    }

    /// Number of removal patterns that compiled.
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub fn should_include(&self, message: &ChatMessage) -> bool {
        let text = message.text.trim();

        if text.chars().count() < self.rules.min_message_length {
            return false;
        }

        if self.rules.remove_system_messages && message.author_role == AuthorRole::System {
            return false;
        }

        if self.rules.remove_agent_signatures
            && SIGNATURE_PATTERNS.iter().any(|re| re.is_match(text))
        {
            return false;
        }

        for pattern in &self.patterns {
            match pattern.is_match(text) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warn!(pattern = %pattern.as_str(), "Filter pattern gave up: {}", e);
                    continue;
                }
            }
            // The greeting exemption applies to this pattern only; later
            // patterns still get their say.
            if self.rules.include_greetings && is_greeting_only(text) {
                continue;
            }
            return false;
        }

        true
    }

    /// Returns a new transcript holding only the messages that pass, in order.
    #[must_use]
    pub fn filter_transcript(&self, transcript: &ChatTranscript) -> ChatTranscript {
        let kept: Vec<ChatMessage> = transcript
            .messages
            .iter()
            .filter(|msg| self.should_include(msg))
            .cloned()
            .collect();

        debug!(
            chat_id = %transcript.chat_id,
            total = transcript.messages.len(),
            kept = kept.len(),
            "Filtered transcript"
        );

        transcript.with_messages(kept)
    }
}

/// True when the whole text is a bare greeting or sign-off.
#[must_use]
pub fn is_greeting_only(text: &str) -> bool {
    GREETING_ONLY.is_match(text)
}

/// Renders a transcript as the plain-text block handed to the model.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use livechat_summarizer::core::models::{AuthorRole, ChatMessage, ChatTranscript};
/// use livechat_summarizer::utils::filters::format_for_summarization;
///
/// let mut transcript = ChatTranscript::new("chat-1");
/// transcript.customer_name = Some("Jane".to_string());
/// transcript.messages.push(
///     ChatMessage::new("m1", AuthorRole::Agent, "On it")
///         .with_author(None, Some("Bob".to_string()))
///         .with_timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 14, 5, 0).unwrap()),
/// );
///
/// assert_eq!(format_for_summarization(&transcript), "Customer: Jane\n\n[14:05] Bob: On it");
/// ```
#[must_use]
pub fn format_for_summarization(transcript: &ChatTranscript) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(transcript.messages.len() + 2);

    if let Some(customer) = transcript.customer_label() {
        lines.push(format!("Customer: {customer}"));
        lines.push(String::new());
    }

    for msg in &transcript.messages {
        let author = msg
            .author_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| msg.author_role.label());
        let timestamp = msg
            .timestamp
            .map(|ts| ts.format("%H:%M").to_string())
            .unwrap_or_default();
        lines.push(format!("[{timestamp}] {author}: {}", msg.text));
    }

    lines.join("\n")
}
