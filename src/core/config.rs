use std::collections::BTreeMap;
use std::env;
use std::str::FromStr;

const DEFAULT_LIVECHAT_API_URL: &str = "https://api.livechatinc.com/v3.5";
const DEFAULT_LIVECHAT_ACCOUNTS_URL: &str = "https://accounts.livechatinc.com";
const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo-preview";

/// Rules deciding which messages are dropped before summarization.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRules {
    pub remove_system_messages: bool,
    pub remove_agent_signatures: bool,
    pub min_message_length: usize,
    pub remove_patterns: Vec<String>,
    pub include_greetings: bool,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            remove_system_messages: true,
            remove_agent_signatures: true,
            min_message_length: 3,
            remove_patterns: vec![
                r"^\s*$".to_string(),
                r"^(hi|hello|hey|thanks|thank you|bye|goodbye)\.?$".to_string(),
            ],
            include_greetings: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LiveChatSettings {
    pub client_id: String,
    pub client_secret: String,
    pub account_id: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_url: String,
    pub accounts_url: String,
}

/// Provider parameters passed through to the completion call untouched.
#[derive(Debug, Clone)]
pub struct OpenAISettings {
    pub api_key: String,
    pub org_id: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub api_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct CrmSettings {
    pub endpoint_url: Option<String>,
    pub api_key: Option<String>,
    pub use_webhook: bool,
    pub webhook_url: Option<String>,
    pub custom_headers: BTreeMap<String, String>,
    pub include_raw_transcript: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub debug: bool,
    pub cors_origins: Vec<String>,
    pub processing_queue_url: Option<String>,
    pub auto_create_ticket: bool,
    pub auto_send_to_crm: bool,
    pub livechat: LiveChatSettings,
    pub openai: OpenAISettings,
    pub crm: CrmSettings,
    pub filter_rules: FilterRules,
}

impl AppConfig {
    /// Loads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns the name of the offending variable when a required value is
    /// missing or a value cannot be parsed.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required =
            |key: &str| get(key).ok_or_else(|| format!("{key}: environment variable not found"));

        let livechat = LiveChatSettings {
            client_id: required("LIVECHAT_CLIENT_ID")?,
            client_secret: required("LIVECHAT_CLIENT_SECRET")?,
            account_id: get("LIVECHAT_ACCOUNT_ID"),
            webhook_secret: get("LIVECHAT_WEBHOOK_SECRET"),
            api_url: get("LIVECHAT_API_URL")
                .unwrap_or_else(|| DEFAULT_LIVECHAT_API_URL.to_string()),
            accounts_url: get("LIVECHAT_ACCOUNTS_URL")
                .unwrap_or_else(|| DEFAULT_LIVECHAT_ACCOUNTS_URL.to_string()),
        };

        let openai = OpenAISettings {
            api_key: required("OPENAI_API_KEY")?,
            org_id: get("OPENAI_ORG_ID"),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            max_tokens: parse_or("OPENAI_MAX_TOKENS", get("OPENAI_MAX_TOKENS"), 1000)?,
            temperature: parse_or("OPENAI_TEMPERATURE", get("OPENAI_TEMPERATURE"), 0.3)?,
            api_url: get("OPENAI_API_URL").unwrap_or_else(|| DEFAULT_OPENAI_API_URL.to_string()),
        };

        let crm = CrmSettings {
            endpoint_url: get("CRM_ENDPOINT_URL"),
            api_key: get("CRM_API_KEY"),
            use_webhook: bool_or("CRM_USE_WEBHOOK", get("CRM_USE_WEBHOOK"), false)?,
            webhook_url: get("CRM_WEBHOOK_URL"),
            custom_headers: json_or("CRM_CUSTOM_HEADERS", get("CRM_CUSTOM_HEADERS"))?
                .unwrap_or_default(),
            include_raw_transcript: bool_or(
                "INCLUDE_RAW_TRANSCRIPT",
                get("INCLUDE_RAW_TRANSCRIPT"),
                false,
            )?,
        };

        let defaults = FilterRules::default();
        let filter_rules = FilterRules {
            remove_system_messages: bool_or(
                "FILTER_REMOVE_SYSTEM_MESSAGES",
                get("FILTER_REMOVE_SYSTEM_MESSAGES"),
                defaults.remove_system_messages,
            )?,
            remove_agent_signatures: bool_or(
                "FILTER_REMOVE_AGENT_SIGNATURES",
                get("FILTER_REMOVE_AGENT_SIGNATURES"),
                defaults.remove_agent_signatures,
            )?,
            min_message_length: parse_or(
                "FILTER_MIN_MESSAGE_LENGTH",
                get("FILTER_MIN_MESSAGE_LENGTH"),
                defaults.min_message_length,
            )?,
            remove_patterns: json_or("FILTER_REMOVE_PATTERNS", get("FILTER_REMOVE_PATTERNS"))?
                .unwrap_or(defaults.remove_patterns),
            include_greetings: bool_or(
                "FILTER_INCLUDE_GREETINGS",
                get("FILTER_INCLUDE_GREETINGS"),
                defaults.include_greetings,
            )?,
        };

        Ok(Self {
            debug: bool_or("DEBUG", get("DEBUG"), false)?,
            cors_origins: json_or("CORS_ORIGINS", get("CORS_ORIGINS"))?
                .unwrap_or_else(|| vec!["*".to_string()]),
            processing_queue_url: get("PROCESSING_QUEUE_URL"),
            auto_create_ticket: bool_or("AUTO_CREATE_TICKET", get("AUTO_CREATE_TICKET"), true)?,
            auto_send_to_crm: bool_or("AUTO_SEND_TO_CRM", get("AUTO_SEND_TO_CRM"), true)?,
            livechat,
            openai,
            crm,
            filter_rules,
        })
    }
}

/// Parses a boolean flag the way environment settings are usually written.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn bool_or(key: &str, raw: Option<String>, default: bool) -> Result<bool, String> {
    match raw {
        None => Ok(default),
        Some(v) => parse_bool(&v).ok_or_else(|| format!("{key}: invalid boolean '{v}'")),
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse::<T>().map_err(|e| format!("{key}: {e}")),
    }
}

fn json_or<T>(key: &str, raw: Option<String>) -> Result<Option<T>, String>
where
    T: serde::de::DeserializeOwned,
{
    raw.map(|v| serde_json::from_str(&v).map_err(|e| format!("{key}: invalid JSON: {e}")))
        .transpose()
}
