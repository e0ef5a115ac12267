use thiserror::Error;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("Failed to parse request: {0}")]
    ParseError(String),

    #[error("Failed to access LiveChat API: {0}")]
    LiveChatError(String),

    #[error("Failed to access OpenAI API: {0}")]
    OpenAIError(String),

    #[error("Failed to deliver to CRM: {0}")]
    CrmError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Failed to interact with AWS services: {0}")]
    AwsError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("{0}")]
    GeneralError(String),
}

impl From<reqwest::Error> for SummaryError {
    fn from(error: reqwest::Error) -> Self {
        SummaryError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for SummaryError {
    fn from(error: serde_json::Error) -> Self {
        SummaryError::ParseError(error.to_string())
    }
}

impl From<anyhow::Error> for SummaryError {
    fn from(error: anyhow::Error) -> Self {
        SummaryError::GeneralError(error.to_string())
    }
}
