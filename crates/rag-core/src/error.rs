//! Error Types

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that escape the orchestration loop.
///
/// Conditions the model or the end user is expected to react to (no search
/// hits, unknown tool, store failures, a missing dispatcher) are returned as
/// ordinary text and never show up here.
#[derive(Error, Debug)]
pub enum AgentError {
    /// LLM provider rejected or failed the request
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Rate limited by the provider
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Provider answered with something we could not interpret
    #[error("Parse error: {0}")]
    Parse(String),

    /// Two tools registered under the same name
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    /// A tool implementation failed while running
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Convert to a message safe to show an end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            Self::RateLimited(_) => "Too many requests. Please wait a moment.".into(),
            Self::Auth(_) => "The AI service is not configured correctly.".into(),
            _ => "An unexpected error occurred while answering your question.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_hides_detail() {
        let err = AgentError::Provider("invalid x-api-key sk-ant-123".into());
        assert!(!err.user_message().contains("sk-ant"));
    }
}
