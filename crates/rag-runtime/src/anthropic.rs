//! Anthropic LLM Provider
//!
//! Implementation of `LlmProvider` over the Anthropic Messages API. The core
//! message types already serialize in the Messages API shape, so requests are
//! built by borrowing them directly.

use std::time::Duration;

use async_trait::async_trait;
use rag_core::{
    error::{AgentError, Result},
    message::{ContentBlock, Message},
    provider::{
        Completion, CompletionRequest, GenerationOptions, LlmProvider, StopReason, TokenUsage,
        ToolChoice,
    },
    tool::ToolSpec,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Value shipped in `.env.example`; treated the same as a missing key.
pub const PLACEHOLDER_API_KEY: &str = "your-anthropic-api-key-here";

/// Anthropic provider configuration
#[derive(Clone)]
pub struct AnthropicConfig {
    /// API key sent as `x-api-key`
    pub api_key: String,

    /// Base URL, overridable for proxies
    pub base_url: String,

    /// `anthropic-version` header
    pub api_version: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.anthropic.com".into(),
            api_version: "2023-06-01".into(),
            timeout_secs: 120,
        }
    }
}

impl AnthropicConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            base_url: std::env::var("ANTHROPIC_BASE_URL").unwrap_or(defaults.base_url),
            api_version: defaults.api_version,
            timeout_secs: std::env::var("ANTHROPIC_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    /// Whether a usable key is configured
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty() && self.api_key != PLACEHOLDER_API_KEY
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

// ── Wire types ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSpec]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a ToolChoice>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
    model: String,
    stop_reason: Option<StopReason>,
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

fn build_request<'a>(
    request: &'a CompletionRequest<'a>,
    options: &'a GenerationOptions,
) -> MessagesRequest<'a> {
    let tools = request.tools.filter(|tools| !tools.is_empty());
    MessagesRequest {
        model: &options.model,
        max_tokens: options.max_tokens,
        temperature: options.temperature,
        system: request.system,
        messages: request.messages,
        tools,
        tool_choice: tools.and(request.tool_choice.as_ref()),
    }
}

fn convert_response(response: MessagesResponse) -> Completion {
    let content = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => Some(ContentBlock::Text { text }),
            ResponseBlock::ToolUse { id, name, input } => {
                Some(ContentBlock::ToolUse { id, name, input })
            }
            ResponseBlock::Unsupported => None,
        })
        .collect();

    Completion {
        content,
        model: response.model,
        usage: response.usage.map(|u| TokenUsage {
            input_tokens: u.input_tokens,
            output_tokens: u.output_tokens,
        }),
        stop_reason: response.stop_reason.unwrap_or(StopReason::EndTurn),
    }
}

fn convert_error(status: StatusCode, body: &str) -> AgentError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {status}"));

    match status.as_u16() {
        401 | 403 => AgentError::Auth(message),
        429 => AgentError::RateLimited(message),
        500..=599 => AgentError::ProviderUnavailable(message),
        _ => AgentError::Provider(message),
    }
}

/// Anthropic Claude provider
pub struct AnthropicProvider {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    /// Create from configuration
    pub fn from_config(config: AnthropicConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(AnthropicConfig::from_env())
    }

    pub const fn config(&self) -> &AnthropicConfig {
        &self.config
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "Anthropic"
    }

    async fn complete(
        &self,
        request: &CompletionRequest<'_>,
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let body = build_request(request, options);
        tracing::debug!(
            model = %options.model,
            messages = request.messages.len(),
            tools = body.tools.map_or(0, <[ToolSpec]>::len),
            "Sending Anthropic request"
        );

        let response = self
            .client
            .post(self.config.messages_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    AgentError::ProviderUnavailable(e.to_string())
                } else {
                    AgentError::Provider(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = convert_error(status, &body);
            tracing::warn!(%status, error = %err, "Anthropic request failed");
            return Err(err);
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(format!("Failed to parse Anthropic response: {e}")))?;

        Ok(convert_response(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_spec() -> Vec<ToolSpec> {
        vec![ToolSpec {
            name: "search_course_content".into(),
            description: "Search course materials".into(),
            input_schema: json!({"type": "object", "properties": {}, "required": []}),
        }]
    }

    #[test]
    fn test_config_defaults() {
        let config = AnthropicConfig::default();
        assert_eq!(config.base_url, "https://api.anthropic.com");
        assert_eq!(config.api_version, "2023-06-01");
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_placeholder_key_is_not_a_key() {
        let config = AnthropicConfig {
            api_key: PLACEHOLDER_API_KEY.into(),
            ..Default::default()
        };
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_real_key_is_a_key() {
        let config = AnthropicConfig {
            api_key: "sk-ant-real".into(),
            ..Default::default()
        };
        assert!(config.has_api_key());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = AnthropicConfig {
            api_key: "sk-ant-secret".into(),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("sk-ant-secret"));
    }

    #[test]
    fn test_messages_url_trims_slash() {
        let config = AnthropicConfig {
            base_url: "http://proxy.local/".into(),
            ..Default::default()
        };
        assert_eq!(config.messages_url(), "http://proxy.local/v1/messages");
    }

    #[test]
    fn test_request_with_tools() {
        let messages = vec![Message::user("What is MCP?")];
        let tools = search_spec();
        let request = CompletionRequest::new("BASE", &messages).with_tools(&tools);
        let options = GenerationOptions::default();

        let value = serde_json::to_value(build_request(&request, &options)).unwrap();
        assert_eq!(value["system"], "BASE");
        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["max_tokens"], 800);
        assert_eq!(value["messages"][0], json!({"role": "user", "content": "What is MCP?"}));
        assert_eq!(value["tools"][0]["name"], "search_course_content");
        assert_eq!(value["tool_choice"], json!({"type": "auto"}));
    }

    #[test]
    fn test_request_without_tools_omits_fields() {
        let messages = vec![Message::user("hi")];
        let request = CompletionRequest::new("BASE", &messages);
        let options = GenerationOptions::default();

        let value = serde_json::to_value(build_request(&request, &options)).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
    }

    #[test]
    fn test_convert_tool_use_response() {
        let raw = json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-20250514",
            "content": [
                {"type": "thinking", "thinking": "hmm", "signature": "x"},
                {"type": "text", "text": "Searching."},
                {"type": "tool_use", "id": "toolu_1", "name": "search_course_content",
                 "input": {"query": "MCP", "lesson_number": 1}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 12, "output_tokens": 7}
        });
        let parsed: MessagesResponse = serde_json::from_value(raw).unwrap();
        let completion = convert_response(parsed);

        assert!(completion.wants_tools());
        assert_eq!(completion.content.len(), 2);
        assert_eq!(completion.text_content(), "Searching.");
        assert_eq!(
            completion.usage,
            Some(TokenUsage {
                input_tokens: 12,
                output_tokens: 7
            })
        );
    }

    #[test]
    fn test_error_mapping() {
        let body = r#"{"type":"error","error":{"type":"rate_limit_error","message":"slow down"}}"#;
        assert!(matches!(
            convert_error(StatusCode::TOO_MANY_REQUESTS, body),
            AgentError::RateLimited(m) if m == "slow down"
        ));
        assert!(matches!(
            convert_error(StatusCode::UNAUTHORIZED, "{}"),
            AgentError::Auth(_)
        ));
        assert!(matches!(
            convert_error(StatusCode::from_u16(529).unwrap(), "overloaded"),
            AgentError::ProviderUnavailable(_)
        ));
        assert!(matches!(
            convert_error(StatusCode::BAD_REQUEST, "{}"),
            AgentError::Provider(_)
        ));
    }
}
