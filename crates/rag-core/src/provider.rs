//! LLM Provider Strategy Pattern
//!
//! Defines the interface the orchestration loop uses to talk to a model
//! backend. A completion returns content blocks and a stop reason; when the
//! stop reason is [`StopReason::ToolUse`] the blocks carry tool requests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rag_core::provider::{CompletionRequest, GenerationOptions, LlmProvider};
//!
//! let provider = AnthropicProvider::from_env()?;
//! let request = CompletionRequest::new(system, conversation.messages());
//! let completion = provider.complete(&request, &options).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::{ContentBlock, Message};
use crate::tool::ToolSpec;

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "claude-sonnet-4-20250514")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

const fn default_temperature() -> f32 {
    0.0
}
const fn default_max_tokens() -> u32 {
    800
}

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// How the model may pick tools when schemas are supplied
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    /// Model decides whether to call a tool
    Auto,
}

/// One stateless call to the model.
#[derive(Clone, Debug)]
pub struct CompletionRequest<'a> {
    /// System content for this call
    pub system: &'a str,

    /// Full replayed message log
    pub messages: &'a [Message],

    /// Tool schemas; `None` forces a text-only answer
    pub tools: Option<&'a [ToolSpec]>,

    /// Tool selection policy, only meaningful with `tools`
    pub tool_choice: Option<ToolChoice>,
}

impl<'a> CompletionRequest<'a> {
    pub const fn new(system: &'a str, messages: &'a [Message]) -> Self {
        Self {
            system,
            messages,
            tools: None,
            tool_choice: None,
        }
    }

    /// Offer tools and let the model choose whether to use them
    pub fn with_tools(mut self, tools: &'a [ToolSpec]) -> Self {
        self.tools = Some(tools);
        self.tool_choice = Some(ToolChoice::Auto);
        self
    }
}

/// Token usage statistics
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Reason the model stopped generating
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    #[serde(other)]
    Other,
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// Content blocks in the order the model produced them
    pub content: Vec<ContentBlock>,

    /// Model that generated this response
    pub model: String,

    /// Token usage statistics (if available)
    pub usage: Option<TokenUsage>,

    /// Why generation stopped
    pub stop_reason: StopReason,
}

impl Completion {
    /// Text-only completion
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::text(text)],
            model: String::new(),
            usage: None,
            stop_reason: StopReason::EndTurn,
        }
    }

    /// Completion requesting the given tool calls
    pub fn tool_use(blocks: Vec<ContentBlock>) -> Self {
        Self {
            content: blocks,
            model: String::new(),
            usage: None,
            stop_reason: StopReason::ToolUse,
        }
    }

    /// Whether the model is asking for tools
    pub fn wants_tools(&self) -> bool {
        self.stop_reason == StopReason::ToolUse
    }

    /// All text blocks joined in order
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Tool-use blocks in the order presented
    pub fn tool_uses(&self) -> impl Iterator<Item = &ContentBlock> {
        self.content.iter().filter(|block| block.is_tool_use())
    }
}

/// Strategy trait for LLM providers
///
/// Implement this trait to add support for new LLM backends.
/// The orchestration loop works exclusively through this interface.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logs and health output
    fn name(&self) -> &str;

    /// Generate a completion. Transport, auth and rate-limit failures are
    /// returned as errors and never retried by callers in this crate.
    async fn complete(
        &self,
        request: &CompletionRequest<'_>,
        options: &GenerationOptions,
    ) -> Result<Completion>;
}
