//! Tool Orchestration Loop
//!
//! Drives the model through a bounded number of "think, optionally search,
//! think again" rounds:
//!
//! ```text
//! AWAITING_MODEL ──text──────────────────────────────▶ DONE
//!       │
//!       └─tool_use─▶ TOOL_ROUND (append request + results) ─▶ AWAITING_MODEL
//!
//! after max_rounds tool rounds ──▶ FINAL_NO_TOOLS (schemas withheld) ──▶ DONE
//! ```
//!
//! The model call is stateless, so the message log replayed on each call is the
//! only memory the model has of what it already asked for and received. The
//! log is append-only: the user's query, then one assistant tool-request
//! message and one user tool-result message per round.

use std::sync::Arc;

use crate::error::{AgentError, Result};
use crate::message::{ContentBlock, Conversation, Message};
use crate::provider::{Completion, CompletionRequest, GenerationOptions, LlmProvider};
use crate::tool::{ToolDispatcher, ToolSpec};

/// Returned when the model asks for tools but nobody can run them
pub const NO_DISPATCHER_MESSAGE: &str =
    "Unable to process tool requests - tool manager not available";

/// Returned when not a single model call was made
pub const NO_RESPONSE_MESSAGE: &str = "No response generated";

/// Default tool-round budget per query
pub const DEFAULT_MAX_ROUNDS: usize = 2;

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Base instructions sent as system content
    pub system_prompt: String,

    /// Number of model calls that may request tools before the forced
    /// tools-free answer
    pub max_rounds: usize,

    /// Generation options
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            generation: GenerationOptions::default(),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. Use the available \
tools when a question needs information you do not have, then answer concisely.";

/// Runs one query through the model with optional tool use
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(provider: Arc<dyn LlmProvider>, config: AgentConfig) -> Self {
        Self { provider, config }
    }

    /// System content for every call of one query. History is appended only
    /// when there is some.
    fn system_content(&self, history: Option<&str>) -> String {
        match history {
            Some(history) if !history.is_empty() => format!(
                "{}\n\nPrevious conversation:\n{}",
                self.config.system_prompt, history
            ),
            _ => self.config.system_prompt.clone(),
        }
    }

    /// Answer `query`, letting the model call tools for up to
    /// `max_rounds` rounds.
    ///
    /// Schemas are offered only when `tools` is non-empty. Provider errors and
    /// errors raised inside tools are returned unchanged; a missing
    /// dispatcher is answered with [`NO_DISPATCHER_MESSAGE`].
    pub async fn generate(
        &self,
        query: &str,
        history: Option<&str>,
        tools: Option<&[ToolSpec]>,
        mut dispatcher: Option<&mut dyn ToolDispatcher>,
    ) -> Result<String> {
        let system = self.system_content(history);
        let tools = tools.filter(|tools| !tools.is_empty());
        let mut conversation = Conversation::seeded(query);
        let mut last: Option<Completion> = None;

        for round in 0..self.config.max_rounds {
            let mut request = CompletionRequest::new(&system, conversation.messages());
            if let Some(tools) = tools {
                request = request.with_tools(tools);
            }

            let completion = self
                .provider
                .complete(&request, &self.config.generation)
                .await?;

            if !completion.wants_tools() {
                tracing::debug!(
                    provider = self.provider.name(),
                    round,
                    "Model answered with text"
                );
                return Ok(completion.text_content());
            }

            let Some(dispatcher) = dispatcher.as_deref_mut() else {
                tracing::warn!(round, "Tool use requested without a dispatcher");
                return Ok(NO_DISPATCHER_MESSAGE.into());
            };

            conversation.push(Message::assistant_blocks(completion.content.clone()));
            let results = execute_tools(&completion, dispatcher).await?;
            tracing::debug!(round, calls = results.len(), "Tool round complete");
            conversation.push(Message::tool_results(results));

            last = Some(completion);
        }

        match last {
            Some(completion) if completion.wants_tools() => {
                tracing::info!(
                    provider = self.provider.name(),
                    max_rounds = self.config.max_rounds,
                    "Tool round budget exhausted, requesting final answer without tools"
                );
                // Any tool_use blocks in this response are ignored: no schemas
                // were offered, so only the text is meaningful.
                let request = CompletionRequest::new(&system, conversation.messages());
                let final_completion = self
                    .provider
                    .complete(&request, &self.config.generation)
                    .await?;
                Ok(final_completion.text_content())
            }
            Some(completion) => Ok(completion.text_content()),
            None => Ok(NO_RESPONSE_MESSAGE.into()),
        }
    }

    /// Answer without history or tools
    pub async fn ask(&self, question: &str) -> Result<String> {
        self.generate(question, None, None, None).await
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Run every tool request of `completion` in order, one result block each.
async fn execute_tools(
    completion: &Completion,
    dispatcher: &mut dyn ToolDispatcher,
) -> Result<Vec<ContentBlock>> {
    let mut results = Vec::new();
    for block in completion.tool_uses() {
        if let ContentBlock::ToolUse { id, name, input } = block {
            tracing::debug!(tool = %name, id = %id, "Executing tool");
            let output = dispatcher.dispatch(name, input).await?;
            results.push(ContentBlock::tool_result(id.clone(), output));
        }
    }
    Ok(results)
}

/// Builder for Agent configuration
#[derive(Default)]
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    config: AgentConfig,
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub fn max_tokens(mut self, max: u32) -> Self {
        self.config.generation.max_tokens = max;
        self
    }

    pub fn max_rounds(mut self, max: usize) -> Self {
        self.config.max_rounds = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(provider, self.config))
    }
}
