//! Scripted provider for tests.
//!
//! [`ScriptedProvider`] replays a queue of completions (or errors) and records
//! every request it receives, so tests can assert how many calls were made,
//! which messages were replayed and whether tool schemas were offered.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::{AgentError, Result};
use crate::message::Message;
use crate::provider::{Completion, CompletionRequest, GenerationOptions, LlmProvider, ToolChoice};
use crate::tool::ToolSpec;

/// Owned copy of a [`CompletionRequest`]
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub tools: Option<Vec<ToolSpec>>,
    pub tool_choice: Option<ToolChoice>,
}

/// Queue-based fake provider
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<std::result::Result<Completion, String>>>,
    calls: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that answers with the given completions in order
    pub fn with_responses(responses: impl IntoIterator<Item = Completion>) -> Self {
        let provider = Self::new();
        for response in responses {
            provider.queue_response(response);
        }
        provider
    }

    pub fn queue_response(&self, completion: Completion) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(completion));
    }

    /// Next call fails with [`AgentError::Provider`]
    pub fn queue_error(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(message.into()));
    }

    /// Every request seen so far
    pub fn recorded_calls(&self) -> Vec<RecordedRequest> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: &CompletionRequest<'_>,
        _options: &GenerationOptions,
    ) -> Result<Completion> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                system: request.system.to_owned(),
                messages: request.messages.to_vec(),
                tools: request.tools.map(<[ToolSpec]>::to_vec),
                tool_choice: request.tool_choice.clone(),
            });

        let next = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(Ok(completion)) => Ok(completion),
            Some(Err(message)) => Err(AgentError::Provider(message)),
            None => Err(AgentError::Other("scripted provider ran out of responses".into())),
        }
    }
}
