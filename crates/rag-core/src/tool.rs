//! Tool System
//!
//! Tools are registered once at startup and shared read-only across queries.
//! A tool returns its citations alongside its text ([`ToolOutput`]); the
//! per-turn [`TurnDispatch`] collects them, so concurrent queries never share
//! mutable source state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Tool definition handed to the LLM (name, description, JSON input schema)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM)
    pub description: String,

    /// JSON Schema object with `properties` and `required`
    pub input_schema: serde_json::Value,
}

/// A citation shown to the end user next to an answer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Label such as "Course Title - Lesson 2"
    pub text: String,

    /// Lesson or course URL, when known
    pub link: Option<String>,
}

impl Source {
    pub fn new(text: impl Into<String>, link: Option<String>) -> Self {
        Self {
            text: text.into(),
            link,
        }
    }
}

/// What a tool invocation produced
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Text handed back to the model (may describe a failure)
    pub content: String,

    /// Citations for this invocation, in result order
    pub sources: Vec<Source>,
}

impl ToolOutput {
    /// Plain text output with no citations
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }
}

/// Tool trait - implement to add new capabilities
///
/// Data conditions (no results, bad filters, backend errors the model should
/// see) belong in [`ToolOutput::content`]. An `Err` means the tool itself is
/// broken and is propagated to the caller untouched.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for LLM function calling
    fn spec(&self) -> ToolSpec;

    /// Run the tool with the raw JSON input from the model
    async fn invoke(&self, input: &serde_json::Value) -> Result<ToolOutput>;
}

/// Text returned for a tool name nobody registered
pub fn tool_not_found(name: &str) -> String {
    format!("Tool '{name}' not found")
}

/// Registry for available tools, kept in registration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    specs: Vec<ToolSpec>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_shared(Arc::new(tool))
    }

    /// Register a shared tool. A name that is already taken is rejected.
    pub fn register_shared(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let spec = tool.spec();
        if self.index.contains_key(&spec.name) {
            return Err(AgentError::DuplicateTool(spec.name));
        }
        self.index.insert(spec.name.clone(), self.tools.len());
        self.specs.push(spec);
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&idx| Arc::clone(&self.tools[idx]))
    }

    /// Tool schemas for the LLM call, in registration order
    pub fn schemas(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// Get tool names
    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool by name.
    ///
    /// An unknown name is answered with a "not found" text so the model can
    /// recover; errors raised inside a tool are returned unchanged.
    pub async fn dispatch(&self, name: &str, input: &serde_json::Value) -> Result<ToolOutput> {
        match self.index.get(name) {
            Some(&idx) => self.tools[idx].invoke(input).await,
            None => {
                tracing::warn!(tool = %name, "Model requested an unregistered tool");
                Ok(ToolOutput::text(tool_not_found(name)))
            }
        }
    }

    /// Start a dispatch session for one external query
    pub fn turn(&self) -> TurnDispatch<'_> {
        TurnDispatch {
            registry: self,
            sources: vec![Vec::new(); self.tools.len()],
        }
    }
}

/// Something that can execute the tool calls the model asks for.
#[async_trait]
pub trait ToolDispatcher: Send {
    /// Execute one tool call and return the text for its result block
    async fn dispatch(&mut self, name: &str, input: &serde_json::Value) -> Result<String>;
}

/// Per-query view of a [`ToolRegistry`] that accumulates sources.
///
/// For each tool only its latest invocation that produced citations is kept;
/// across tools, sources are concatenated in registration order.
pub struct TurnDispatch<'a> {
    registry: &'a ToolRegistry,
    sources: Vec<Vec<Source>>,
}

impl TurnDispatch<'_> {
    /// Forget everything collected so far
    pub fn reset_sources(&mut self) {
        self.sources.iter_mut().for_each(Vec::clear);
    }

    /// Sources gathered during this turn
    pub fn collect_sources(&self) -> Vec<Source> {
        self.sources.iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl ToolDispatcher for TurnDispatch<'_> {
    async fn dispatch(&mut self, name: &str, input: &serde_json::Value) -> Result<String> {
        let Some(&idx) = self.registry.index.get(name) else {
            return self.registry.dispatch(name, input).await.map(|out| out.content);
        };

        let output = self.registry.tools[idx].invoke(input).await?;
        if !output.sources.is_empty() {
            self.sources[idx] = output.sources;
        }
        Ok(output.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "echo".into(),
                description: "Echo the query back".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"query": {"type": "string"}},
                    "required": ["query"]
                }),
            }
        }

        async fn invoke(&self, input: &serde_json::Value) -> Result<ToolOutput> {
            let query = input["query"].as_str().unwrap_or_default();
            Ok(ToolOutput::text(query)
                .with_sources(vec![Source::new(format!("echo: {query}"), None)]))
        }
    }

    struct SilentTool;

    #[async_trait]
    impl Tool for SilentTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "silent".into(),
                description: "Never cites anything".into(),
                input_schema: json!({"type": "object", "properties": {}, "required": []}),
            }
        }

        async fn invoke(&self, _input: &serde_json::Value) -> Result<ToolOutput> {
            Ok(ToolOutput::text("nothing to see"))
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "broken".into(),
                description: "Always fails".into(),
                input_schema: json!({"type": "object", "properties": {}, "required": []}),
            }
        }

        async fn invoke(&self, _input: &serde_json::Value) -> Result<ToolOutput> {
            Err(AgentError::ToolExecution("index corrupted".into()))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool).unwrap();
        registry.register(SilentTool).unwrap();
        registry.register(BrokenTool).unwrap();
        registry
    }

    #[test]
    fn test_tool_registry() {
        let registry = registry();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(), vec!["echo", "silent", "broken"]);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("unknown").is_none());
        assert_eq!(registry.schemas()[0].input_schema["required"], json!(["query"]));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = registry();
        let err = registry.register(EchoTool).unwrap_err();
        assert!(matches!(err, AgentError::DuplicateTool(name) if name == "echo"));
        assert_eq!(registry.len(), 3);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let registry = registry();
        let output = registry.dispatch("nonexistent_tool", &json!({"query": "x"})).await.unwrap();
        assert!(output.content.contains("not found"));
        assert_eq!(output.content, "Tool 'nonexistent_tool' not found");
    }

    #[tokio::test]
    async fn test_dispatch_propagates_tool_errors() {
        let registry = registry();
        let mut turn = registry.turn();
        let err = turn.dispatch("broken", &json!({})).await.unwrap_err();
        assert!(matches!(err, AgentError::ToolExecution(_)));
    }

    #[tokio::test]
    async fn test_turn_keeps_latest_sources() {
        let registry = registry();
        let mut turn = registry.turn();

        turn.dispatch("echo", &json!({"query": "first"})).await.unwrap();
        turn.dispatch("echo", &json!({"query": "second"})).await.unwrap();
        turn.dispatch("silent", &json!({})).await.unwrap();

        let sources = turn.collect_sources();
        assert_eq!(sources, vec![Source::new("echo: second", None)]);
    }

    #[tokio::test]
    async fn test_reset_then_collect_is_empty() {
        let registry = registry();
        let mut turn = registry.turn();
        turn.dispatch("echo", &json!({"query": "API"})).await.unwrap();

        turn.reset_sources();
        assert!(turn.collect_sources().is_empty());
    }

    #[tokio::test]
    async fn test_turns_are_independent() {
        let registry = registry();
        let mut first = registry.turn();
        let second = registry.turn();

        first.dispatch("echo", &json!({"query": "API"})).await.unwrap();
        assert_eq!(first.collect_sources().len(), 1);
        assert!(second.collect_sources().is_empty());
    }
}
