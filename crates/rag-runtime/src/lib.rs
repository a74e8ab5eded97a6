//! # rag-runtime
//!
//! Runtime providers for the course assistant.
//!
//! ## Providers
//!
//! - **Anthropic** (default): Claude via the Messages API, with tool use
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rag_runtime::{AnthropicConfig, AnthropicProvider};
//!
//! let provider = AnthropicProvider::from_config(AnthropicConfig::from_env())?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .build()?;
//! ```

#[cfg(feature = "anthropic")]
pub mod anthropic;

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicConfig, AnthropicProvider, PLACEHOLDER_API_KEY};

// Re-export core types for convenience
pub use rag_core::{Agent, AgentError, LlmProvider, Message, Result, Role, Tool, ToolRegistry};
