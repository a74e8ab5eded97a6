//! # rag-core
//!
//! Provider-agnostic question answering with bounded tool use.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Agent                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Bounded    │  │    Tool     │  │   LlmProvider       │  │
//! │  │ Tool Loop   │──│  Registry   │──│   (Strategy)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait keeps the loop independent of the model backend;
//! `ToolRegistry` maps the names the model uses onto registered tools, and
//! `TurnDispatch` collects the citations produced during one query.

pub mod error;
pub mod message;
pub mod mock;
pub mod provider;
pub mod reasoning;
pub mod session;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{ContentBlock, Conversation, Message, MessageContent, Role};
pub use provider::{Completion, CompletionRequest, GenerationOptions, LlmProvider, StopReason};
pub use reasoning::{Agent, AgentBuilder, AgentConfig};
pub use session::{SessionId, SessionManager, SessionStore};
pub use tool::{Source, Tool, ToolDispatcher, ToolOutput, ToolRegistry, ToolSpec, TurnDispatch};
