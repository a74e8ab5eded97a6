//! # course-search
//!
//! Course materials retrieval for the course assistant: the course catalog,
//! document ingestion, the `search_course_content` tool and the
//! [`CourseAssistant`] that answers questions with it.
//!
//! ## Query flow
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────────┐   ┌─────────────┐
//! │ Course       │──▶│ Agent       │──▶│ CourseSearchTool │──▶│ CourseStore │
//! │ Assistant    │   │ (tool loop) │   │ (via registry)   │   │             │
//! └──────────────┘   └─────────────┘   └──────────────────┘   └─────────────┘
//!        │                                                            │
//!        └──── session history                   hits + lesson links ─┘
//! ```

pub mod assistant;
pub mod error;
pub mod ingest;
pub mod model;
pub mod store;
pub mod svckit;

pub use assistant::{CourseAssistant, QueryOutcome};
pub use error::{Result, SearchError};
pub use ingest::DocumentProcessor;
pub use model::{Course, CourseAnalytics, CourseChunk, Lesson, SearchHit, SearchQuery};
pub use store::{CourseStore, MemoryCourseStore};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{build_registry, CourseSearchTool, CourseTool, SEARCH_TOOL_NAME};
}

/// System prompt for the course assistant agent
pub const COURSE_ASSISTANT_PROMPT: &str = r"You are an AI assistant specialized in course materials and educational content with access to a comprehensive search tool for course information.

Search Tool Usage:
- Use the search tool **only** for questions about specific course content or detailed educational materials
- You may search again when the first results are not enough to answer
- Synthesize search results into accurate, fact-based responses
- If search yields no results, state this clearly without offering alternatives

Response Protocol:
- **General knowledge questions**: Answer using existing knowledge without searching
- **Course-specific questions**: Search first, then answer (more than one search is fine)
- **No meta-commentary**:
  - Provide direct answers only: no reasoning process, search explanations, or question-type analysis
  - Do not mention the search results or say 'based on the search results'

All responses must be:
1. **Brief and focused** - Get to the point quickly
2. **Educational** - Maintain instructional value
3. **Clear** - Use accessible language
4. **Example-supported** - Include relevant examples when they aid understanding

Provide only the direct answer to what was asked.";
