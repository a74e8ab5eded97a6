//! Service Kit - Agent Tools
//!
//! Domain-specific tools that implement `rag_core::Tool` for the course
//! assistant.

mod content_search;

use std::sync::Arc;

use rag_core::{Result as CoreResult, Tool, ToolRegistry};

pub use content_search::{CourseSearchTool, SearchArgs, SEARCH_TOOL_NAME};

use crate::store::CourseStore;

/// Every tool the course assistant can offer the model
pub enum CourseTool {
    Search(CourseSearchTool),
}

impl CourseTool {
    /// The default tool set over one store
    pub fn all(store: &Arc<dyn CourseStore>) -> Vec<Self> {
        vec![Self::Search(CourseSearchTool::new(Arc::clone(store)))]
    }

    fn into_shared(self) -> Arc<dyn Tool> {
        match self {
            Self::Search(tool) => Arc::new(tool),
        }
    }
}

/// Register `tools` in order, failing on the first duplicate name
pub fn build_registry(tools: impl IntoIterator<Item = CourseTool>) -> CoreResult<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    for tool in tools {
        registry.register_shared(tool.into_shared())?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCourseStore;

    #[test]
    fn test_registry_holds_search_tool() {
        let store: Arc<dyn CourseStore> = Arc::new(MemoryCourseStore::default());
        let registry = build_registry(CourseTool::all(&store)).unwrap();

        assert_eq!(registry.names(), vec![SEARCH_TOOL_NAME]);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let store: Arc<dyn CourseStore> = Arc::new(MemoryCourseStore::default());
        let tools = CourseTool::all(&store).into_iter().chain(CourseTool::all(&store));

        assert!(matches!(
            build_registry(tools),
            Err(rag_core::AgentError::DuplicateTool(name)) if name == SEARCH_TOOL_NAME
        ));
    }
}
