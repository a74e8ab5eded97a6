//! Course Search Tool
//!
//! Searches course content and returns the hits as citeable text blocks,
//! together with one source per hit.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use rag_core::{Result as CoreResult, Source, Tool, ToolOutput, ToolSpec};

use crate::model::{SearchHit, SearchQuery};
use crate::store::CourseStore;

/// Name the model uses to call the search tool
pub const SEARCH_TOOL_NAME: &str = "search_course_content";

/// Arguments the model passes to the search tool
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct SearchArgs {
    pub query: String,

    #[serde(default)]
    pub course_name: Option<String>,

    #[serde(default)]
    pub lesson_number: Option<u32>,
}

/// A blank `course_name` means no course filter
impl From<SearchArgs> for SearchQuery {
    fn from(args: SearchArgs) -> Self {
        Self {
            query: args.query,
            course_name: args.course_name.filter(|name| !name.trim().is_empty()),
            lesson_number: args.lesson_number,
            limit: None,
        }
    }
}

/// Tool for searching course materials
pub struct CourseSearchTool {
    store: Arc<dyn CourseStore>,
}

impl CourseSearchTool {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }

    /// Search and format; store failures come back as text
    pub async fn execute(&self, args: SearchArgs) -> ToolOutput {
        let query = SearchQuery::from(args);

        let hits = match self.store.search(&query).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::debug!(error = %e, "Course search returned an error");
                return ToolOutput::text(e.to_string());
            }
        };

        if hits.is_empty() {
            return ToolOutput::text(no_results_message(&query));
        }

        let mut blocks = Vec::with_capacity(hits.len());
        let mut sources = Vec::with_capacity(hits.len());
        for hit in &hits {
            blocks.push(format!("{}\n{}", header(hit), hit.content));
            sources.push(Source::new(hit.label(), self.link_for(hit).await));
        }

        ToolOutput::text(blocks.join("\n\n")).with_sources(sources)
    }

    /// Lesson link for lesson hits, course link otherwise; lookup failures
    /// leave the source without a link
    async fn link_for(&self, hit: &SearchHit) -> Option<String> {
        let link = match hit.lesson_number {
            Some(n) => self.store.lesson_link(&hit.course_title, n).await,
            None => self.store.course_link(&hit.course_title).await,
        };
        link.unwrap_or_else(|e| {
            tracing::warn!(course = %hit.course_title, error = %e, "Link lookup failed");
            None
        })
    }
}

fn header(hit: &SearchHit) -> String {
    match hit.lesson_number {
        Some(n) => format!("[{} - Lesson {n}]", hit.course_title),
        None => format!("[{}]", hit.course_title),
    }
}

/// "No relevant content found", qualified with the filters that were applied
pub fn no_results_message(query: &SearchQuery) -> String {
    let mut message = String::from("No relevant content found");
    if let Some(course) = &query.course_name {
        message.push_str(&format!(" in course '{course}'"));
    }
    if let Some(lesson) = query.lesson_number {
        message.push_str(&format!(" in lesson {lesson}"));
    }
    message.push('.');
    message
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: SEARCH_TOOL_NAME.into(),
            description: "Search course materials with smart course name matching and lesson filtering".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for in the course content"
                    },
                    "course_name": {
                        "type": "string",
                        "description": "Course title (partial matches work, e.g. 'MCP', 'Introduction')"
                    },
                    "lesson_number": {
                        "type": "integer",
                        "description": "Specific lesson number to search within (e.g. 1, 2, 3)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn invoke(&self, input: &serde_json::Value) -> CoreResult<ToolOutput> {
        match serde_json::from_value::<SearchArgs>(input.clone()) {
            Ok(args) => Ok(self.execute(args).await),
            Err(e) => {
                tracing::warn!(error = %e, "Malformed search arguments");
                Ok(ToolOutput::text(format!("Invalid search arguments: {e}")))
            }
        }
    }
}
