//! Application State

use std::sync::Arc;

use course_search::CourseAssistant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Question answering, catalog and sessions
    pub assistant: Arc<CourseAssistant>,
}

impl AppState {
    pub fn new(assistant: CourseAssistant) -> Self {
        Self {
            assistant: Arc::new(assistant),
        }
    }
}
