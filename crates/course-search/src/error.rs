//! Error Types for Course Search

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    /// Shown to the model as-is when a course filter resolves to nothing
    #[error("No course found matching '{0}'")]
    CourseNotFound(String),

    #[error("Invalid course document {path}: {reason}")]
    InvalidDocument { path: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SearchError> for rag_core::AgentError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Io(e) => Self::Io(e),
            other => Self::Other(other.to_string()),
        }
    }
}
