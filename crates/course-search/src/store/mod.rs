//! Course Store
//!
//! Abstraction over where course metadata and searchable chunks live.

mod memory;

pub use memory::MemoryCourseStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Course, CourseChunk, SearchHit, SearchQuery};

/// Results returned per search unless configured otherwise
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Course store trait (Strategy pattern)
///
/// Implement this for each backend: in-memory, a vector database, etc.
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Ranked content search.
    ///
    /// `course_name` is resolved against the catalog with partial matching and
    /// fails with [`crate::SearchError::CourseNotFound`] when nothing matches;
    /// `lesson_number` is an exact filter. Every hit has relevance > 0.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>>;

    /// Add or replace a course's catalog entry
    async fn add_course(&self, course: Course) -> Result<()>;

    /// Add searchable chunks
    async fn add_chunks(&self, chunks: Vec<CourseChunk>) -> Result<()>;

    /// Catalog titles in insertion order
    async fn course_titles(&self) -> Result<Vec<String>>;

    /// Number of courses in the catalog
    async fn course_count(&self) -> Result<usize> {
        Ok(self.course_titles().await?.len())
    }

    /// Link of a course, if it has one
    async fn course_link(&self, course_title: &str) -> Result<Option<String>>;

    /// Link of one lesson, if it has one
    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>>;

    /// Drop every course and chunk
    async fn clear(&self) -> Result<()>;

    /// Store name
    fn name(&self) -> &str;
}
