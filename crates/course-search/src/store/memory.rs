//! In-Memory Course Store
//!
//! Keyword-overlap retrieval over chunks held in memory. Good enough for a
//! handful of course documents and fully deterministic, which keeps tests
//! simple.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CourseStore, DEFAULT_MAX_RESULTS};
use crate::error::{Result, SearchError};
use crate::model::{Course, CourseChunk, SearchHit, SearchQuery};

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "about", "as", "at", "be", "by", "can", "do", "does", "for", "from",
    "how", "i", "in", "is", "it", "me", "of", "on", "or", "tell", "that", "the", "this", "to",
    "was", "what", "when", "where", "which", "who", "why", "with", "you",
];

#[derive(Default)]
struct Catalog {
    courses: Vec<Course>,
    chunks: Vec<CourseChunk>,
}

impl Catalog {
    fn course(&self, title: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.title == title)
    }

    /// Best catalog title for a user-supplied course name
    fn resolve_course(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }

        let titles = || self.courses.iter().map(|c| c.title.as_str());

        if let Some(exact) = titles().find(|t| t.to_lowercase() == wanted) {
            return Some(exact);
        }
        if let Some(partial) = titles().find(|t| {
            let title = t.to_lowercase();
            title.contains(&wanted) || wanted.contains(&title)
        }) {
            return Some(partial);
        }

        let wanted_terms = tokenize(&wanted);
        titles()
            .map(|t| {
                let title_terms: HashSet<String> = tokenize(t).into_iter().collect();
                let shared = wanted_terms.iter().filter(|w| title_terms.contains(*w)).count();
                (t, shared)
            })
            .filter(|(_, shared)| *shared > 0)
            .max_by_key(|(_, shared)| *shared)
            .map(|(t, _)| t)
    }
}

/// Lowercased alphanumeric words
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Distinct query terms, stopwords removed unless nothing else is left
fn query_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let all: Vec<String> = tokenize(query)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect();
    let meaningful: Vec<String> = all
        .iter()
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .cloned()
        .collect();
    if meaningful.is_empty() { all } else { meaningful }
}

/// Fraction of query terms present, nudged by how often they occur
#[allow(clippy::cast_precision_loss)]
fn score(terms: &[String], content: &str) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let words = tokenize(content);
    let mut matched = 0usize;
    let mut occurrences = 0usize;
    for term in terms {
        let count = words.iter().filter(|w| *w == term).count();
        if count > 0 {
            matched += 1;
            occurrences += count;
        }
    }
    if matched == 0 {
        return 0.0;
    }
    matched as f32 / terms.len() as f32 + occurrences as f32 / (words.len() as f32 + 1.0)
}

/// Course store kept entirely in memory
pub struct MemoryCourseStore {
    catalog: RwLock<Catalog>,
    max_results: usize,
}

impl Default for MemoryCourseStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULTS)
    }
}

impl MemoryCourseStore {
    pub fn new(max_results: usize) -> Self {
        Self {
            catalog: RwLock::new(Catalog::default()),
            max_results,
        }
    }

    pub const fn max_results(&self) -> usize {
        self.max_results
    }

    /// Number of stored chunks
    pub async fn chunk_count(&self) -> usize {
        self.catalog.read().await.chunks.len()
    }
}

#[async_trait]
impl CourseStore for MemoryCourseStore {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let catalog = self.catalog.read().await;

        let course_filter = match query.course_name.as_deref() {
            Some(name) => Some(
                catalog
                    .resolve_course(name)
                    .ok_or_else(|| SearchError::CourseNotFound(name.to_owned()))?
                    .to_owned(),
            ),
            None => None,
        };

        let terms = query_terms(&query.query);
        let limit = query.limit.unwrap_or(self.max_results);

        let mut hits: Vec<SearchHit> = catalog
            .chunks
            .iter()
            .filter(|c| course_filter.as_deref().is_none_or(|t| c.course_title == t))
            .filter(|c| query.lesson_number.is_none_or(|n| c.lesson_number == Some(n)))
            .filter_map(|c| {
                let relevance = score(&terms, &c.content);
                (relevance > 0.0).then(|| SearchHit {
                    content: c.content.clone(),
                    course_title: c.course_title.clone(),
                    lesson_number: c.lesson_number,
                    relevance,
                })
            })
            .collect();

        // Stable: equal scores keep document order
        hits.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
        hits.truncate(limit);

        tracing::debug!(
            query = %query.query,
            course = ?course_filter,
            lesson = ?query.lesson_number,
            hits = hits.len(),
            "Searched course content"
        );
        Ok(hits)
    }

    async fn add_course(&self, course: Course) -> Result<()> {
        let mut catalog = self.catalog.write().await;
        match catalog.courses.iter_mut().find(|c| c.title == course.title) {
            Some(existing) => *existing = course,
            None => catalog.courses.push(course),
        }
        Ok(())
    }

    async fn add_chunks(&self, chunks: Vec<CourseChunk>) -> Result<()> {
        self.catalog.write().await.chunks.extend(chunks);
        Ok(())
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.courses.iter().map(|c| c.title.clone()).collect())
    }

    async fn course_link(&self, course_title: &str) -> Result<Option<String>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.course(course_title).and_then(|c| c.course_link.clone()))
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .course(course_title)
            .and_then(|c| c.lesson(lesson_number))
            .and_then(|l| l.lesson_link.clone()))
    }

    async fn clear(&self) -> Result<()> {
        let mut catalog = self.catalog.write().await;
        catalog.courses.clear();
        catalog.chunks.clear();
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Lesson;

    const TITLE: &str = "Building Towards Computer Use with Anthropic";

    fn chunk(content: &str, lesson: Option<u32>, index: usize) -> CourseChunk {
        CourseChunk {
            content: content.into(),
            course_title: TITLE.into(),
            lesson_number: lesson,
            chunk_index: index,
        }
    }

    async fn populated() -> MemoryCourseStore {
        let store = MemoryCourseStore::default();
        store
            .add_course(
                Course::new(TITLE)
                    .with_link("https://example.com/course")
                    .with_instructor("Colt Steele")
                    .with_lesson(Lesson::new(0, "Introduction"))
                    .with_lesson(
                        Lesson::new(1, "Getting Started").with_link("https://example.com/lesson/1"),
                    ),
            )
            .await
            .unwrap();
        store
            .add_chunks(vec![
                chunk("Welcome to the course, built in partnership with Anthropic.", Some(0), 0),
                chunk("This course covers tool calling and prompt caching.", Some(0), 1),
                chunk("In this lesson you make basic API calls to Claude.", Some(1), 2),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_search_ranks_matching_chunks() {
        let store = populated().await;
        let hits = store.search(&SearchQuery::new("API calls")).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].lesson_number, Some(1));
        assert!(hits[0].relevance > 0.0);
    }

    #[tokio::test]
    async fn test_lesson_filter_is_exact() {
        let store = populated().await;
        let hits = store
            .search(&SearchQuery::new("course").in_lesson(999))
            .await
            .unwrap();
        assert!(hits.is_empty());

        let hits = store
            .search(&SearchQuery::new("course").in_lesson(0))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.lesson_number == Some(0)));
    }

    #[tokio::test]
    async fn test_partial_course_name_resolves() {
        let store = populated().await;
        let hits = store
            .search(&SearchQuery::new("Claude").in_course("computer use"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].course_title, TITLE);
    }

    #[tokio::test]
    async fn test_unknown_course_name() {
        let store = populated().await;
        let err = store
            .search(&SearchQuery::new("Claude").in_course("Quantum Knitting"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No course found matching 'Quantum Knitting'");
    }

    #[tokio::test]
    async fn test_limit() {
        let store = populated().await;
        let hits = store
            .search(&SearchQuery::new("course lesson").with_limit(1))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_links() {
        let store = populated().await;
        assert_eq!(
            store.lesson_link(TITLE, 1).await.unwrap().as_deref(),
            Some("https://example.com/lesson/1")
        );
        assert_eq!(store.lesson_link(TITLE, 0).await.unwrap(), None);
        assert_eq!(
            store.course_link(TITLE).await.unwrap().as_deref(),
            Some("https://example.com/course")
        );
        assert_eq!(store.course_link("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = populated().await;
        store.clear().await.unwrap();
        assert_eq!(store.course_count().await.unwrap(), 0);
        assert_eq!(store.chunk_count().await, 0);
    }

    #[test]
    fn test_stopwords_only_query_still_searches() {
        assert_eq!(query_terms("what is it"), vec!["what", "is", "it"]);
        assert_eq!(query_terms("What is MCP?"), vec!["mcp"]);
    }
}
