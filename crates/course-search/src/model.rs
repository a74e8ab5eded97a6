//! Domain Models
//!
//! Course catalog entries, the text chunks that are searched, and the hits a
//! search returns.

use serde::{Deserialize, Serialize};

/// A lesson inside a course
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    /// Number as written in the course document (usually starts at 0)
    pub lesson_number: u32,

    pub title: String,

    pub lesson_link: Option<String>,
}

impl Lesson {
    pub fn new(lesson_number: u32, title: impl Into<String>) -> Self {
        Self {
            lesson_number,
            title: title.into(),
            lesson_link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.lesson_link = Some(link.into());
        self
    }
}

/// A course; the title doubles as its unique id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,

    pub course_link: Option<String>,

    pub instructor: Option<String>,

    pub lessons: Vec<Lesson>,
}

impl Course {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            course_link: None,
            instructor: None,
            lessons: Vec::new(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.course_link = Some(link.into());
        self
    }

    pub fn with_instructor(mut self, instructor: impl Into<String>) -> Self {
        self.instructor = Some(instructor.into());
        self
    }

    pub fn with_lesson(mut self, lesson: Lesson) -> Self {
        self.lessons.push(lesson);
        self
    }

    /// Find a lesson by number
    pub fn lesson(&self, lesson_number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.lesson_number == lesson_number)
    }
}

/// A searchable slice of course text
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseChunk {
    pub content: String,

    pub course_title: String,

    /// `None` for text that precedes the first lesson marker
    pub lesson_number: Option<u32>,

    /// Position of the chunk within its course
    pub chunk_index: usize,
}

/// One search result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: String,

    pub course_title: String,

    pub lesson_number: Option<u32>,

    /// Higher is better, always > 0
    pub relevance: f32,
}

impl SearchHit {
    /// Citation label: "Course Title - Lesson N", or just the title
    pub fn label(&self) -> String {
        match self.lesson_number {
            Some(n) => format!("{} - Lesson {n}", self.course_title),
            None => self.course_title.clone(),
        }
    }
}

/// Parameters of a content search
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,

    /// Partial or approximate course title
    #[serde(default)]
    pub course_name: Option<String>,

    /// Exact lesson filter
    #[serde(default)]
    pub lesson_number: Option<u32>,

    /// Overrides the store's default result limit
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn in_course(mut self, course_name: impl Into<String>) -> Self {
        self.course_name = Some(course_name.into());
        self
    }

    pub const fn in_lesson(mut self, lesson_number: u32) -> Self {
        self.lesson_number = Some(lesson_number);
        self
    }

    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Catalog summary reported by the courses endpoint
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}
