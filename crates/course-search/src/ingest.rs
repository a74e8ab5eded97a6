//! Course Document Ingestion
//!
//! Course documents are plain text with a small header followed by lesson
//! sections:
//!
//! ```text
//! Course Title: Building Towards Computer Use with Anthropic
//! Course Link: https://www.deeplearning.ai/short-courses/...
//! Course Instructor: Colt Steele
//!
//! Lesson 0: Introduction
//! Lesson Link: https://learn.deeplearning.ai/...
//! Welcome to Building Toward Computer Use with Anthropic. ...
//!
//! Lesson 1: Getting Started with Claude API
//! ...
//! ```
//!
//! Lesson text is split into sentence-aligned chunks of at most `chunk_size`
//! characters, with roughly `chunk_overlap` characters repeated between
//! neighbouring chunks.

use std::path::Path;

use crate::error::{Result, SearchError};
use crate::model::{Course, CourseChunk, Lesson};

pub const DEFAULT_CHUNK_SIZE: usize = 800;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// File extensions picked up when loading a folder
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// A parsed course and its chunks
#[derive(Clone, Debug)]
pub struct ParsedCourse {
    pub course: Course,
    pub chunks: Vec<CourseChunk>,
}

/// Splits course documents into catalog entries and searchable chunks
#[derive(Clone, Debug)]
pub struct DocumentProcessor {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split normalized text after `.`, `!` or `?` followed by whitespace
fn split_sentences(text: &str) -> Vec<String> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = normalized.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|n| n.is_whitespace()) {
            sentences.push(current.trim().to_owned());
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_owned());
    }
    sentences
}

fn header_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let (name, value) = line.split_once(':')?;
    name.trim()
        .eq_ignore_ascii_case(key)
        .then_some(value.trim())
        .filter(|v| !v.is_empty())
}

/// `Lesson <n>: <title>` marker, keyword in any case
fn lesson_marker(line: &str) -> Option<(u32, String)> {
    let (keyword, rest) = line.trim().split_once(' ')?;
    if !keyword.eq_ignore_ascii_case("lesson") {
        return None;
    }
    let (number, title) = rest.split_once(':')?;
    let number = number.trim().parse().ok()?;
    Some((number, title.trim().to_owned()))
}

impl DocumentProcessor {
    pub const fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Sentence-aligned chunks; a sentence longer than `chunk_size` becomes a
    /// chunk of its own.
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let sentences = split_sentences(text);
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < sentences.len() {
            let mut size = 0;
            let mut end = start;
            while end < sentences.len() {
                let separator = usize::from(end > start);
                let len = char_len(&sentences[end]);
                if end > start && size + separator + len > self.chunk_size {
                    break;
                }
                size += separator + len;
                end += 1;
            }

            chunks.push(sentences[start..end].join(" "));
            if end >= sentences.len() {
                break;
            }

            // Carry trailing sentences into the next chunk while they fit the overlap
            let mut overlap = 0;
            let mut carried = 0;
            for sentence in sentences[start..end].iter().rev() {
                let len = char_len(sentence) + usize::from(overlap > 0);
                if overlap + len > self.chunk_overlap {
                    break;
                }
                overlap += len;
                carried += 1;
            }

            start = (end - carried).max(start + 1);
        }

        chunks
    }

    /// Parse one course document.
    ///
    /// `fallback_title` is used when the document has no `Course Title:` line.
    pub fn process_text(&self, text: &str, fallback_title: &str) -> Result<ParsedCourse> {
        let mut lines = text.lines().peekable();
        let mut course = Course::new(fallback_title);
        let mut preamble = Vec::new();

        // Header: leading non-lesson lines
        while let Some(line) = lines.next_if(|l| lesson_marker(l).is_none()) {
            if let Some(title) = header_value(line, "Course Title") {
                course.title = title.to_owned();
            } else if let Some(link) = header_value(line, "Course Link") {
                course.course_link = Some(link.to_owned());
            } else if let Some(instructor) = header_value(line, "Course Instructor") {
                course.instructor = Some(instructor.to_owned());
            } else {
                preamble.push(line);
            }
        }

        if course.title.trim().is_empty() {
            return Err(SearchError::InvalidDocument {
                path: fallback_title.to_owned(),
                reason: "missing course title".into(),
            });
        }

        // Lesson sections
        let mut sections: Vec<(Lesson, Vec<&str>)> = Vec::new();
        for line in lines {
            if let Some((number, title)) = lesson_marker(line) {
                sections.push((Lesson::new(number, title), Vec::new()));
            } else if let Some((lesson, body)) = sections.last_mut() {
                match header_value(line, "Lesson Link") {
                    Some(link) if body.is_empty() && lesson.lesson_link.is_none() => {
                        lesson.lesson_link = Some(link.to_owned());
                    }
                    _ => body.push(line),
                }
            }
        }

        let mut chunks = Vec::new();
        if sections.is_empty() {
            // No lesson markers: index the non-header text as course-level text
            for content in self.chunk_text(&preamble.join("\n")) {
                chunks.push(CourseChunk {
                    content,
                    course_title: course.title.clone(),
                    lesson_number: None,
                    chunk_index: chunks.len(),
                });
            }
        }

        for (lesson, body) in sections {
            for (i, content) in self.chunk_text(&body.join("\n")).into_iter().enumerate() {
                let content = if i == 0 {
                    format!(
                        "Course {} Lesson {} content: {content}",
                        course.title, lesson.lesson_number
                    )
                } else {
                    content
                };
                chunks.push(CourseChunk {
                    content,
                    course_title: course.title.clone(),
                    lesson_number: Some(lesson.lesson_number),
                    chunk_index: chunks.len(),
                });
            }
            course.lessons.push(lesson);
        }

        Ok(ParsedCourse { course, chunks })
    }

    /// Read and parse a course document from disk
    pub async fn process_file(&self, path: &Path) -> Result<ParsedCourse> {
        let text = tokio::fs::read_to_string(path).await?;
        let fallback = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.process_text(&text, &fallback).map_err(|e| match e {
            SearchError::InvalidDocument { reason, .. } => SearchError::InvalidDocument {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }
}

/// Whether a path looks like a course document
pub fn is_course_document(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.iter().any(|s| s.eq_ignore_ascii_case(e)))
}
