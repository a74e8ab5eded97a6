//! Course Assistant
//!
//! Ties the agent, the tool registry, the course store and the session store
//! together: one call to [`CourseAssistant::query`] answers one user question.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use rag_core::{Agent, Result, SessionId, SessionStore, Source, ToolRegistry};

use crate::ingest::{is_course_document, DocumentProcessor};
use crate::model::{Course, CourseAnalytics};
use crate::store::CourseStore;
use crate::svckit::{build_registry, CourseTool};

/// Answer to one query
#[derive(Clone, Debug)]
pub struct QueryOutcome {
    pub answer: String,
    pub sources: Vec<Source>,
    pub session_id: SessionId,
}

/// Course question answering over a shared store
pub struct CourseAssistant {
    agent: Agent,
    tools: ToolRegistry,
    store: Arc<dyn CourseStore>,
    sessions: Arc<dyn SessionStore>,
    processor: DocumentProcessor,
}

impl CourseAssistant {
    /// Build with the default tool set over `store`
    pub fn new(
        agent: Agent,
        store: Arc<dyn CourseStore>,
        sessions: Arc<dyn SessionStore>,
        processor: DocumentProcessor,
    ) -> Result<Self> {
        let tools = build_registry(CourseTool::all(&store))?;
        tracing::info!(tools = ?tools.names(), store = store.name(), "Course assistant ready");
        Ok(Self {
            agent,
            tools,
            store,
            sessions,
            processor,
        })
    }

    /// Answer `query`, creating a session when none is given.
    ///
    /// The exchange is recorded in the session only when an answer was
    /// produced; errors leave the history untouched.
    pub async fn query(&self, query: &str, session_id: Option<SessionId>) -> Result<QueryOutcome> {
        let session_id = match session_id {
            Some(id) => id,
            None => self.sessions.create_session()?,
        };
        let history = self.sessions.get_history(&session_id)?;

        let mut turn = self.tools.turn();
        turn.reset_sources();

        let answer = self
            .agent
            .generate(
                query,
                history.as_deref(),
                Some(self.tools.schemas()),
                Some(&mut turn),
            )
            .await?;

        let sources = turn.collect_sources();
        self.sessions.add_exchange(&session_id, query, &answer)?;

        tracing::debug!(session = %session_id, sources = sources.len(), "Query answered");
        Ok(QueryOutcome {
            answer,
            sources,
            session_id,
        })
    }

    /// Catalog summary
    pub async fn course_analytics(&self) -> Result<CourseAnalytics> {
        let course_titles = self.store.course_titles().await?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }

    /// Forget a session's history
    pub fn clear_session(&self, session_id: &SessionId) -> Result<()> {
        self.sessions.clear_session(session_id)
    }

    /// Ingest one course document; returns the course and its chunk count
    pub async fn add_course_document(&self, path: &Path) -> Result<(Course, usize)> {
        let parsed = self.processor.process_file(path).await?;
        let chunk_count = parsed.chunks.len();

        self.store.add_course(parsed.course.clone()).await?;
        self.store.add_chunks(parsed.chunks).await?;

        tracing::info!(course = %parsed.course.title, chunks = chunk_count, "Added course");
        Ok((parsed.course, chunk_count))
    }

    /// Ingest every course document in `folder`, skipping courses already in
    /// the catalog. Returns `(courses_added, chunks_added)`; a missing folder
    /// adds nothing.
    pub async fn add_course_folder(&self, folder: &Path, clear_existing: bool) -> Result<(usize, usize)> {
        if !tokio::fs::try_exists(folder).await.unwrap_or(false) {
            tracing::warn!(folder = %folder.display(), "Course folder does not exist");
            return Ok((0, 0));
        }

        if clear_existing {
            tracing::info!("Clearing existing course data");
            self.store.clear().await?;
        }

        let mut paths = Vec::new();
        let mut entries = tokio::fs::read_dir(folder).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && is_course_document(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut known: HashSet<String> = self.store.course_titles().await?.into_iter().collect();
        let mut courses = 0;
        let mut chunks = 0;

        for path in paths {
            let parsed = match self.processor.process_file(&path).await {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "Skipping course document");
                    continue;
                }
            };

            if !known.insert(parsed.course.title.clone()) {
                tracing::debug!(course = %parsed.course.title, "Course already loaded");
                continue;
            }

            chunks += parsed.chunks.len();
            courses += 1;
            self.store.add_course(parsed.course).await?;
            self.store.add_chunks(parsed.chunks).await?;
        }

        tracing::info!(courses, chunks, folder = %folder.display(), "Loaded course folder");
        Ok((courses, chunks))
    }

    pub fn store(&self) -> &Arc<dyn CourseStore> {
        &self.store
    }

    pub const fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub const fn agent(&self) -> &Agent {
        &self.agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_core::mock::ScriptedProvider;
    use rag_core::provider::Completion;
    use rag_core::session::SessionManager;
    use rag_core::{AgentBuilder, AgentError, ContentBlock, Role};
    use serde_json::json;

    use crate::model::{CourseChunk, Lesson};
    use crate::store::MemoryCourseStore;

    const TITLE: &str = "Building Towards Computer Use with Anthropic";
    const PROMPT: &str = "BASE";

    async fn seeded_store() -> Arc<dyn CourseStore> {
        let store = MemoryCourseStore::default();
        store
            .add_course(
                Course::new(TITLE).with_lesson(
                    Lesson::new(1, "Getting Started").with_link("https://example.com/lesson/1"),
                ),
            )
            .await
            .unwrap();
        store
            .add_chunks(vec![CourseChunk {
                content: "Course Building Towards Computer Use with Anthropic Lesson 1 content: \
                          In this lesson you make basic API calls to Claude."
                    .into(),
                course_title: TITLE.into(),
                lesson_number: Some(1),
                chunk_index: 0,
            }])
            .await
            .unwrap();
        Arc::new(store)
    }

    async fn assistant(provider: &Arc<ScriptedProvider>) -> (CourseAssistant, Arc<SessionManager>) {
        let agent = AgentBuilder::new()
            .provider(Arc::clone(provider) as _)
            .system_prompt(PROMPT)
            .build()
            .unwrap();
        let sessions = Arc::new(SessionManager::new(2));
        let assistant = CourseAssistant::new(
            agent,
            seeded_store().await,
            Arc::clone(&sessions) as _,
            DocumentProcessor::default(),
        )
        .unwrap();
        (assistant, sessions)
    }

    fn search_call(input: serde_json::Value) -> Completion {
        Completion::tool_use(vec![ContentBlock::ToolUse {
            id: "toolu_1".into(),
            name: "search_course_content".into(),
            input,
        }])
    }

    #[tokio::test]
    async fn test_lesson_one_end_to_end() {
        let provider = Arc::new(ScriptedProvider::with_responses([
            search_call(json!({"query": "API calls", "lesson_number": 1})),
            Completion::text("Lesson 1 covers making API calls to Claude."),
        ]));
        let (assistant, sessions) = assistant(&provider).await;

        let outcome = assistant
            .query("What does lesson 1 cover?", None)
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Lesson 1 covers making API calls to Claude.");
        assert_eq!(
            outcome.sources,
            vec![Source::new(
                format!("{TITLE} - Lesson 1"),
                Some("https://example.com/lesson/1".into())
            )]
        );

        let calls = provider.recorded_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].system, PROMPT);
        assert_eq!(calls[0].tools.as_ref().map(Vec::len), Some(1));

        let results = &calls[1].messages[2];
        assert_eq!(results.role, Role::User);
        match &results.blocks()[0] {
            ContentBlock::ToolResult { tool_use_id, content } => {
                assert_eq!(tool_use_id, "toolu_1");
                assert!(content.starts_with(&format!("[{TITLE} - Lesson 1]\n")));
            }
            other => panic!("expected tool result, got {other:?}"),
        }

        let history = sessions.get_history(&outcome.session_id).unwrap().unwrap();
        assert!(history.starts_with("User: What does lesson 1 cover?"));
    }

    #[tokio::test]
    async fn test_history_reaches_second_query() {
        let provider = Arc::new(ScriptedProvider::with_responses([
            Completion::text("Requests to Claude."),
            Completion::text("Yes, see lesson 1."),
        ]));
        let (assistant, _) = assistant(&provider).await;

        let first = assistant.query("What are API calls?", None).await.unwrap();
        assert!(first.sources.is_empty());

        let second = assistant
            .query("Any examples?", Some(first.session_id.clone()))
            .await
            .unwrap();
        assert_eq!(second.session_id, first.session_id);

        let calls = provider.recorded_calls();
        assert_eq!(calls[0].system, PROMPT);
        assert_eq!(
            calls[1].system,
            "BASE\n\nPrevious conversation:\nUser: What are API calls?\nAssistant: Requests to Claude."
        );
    }

    #[tokio::test]
    async fn test_sources_do_not_leak_between_queries() {
        let provider = Arc::new(ScriptedProvider::with_responses([
            search_call(json!({"query": "API calls"})),
            Completion::text("first"),
            Completion::text("second"),
        ]));
        let (assistant, _) = assistant(&provider).await;

        let first = assistant.query("q1", None).await.unwrap();
        let second = assistant.query("q2", None).await.unwrap();

        assert_eq!(first.sources.len(), 1);
        assert!(second.sources.is_empty());
    }

    #[tokio::test]
    async fn test_provider_error_skips_history() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.queue_error("boom");
        let (assistant, sessions) = assistant(&provider).await;
        let id = SessionId::from_string("s1");

        let err = assistant.query("q", Some(id.clone())).await.unwrap_err();
        assert!(matches!(err, AgentError::Provider(_)));
        assert_eq!(sessions.get_history(&id).unwrap(), None);
    }

    #[tokio::test]
    async fn test_course_analytics() {
        let provider = Arc::new(ScriptedProvider::new());
        let (assistant, _) = assistant(&provider).await;

        let analytics = assistant.course_analytics().await.unwrap();
        assert_eq!(analytics.total_courses, 1);
        assert_eq!(analytics.course_titles, vec![TITLE.to_owned()]);
    }

    #[tokio::test]
    async fn test_add_course_folder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("course1_script.txt"),
            "Course Title: Intro to MCP\nCourse Instructor: Elie\n\nLesson 0: Welcome\nMCP connects tools to models.\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("duplicate.txt"),
            "Course Title: Intro to MCP\n\nLesson 0: Again\nSame course twice.\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("slides.pdf"), "binary").unwrap();

        let provider = Arc::new(ScriptedProvider::new());
        let (assistant, _) = assistant(&provider).await;

        let (courses, chunks) = assistant.add_course_folder(dir.path(), false).await.unwrap();
        assert_eq!((courses, chunks), (1, 1));
        assert_eq!(assistant.course_analytics().await.unwrap().total_courses, 2);

        let (courses, _) = assistant.add_course_folder(dir.path(), true).await.unwrap();
        assert_eq!(courses, 1);
        assert_eq!(
            assistant.course_analytics().await.unwrap().course_titles,
            vec!["Intro to MCP".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_missing_folder_adds_nothing() {
        let provider = Arc::new(ScriptedProvider::new());
        let (assistant, _) = assistant(&provider).await;

        let added = assistant
            .add_course_folder(Path::new("/definitely/not/here"), false)
            .await
            .unwrap();
        assert_eq!(added, (0, 0));
    }
}
