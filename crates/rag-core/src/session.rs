//! Session Management
//!
//! Keeps a short, bounded history of query/answer exchanges per session and
//! renders it as the text block injected into the system content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{AgentError, Result};

/// Unique session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One question and the answer given to it
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exchange {
    pub query: String,
    pub answer: String,
    pub at: DateTime<Utc>,
}

/// A conversation session holding its most recent exchanges
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier
    pub id: SessionId,

    /// Oldest first
    pub exchanges: VecDeque<Exchange>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create with specific ID
    pub fn with_id(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            exchanges: VecDeque::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the activity timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Append an exchange, dropping the oldest beyond `max_exchanges`
    pub fn record(&mut self, query: &str, answer: &str, max_exchanges: usize) {
        self.exchanges.push_back(Exchange {
            query: query.to_owned(),
            answer: answer.to_owned(),
            at: Utc::now(),
        });
        while self.exchanges.len() > max_exchanges {
            self.exchanges.pop_front();
        }
        self.touch();
    }

    /// `User: ...` / `Assistant: ...` lines, oldest first; `None` when empty
    pub fn format_history(&self) -> Option<String> {
        if self.exchanges.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .exchanges
            .iter()
            .flat_map(|e| [format!("User: {}", e.query), format!("Assistant: {}", e.answer)])
            .collect();
        Some(lines.join("\n"))
    }
}

/// Session history store
pub trait SessionStore: Send + Sync {
    /// Create an empty session and return its id
    fn create_session(&self) -> Result<SessionId>;

    /// Record an exchange, creating the session if it does not exist yet
    fn add_exchange(&self, id: &SessionId, query: &str, answer: &str) -> Result<()>;

    /// Formatted history, `None` for unknown or empty sessions
    fn get_history(&self, id: &SessionId) -> Result<Option<String>>;

    /// Forget a session entirely. Unknown ids are not an error.
    fn clear_session(&self, id: &SessionId) -> Result<()>;
}

/// In-memory bounded session store
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, Session>>,
    max_history: usize,
}

/// Exchanges kept per session unless configured otherwise
pub const DEFAULT_MAX_HISTORY: usize = 2;

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history,
        }
    }

    /// Number of known sessions
    pub fn session_count(&self) -> usize {
        self.sessions.read().map_or(0, |s| s.len())
    }
}

fn poisoned<T>(_: T) -> AgentError {
    AgentError::Session("session store lock poisoned".into())
}

impl SessionStore for SessionManager {
    fn create_session(&self) -> Result<SessionId> {
        let id = SessionId::new();
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions.insert(id.clone(), Session::with_id(id.clone()));
        tracing::debug!(session = %id, "Created session");
        Ok(id)
    }

    fn add_exchange(&self, id: &SessionId, query: &str, answer: &str) -> Result<()> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        sessions
            .entry(id.clone())
            .or_insert_with(|| Session::with_id(id.clone()))
            .record(query, answer, self.max_history);
        Ok(())
    }

    fn get_history(&self, id: &SessionId) -> Result<Option<String>> {
        let sessions = self.sessions.read().map_err(poisoned)?;
        Ok(sessions.get(id).and_then(Session::format_history))
    }

    fn clear_session(&self, id: &SessionId) -> Result<()> {
        self.sessions.write().map_err(poisoned)?.remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let store = SessionManager::default();
        let id = store.create_session().unwrap();
        assert_eq!(store.session_count(), 1);
        assert_eq!(store.get_history(&id).unwrap(), None);
    }

    #[test]
    fn test_history_format() {
        let store = SessionManager::new(2);
        let id = SessionId::from_string("s1");
        store.add_exchange(&id, "What are API calls?", "Requests to Claude.").unwrap();

        assert_eq!(
            store.get_history(&id).unwrap().unwrap(),
            "User: What are API calls?\nAssistant: Requests to Claude."
        );
    }

    #[test]
    fn test_history_is_bounded() {
        let store = SessionManager::new(2);
        let id = store.create_session().unwrap();
        for i in 1..=3 {
            store.add_exchange(&id, &format!("q{i}"), &format!("a{i}")).unwrap();
        }

        let history = store.get_history(&id).unwrap().unwrap();
        assert!(!history.contains("q1"));
        assert!(history.starts_with("User: q2"));
        assert!(history.ends_with("Assistant: a3"));
    }

    #[test]
    fn test_unknown_session() {
        let store = SessionManager::default();
        let id = SessionId::from_string("missing");
        assert_eq!(store.get_history(&id).unwrap(), None);
        assert!(store.clear_session(&id).is_ok());
    }

    #[test]
    fn test_clear_session() {
        let store = SessionManager::default();
        let id = store.create_session().unwrap();
        store.add_exchange(&id, "q", "a").unwrap();

        store.clear_session(&id).unwrap();
        assert_eq!(store.get_history(&id).unwrap(), None);
        assert_eq!(store.session_count(), 0);

        // A cleared id starts over when reused
        store.add_exchange(&id, "q2", "a2").unwrap();
        assert_eq!(store.get_history(&id).unwrap().as_deref(), Some("User: q2\nAssistant: a2"));
    }
}
