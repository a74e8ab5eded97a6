//! Server Configuration
//!
//! Everything is read from the environment (after `.env` is loaded), with
//! defaults that match a local checkout: documents in `../docs`, the
//! frontend in `../frontend`.

use std::path::PathBuf;
use std::str::FromStr;

use course_search::ingest::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use course_search::store::DEFAULT_MAX_RESULTS;
use rag_core::provider::DEFAULT_MODEL;
use rag_core::reasoning::DEFAULT_MAX_ROUNDS;
use rag_core::session::DEFAULT_MAX_HISTORY;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub docs_path: PathBuf,
    pub frontend_dir: PathBuf,

    /// Claude model id
    pub model: String,
    /// Tool rounds per query before the forced final answer
    pub max_tool_rounds: usize,

    pub max_results: usize,
    pub max_history: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".into(),
            docs_path: PathBuf::from("../docs"),
            frontend_dir: PathBuf::from("../frontend"),
            model: DEFAULT_MODEL.into(),
            max_tool_rounds: DEFAULT_MAX_ROUNDS,
            max_results: DEFAULT_MAX_RESULTS,
            max_history: DEFAULT_MAX_HISTORY,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Parsed value of `key`, or `default` when unset or unparsable
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env_or("BIND_ADDR", defaults.bind_addr),
            docs_path: env_or("DOCS_PATH", defaults.docs_path),
            frontend_dir: env_or("FRONTEND_DIR", defaults.frontend_dir),
            model: env_or("ANTHROPIC_MODEL", defaults.model),
            max_tool_rounds: env_or("MAX_TOOL_ROUNDS", defaults.max_tool_rounds),
            max_results: env_or("MAX_RESULTS", defaults.max_results),
            max_history: env_or("MAX_HISTORY", defaults.max_history),
            chunk_size: env_or("CHUNK_SIZE", defaults.chunk_size),
            chunk_overlap: env_or("CHUNK_OVERLAP", defaults.chunk_overlap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert_eq!(config.max_tool_rounds, 2);
        assert_eq!(config.max_results, 5);
        assert_eq!(config.max_history, 2);
        assert_eq!(config.chunk_size, 800);
        assert_eq!(config.chunk_overlap, 100);
    }

    #[test]
    fn test_unset_key_uses_default() {
        assert_eq!(env_or("RAG_SERVER_TEST_UNSET_KEY", 7usize), 7);
    }
}
