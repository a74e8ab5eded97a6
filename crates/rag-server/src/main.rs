//! Course materials assistant HTTP server
//!
//! Axum-based server answering questions about course documents with Claude
//! and a course search tool, and serving the static frontend.

mod config;
mod handlers;
mod state;

use std::path::Path;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use course_search::{
    CourseAssistant, CourseStore, DocumentProcessor, MemoryCourseStore, COURSE_ASSISTANT_PROMPT,
};
use rag_core::{AgentBuilder, SessionManager};
use rag_runtime::{AnthropicConfig, AnthropicProvider, PLACEHOLDER_API_KEY};

use crate::config::ServerConfig;
use crate::handlers::{clear_session, course_stats, health_check, query_handler};
use crate::state::AppState;

/// API routes plus the frontend as fallback
fn router(state: AppState, frontend_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/query", post(query_handler))
        .route("/api/courses", get(course_stats))
        .route("/api/session/clear", post(clear_session))
        .fallback_service(ServeDir::new(frontend_dir).append_index_html_on_directories(true))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn warn_about_api_key(config: &AnthropicConfig) {
    if config.has_api_key() {
        return;
    }
    if config.api_key == PLACEHOLDER_API_KEY {
        tracing::warn!("⚠ ANTHROPIC_API_KEY is still the placeholder value");
        tracing::warn!("  Replace it in .env with a real key from https://console.anthropic.com/");
    } else {
        tracing::warn!("⚠ ANTHROPIC_API_KEY is not configured - queries will fail");
        tracing::warn!("  Add ANTHROPIC_API_KEY=sk-ant-... to .env and restart");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    // Initialize LLM provider
    let anthropic = AnthropicConfig::from_env();
    warn_about_api_key(&anthropic);
    let provider = Arc::new(AnthropicProvider::from_config(anthropic)?);

    let agent = AgentBuilder::new()
        .provider(provider)
        .system_prompt(COURSE_ASSISTANT_PROMPT)
        .model(config.model.clone())
        .max_rounds(config.max_tool_rounds)
        .build()?;

    // Course store, sessions and the assistant on top of them
    let store: Arc<dyn CourseStore> = Arc::new(MemoryCourseStore::new(config.max_results));
    let sessions = Arc::new(SessionManager::new(config.max_history));
    let assistant = CourseAssistant::new(
        agent,
        store,
        sessions,
        DocumentProcessor::new(config.chunk_size, config.chunk_overlap),
    )?;

    tracing::info!("Loading course documents from {}", config.docs_path.display());
    match assistant.add_course_folder(&config.docs_path, false).await {
        Ok((courses, chunks)) => {
            tracing::info!("✓ Loaded {} courses with {} chunks", courses, chunks);
        }
        Err(e) => tracing::error!("Error loading documents: {}", e),
    }

    let app = router(AppState::new(assistant), &config.frontend_dir);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 course assistant running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health             - Health check");
    tracing::info!("  POST /api/query          - Ask about the courses");
    tracing::info!("  GET  /api/courses        - Course catalog stats");
    tracing::info!("  POST /api/session/clear  - Clear a conversation");
    tracing::info!("  GET  /                   - Frontend ({})", config.frontend_dir.display());
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
