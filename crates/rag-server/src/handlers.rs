//! HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use rag_core::{AgentError, SessionId};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub courses_loaded: usize,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<String>,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CourseStats {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionClearRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClearResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Log the real error, answer with a message that is safe to show
fn internal_error(code: &'static str) -> impl FnOnce(AgentError) -> ApiError {
    move |e| {
        tracing::error!(code, "Request failed: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.user_message(),
                code: code.into(),
            }),
        )
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let courses_loaded = state
        .assistant
        .course_analytics()
        .await
        .map_or(0, |a| a.total_courses);

    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        courses_loaded,
    })
}

/// Answer a question about the course materials
pub async fn query_handler(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if payload.query.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Query must not be empty".into(),
                code: "EMPTY_QUERY".into(),
            }),
        ));
    }

    let session_id = payload
        .session_id
        .filter(|id| !id.trim().is_empty())
        .map(SessionId::from_string);

    let outcome = state
        .assistant
        .query(&payload.query, session_id)
        .await
        .map_err(internal_error("QUERY_ERROR"))?;

    Ok(Json(QueryResponse {
        answer: outcome.answer,
        sources: outcome.sources.into_iter().map(|s| s.text).collect(),
        session_id: outcome.session_id.to_string(),
    }))
}

/// Course catalog statistics
pub async fn course_stats(State(state): State<AppState>) -> Result<Json<CourseStats>, ApiError> {
    let analytics = state
        .assistant
        .course_analytics()
        .await
        .map_err(internal_error("CATALOG_ERROR"))?;

    Ok(Json(CourseStats {
        total_courses: analytics.total_courses,
        course_titles: analytics.course_titles,
    }))
}

/// Forget a conversation session
pub async fn clear_session(
    State(state): State<AppState>,
    Json(payload): Json<SessionClearRequest>,
) -> Json<SessionClearResponse> {
    let id = SessionId::from_string(&payload.session_id);
    match state.assistant.clear_session(&id) {
        Ok(()) => Json(SessionClearResponse {
            success: true,
            message: format!("Session {} cleared successfully", payload.session_id),
        }),
        Err(e) => {
            tracing::warn!(session = %payload.session_id, "Failed to clear session: {}", e);
            Json(SessionClearResponse {
                success: false,
                message: format!("Error clearing session: {}", e.user_message()),
            })
        }
    }
}
