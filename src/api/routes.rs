//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::rag::RagSystem;

use super::types::{
    CourseStats, ErrorDetail, HealthResponse, QueryRequest, QueryResponse, SessionCleared,
};

/// Shared application state.
pub struct AppState {
    pub rag: RagSystem,
}

type ApiError = (StatusCode, Json<ErrorDetail>);

fn internal_error<E: std::fmt::Display>(err: E) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorDetail {
            detail: err.to_string(),
        }),
    )
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/query", post(query_documents))
        .route("/api/courses", get(get_course_stats))
        .route("/api/session/:session_id", delete(clear_session))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// POST /api/query - Answer a question, optionally within a session.
async fn query_documents(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    // Missing or malformed bodies are a validation failure, not a 4xx zoo.
    let Json(request) = payload.map_err(|rejection| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorDetail {
                detail: rejection.body_text(),
            }),
        )
    })?;

    let session_id = match request.session_id {
        Some(id) => id,
        None => state.rag.session_manager().create_session().await,
    };

    let (answer, sources) = state
        .rag
        .query(&request.query, Some(&session_id))
        .await
        .map_err(internal_error)?;

    Ok(Json(QueryResponse {
        answer,
        sources,
        session_id,
    }))
}

/// GET /api/courses - Course catalog statistics.
async fn get_course_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CourseStats>, ApiError> {
    let analytics = state
        .rag
        .get_course_analytics()
        .await
        .map_err(internal_error)?;

    Ok(Json(CourseStats {
        total_courses: analytics.total_courses,
        course_titles: analytics.course_titles,
    }))
}

/// DELETE /api/session/{session_id} - Drop a session's history.
///
/// Idempotent: deleting an unknown id still reports ok.
async fn clear_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Json<SessionCleared> {
    state.rag.session_manager().clear_session(&session_id).await;
    Json(SessionCleared {
        status: "ok".to_string(),
    })
}

/// GET /api/health - Liveness probe.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
