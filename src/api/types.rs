//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::tools::Source;

/// Request to answer a question.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    /// The natural-language question
    pub query: String,

    /// Session to thread conversation history through (minted if absent)
    pub session_id: Option<String>,
}

/// Response carrying the answer and its provenance.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// The synthesized answer
    pub answer: String,

    /// Provenance of the content the answer drew upon
    pub sources: Vec<Source>,

    /// Session id the exchange was recorded under
    pub session_id: String,
}

/// Course catalog statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CourseStats {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// Acknowledgement for session deletion.
#[derive(Debug, Clone, Serialize)]
pub struct SessionCleared {
    pub status: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Error body for non-2xx responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}
