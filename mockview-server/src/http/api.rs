//! REST API handlers

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use mockview_core::{
    AuthContext, Difficulty, InterviewError, InterviewType, Session, SessionStatus,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
    /// Number of open WebSocket connections
    pub active_connections: usize,
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let active_connections = state.connections.connection_count().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        active_connections,
    })
}

/// Error body returned by the REST API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: String,
}

/// An [`InterviewError`] rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub InterviewError);

impl From<InterviewError> for ApiError {
    fn from(err: InterviewError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterviewError::Validation(_) => StatusCode::BAD_REQUEST,
            InterviewError::Authentication(_) => StatusCode::UNAUTHORIZED,
            InterviewError::Authorization(_) => StatusCode::FORBIDDEN,
            InterviewError::NotFound(_) => StatusCode::NOT_FOUND,
            InterviewError::InvalidState(_) => StatusCode::CONFLICT,
            InterviewError::UpstreamAi(_) => StatusCode::BAD_GATEWAY,
            InterviewError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        let body = ErrorResponse {
            message: self.0.to_string(),
            code: self.0.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Query string for the interview list
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Defaults to `completed`
    pub status: Option<String>,
}

/// Summary of an interview for list views
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub interview_type: InterviewType,
    pub difficulty: Difficulty,
    pub status: SessionStatus,
    pub current_question_index: u32,
    pub total_questions: u32,
    pub overall_score: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<Session> for InterviewSummary {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            interview_type: session.interview_type,
            difficulty: session.difficulty,
            status: session.status,
            current_question_index: session.current_question_index,
            total_questions: session.total_questions,
            overall_score: session.overall_score,
            started_at: session.started_at,
            completed_at: session.completed_at,
        }
    }
}

/// Response for listing interviews
#[derive(Debug, Serialize, Deserialize)]
pub struct InterviewListResponse {
    pub interviews: Vec<InterviewSummary>,
}

/// List the caller's interviews in one status, newest first
pub async fn list_interviews(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<InterviewListResponse>, ApiError> {
    let user_id = auth
        .user_id()
        .ok_or_else(|| InterviewError::Authentication("Authentication required".to_string()))?;
    let status = match query.status.as_deref() {
        Some(raw) => raw.parse::<SessionStatus>()?,
        None => SessionStatus::Completed,
    };

    let sessions = state.service.list_sessions(user_id, status).await?;
    Ok(Json(InterviewListResponse {
        interviews: sessions.into_iter().map(InterviewSummary::from).collect(),
    }))
}
