//! Error types for mockview-core

use thiserror::Error;

/// Failure of an interview command
///
/// Every variant maps to a stable code carried on the wire alongside the
/// human-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterviewError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("AI service error: {0}")]
    UpstreamAi(String),

    #[error("Failed to save interview session: {0}")]
    Persistence(String),
}

impl InterviewError {
    /// Stable wire code for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            InterviewError::Validation(_) => "VALIDATION_ERROR",
            InterviewError::Authentication(_) => "AUTHENTICATION_ERROR",
            InterviewError::Authorization(_) => "AUTHORIZATION_ERROR",
            InterviewError::NotFound(_) => "NOT_FOUND",
            InterviewError::InvalidState(_) => "INVALID_STATE",
            InterviewError::UpstreamAi(_) => "UPSTREAM_AI_ERROR",
            InterviewError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }

    pub fn session_not_found() -> Self {
        InterviewError::NotFound("Interview session not found".to_string())
    }
}

impl From<StoreError> for InterviewError {
    fn from(err: StoreError) -> Self {
        InterviewError::Persistence(err.to_string())
    }
}

/// Errors from a session store backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    #[error("version conflict on session {id}: expected {expected}, found {found}")]
    VersionConflict { id: String, expected: u64, found: u64 },

    #[error("session already exists: {0}")]
    Duplicate(String),

    #[error("session not found in store: {0}")]
    Missing(String),
}

impl StoreError {
    /// Transient failures worth one retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
