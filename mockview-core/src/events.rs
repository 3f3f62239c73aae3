//! Outbound interview events
//!
//! The service produces these in order onto an [`EventSink`]; the server
//! turns each one into a wire message for the connection that owns it.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::InterviewError;
use crate::session::{Evaluation, FinalReport, Question};

/// Channel the service writes events to
pub type EventSink = mpsc::UnboundedSender<InterviewEvent>;

/// Events produced by the interview state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InterviewEvent {
    InterviewStarted {
        session_id: String,
        question: Question,
        question_number: u32,
        total_questions: u32,
    },

    /// Evaluation of an answer has begun
    AiThinking { session_id: String },

    /// Incremental evaluation text
    EvaluationStream { session_id: String, chunk: String },

    EvaluationComplete {
        session_id: String,
        question_id: String,
        evaluation: Evaluation,
    },

    NextQuestion {
        session_id: String,
        question: Question,
        question_number: u32,
        total_questions: u32,
    },

    InterviewComplete {
        session_id: String,
        overall_score: u32,
        report: FinalReport,
        questions_answered: u32,
        total_questions: u32,
        total_time_spent: u64,
    },

    InterviewPaused { session_id: String },

    InterviewResumed { session_id: String },

    /// A command failed
    Error {
        session_id: Option<String>,
        code: String,
        message: String,
    },
}

impl InterviewEvent {
    /// Build an error event from a command failure
    pub fn error(session_id: Option<&str>, err: &InterviewError) -> Self {
        InterviewEvent::Error {
            session_id: session_id.map(str::to_string),
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    /// Session this event belongs to, if any
    pub fn session_id(&self) -> Option<&str> {
        match self {
            InterviewEvent::InterviewStarted { session_id, .. }
            | InterviewEvent::AiThinking { session_id }
            | InterviewEvent::EvaluationStream { session_id, .. }
            | InterviewEvent::EvaluationComplete { session_id, .. }
            | InterviewEvent::NextQuestion { session_id, .. }
            | InterviewEvent::InterviewComplete { session_id, .. }
            | InterviewEvent::InterviewPaused { session_id }
            | InterviewEvent::InterviewResumed { session_id } => Some(session_id),
            InterviewEvent::Error { session_id, .. } => session_id.as_deref(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, InterviewEvent::Error { .. })
    }
}
