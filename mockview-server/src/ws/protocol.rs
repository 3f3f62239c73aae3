//! WebSocket protocol message types
//!
//! Every frame is a JSON object `{"event": "<name>", "data": {...}}`.
//! Payload field names are camelCase.

use mockview_core::{AuthContext, FinalReport, InterviewEvent, Question};
use serde::{Deserialize, Deserializer, Serialize};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Begin a new interview
    StartInterview {
        #[serde(rename = "type")]
        interview_type: String,
        difficulty: String,
        /// `duration` is accepted for older clients
        #[serde(default, alias = "duration")]
        duration_tier: Option<String>,
    },

    /// Answer the current question
    SubmitAnswer {
        session_id: String,
        question_id: String,
        answer: String,
        /// Seconds spent on the question
        #[serde(default, deserialize_with = "lenient_seconds")]
        time_spent: Option<u64>,
    },

    /// Skip the current question
    SkipQuestion { session_id: String },

    PauseInterview { session_id: String },

    ResumeInterview { session_id: String },
}

impl ClientMessage {
    /// Session the command targets, if it names one
    pub fn session_id(&self) -> Option<&str> {
        match self {
            ClientMessage::StartInterview { .. } => None,
            ClientMessage::SubmitAnswer { session_id, .. }
            | ClientMessage::SkipQuestion { session_id }
            | ClientMessage::PauseInterview { session_id }
            | ClientMessage::ResumeInterview { session_id } => Some(session_id),
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Sent once on connect, before any interview event
    ///
    /// Not part of the interview vocabulary; clients that only speak the
    /// interview events can ignore it.
    AuthContext(AuthContext),

    InterviewStarted {
        session_id: String,
        question: Question,
        question_number: u32,
        total_questions: u32,
    },

    /// Evaluation in progress; `status` is always `processing`
    AiThinking { session_id: String, status: String },

    EvaluationStream { session_id: String, chunk: String },

    EvaluationComplete {
        session_id: String,
        question_id: String,
        score: u8,
        feedback: String,
        strengths: Vec<String>,
        improvements: Vec<String>,
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

    /// Error message
    Error {
        /// Session ID if applicable
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        /// Human-readable message
        message: String,
        /// Error code
        code: String,
    },
}

/// Browser timers send fractional seconds; negative or non-numeric values count as unknown
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_f64)
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(|secs| secs.round() as u64))
}

/// Convert an InterviewEvent to the ServerMessage sent to its connection
pub fn interview_event_to_server_message(event: &InterviewEvent) -> ServerMessage {
    match event.clone() {
        InterviewEvent::InterviewStarted {
            session_id,
            question,
            question_number,
            total_questions,
        } => ServerMessage::InterviewStarted {
            session_id,
            question,
            question_number,
            total_questions,
        },
        InterviewEvent::AiThinking { session_id } => ServerMessage::AiThinking {
            session_id,
            status: "processing".to_string(),
        },
        InterviewEvent::EvaluationStream { session_id, chunk } => {
            ServerMessage::EvaluationStream { session_id, chunk }
        }
        InterviewEvent::EvaluationComplete {
            session_id,
            question_id,
            evaluation,
        } => ServerMessage::EvaluationComplete {
            session_id,
            question_id,
            score: evaluation.score,
            feedback: evaluation.feedback,
            strengths: evaluation.strengths,
            improvements: evaluation.improvements,
        },
        InterviewEvent::NextQuestion {
            session_id,
            question,
            question_number,
            total_questions,
        } => ServerMessage::NextQuestion {
            session_id,
            question,
            question_number,
            total_questions,
        },
        InterviewEvent::InterviewComplete {
            session_id,
            overall_score,
            report,
            questions_answered,
            total_questions,
            total_time_spent,
        } => ServerMessage::InterviewComplete {
            session_id,
            overall_score,
            report,
            questions_answered,
            total_questions,
            total_time_spent,
        },
        InterviewEvent::InterviewPaused { session_id } => {
            ServerMessage::InterviewPaused { session_id }
        }
        InterviewEvent::InterviewResumed { session_id } => {
            ServerMessage::InterviewResumed { session_id }
        }
        InterviewEvent::Error {
            session_id,
            code,
            message,
        } => ServerMessage::Error {
            session_id,
            message,
            code,
        },
    }
}
