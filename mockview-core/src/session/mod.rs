//! Interview sessions and the state machine that drives them

pub mod service;
pub mod types;

pub use service::{InterviewService, ServiceConfig, StartInterview, SubmitAnswer};
pub use types::{
    Category, Difficulty, DurationTier, Evaluation, FinalReport, InterviewType, Question,
    QuestionRecord, SKIPPED_ANSWER, Session, SessionStatus,
};
