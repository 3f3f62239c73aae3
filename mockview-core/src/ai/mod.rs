//! Question generation and answer evaluation
//!
//! [`InterviewAi`] is the contract the state machine depends on. It never
//! fails: when the model is unavailable, slow, or returns something that
//! does not decode, deterministic fallback content is substituted.

mod decode;
mod fallback;
mod interviewer;
mod prompts;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::profile::{CandidateProfile, ResumeData};
use crate::scoring;
use crate::session::{Category, Difficulty, Evaluation, FinalReport, InterviewType, Question, Session};

pub use decode::{DecodeError, DecodedQuestion, decode_evaluation, decode_question};
pub use fallback::{
    MIN_ANSWER_LEN, fallback_evaluation, fallback_question, is_too_short, short_answer_evaluation,
};
pub use interviewer::{InterviewerConfig, ModelInterviewer};
pub use prompts::{evaluation_prompt, question_prompt};

/// Context for generating the next question
#[derive(Debug, Clone)]
pub struct QuestionRequest {
    pub interview_type: InterviewType,
    pub difficulty: Difficulty,
    pub profile: Option<CandidateProfile>,
    pub resume: Option<ResumeData>,
    /// 1-based
    pub question_number: u32,
    /// Texts of every question asked so far, in order
    pub previous_questions: Vec<String>,
}

impl QuestionRequest {
    pub fn target_role(&self) -> &str {
        self.profile
            .as_ref()
            .map(|p| p.target_role.as_str())
            .filter(|role| !role.trim().is_empty())
            .unwrap_or("Software Developer")
    }
}

/// One answer to evaluate
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub question: String,
    pub answer: String,
    pub category: Category,
    pub difficulty: Difficulty,
}

/// Item of an evaluation stream
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationUpdate {
    /// Raw model text, in production order
    Chunk(String),
    /// Final result; always the last item
    Complete(Evaluation),
}

/// Lazy, finite stream of chunks ending in exactly one `Complete`
pub type EvaluationStream = Pin<Box<dyn Stream<Item = EvaluationUpdate> + Send>>;

/// AI collaborator used by the interview service
#[async_trait]
pub trait InterviewAi: Send + Sync {
    /// Generate a question; falls back to canned content on any failure
    async fn generate_question(&self, request: QuestionRequest) -> Question;

    /// Evaluate an answer as a stream of text chunks and a final result
    fn evaluate_answer(&self, request: EvaluationRequest) -> EvaluationStream;

    /// Summarize a finished session
    async fn generate_final_report(&self, session: &Session) -> FinalReport {
        scoring::final_report(session)
    }
}

/// Drain an evaluation stream into its final result, discarding chunks
pub async fn collect_evaluation(mut stream: EvaluationStream) -> Evaluation {
    use futures_util::StreamExt;

    let mut result = None;
    while let Some(update) = stream.next().await {
        if let EvaluationUpdate::Complete(evaluation) = update {
            result = Some(evaluation);
        }
    }
    result.unwrap_or_else(fallback_evaluation)
}
