//! [`InterviewAi`] over a generative model provider

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use mockview_models::{ChatRequest, ChatStream, Message, ModelProvider};
use tokio::time::{Instant, timeout};
use tracing::{debug, warn};

use super::{
    EvaluationRequest, EvaluationStream, EvaluationUpdate, InterviewAi, QuestionRequest,
    decode_evaluation, decode_question, evaluation_prompt, fallback_evaluation, fallback_question,
    is_too_short, question_prompt, short_answer_evaluation,
};
use crate::session::{Evaluation, Question};

/// Model settings for the interviewer
#[derive(Debug, Clone)]
pub struct InterviewerConfig {
    pub model: String,
    /// Upper bound on any single model call, including a full stream
    pub timeout: Duration,
    pub temperature: f32,
}

impl Default for InterviewerConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            timeout: Duration::from_secs(30),
            temperature: 0.7,
        }
    }
}

/// Generates and evaluates questions with a [`ModelProvider`]
pub struct ModelInterviewer {
    provider: Arc<dyn ModelProvider>,
    config: InterviewerConfig,
}

impl ModelInterviewer {
    pub fn new(provider: Arc<dyn ModelProvider>, config: InterviewerConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &InterviewerConfig {
        &self.config
    }

    fn chat_request(&self, prompt: String) -> ChatRequest {
        ChatRequest::new(self.config.model.clone(), vec![Message::user(prompt)])
            .with_temperature(self.config.temperature)
    }

    async fn try_generate(&self, request: &QuestionRequest) -> Result<Question, String> {
        let chat = self.chat_request(question_prompt(request));
        let response = timeout(self.config.timeout, self.provider.chat(chat))
            .await
            .map_err(|_| format!("timed out after {:?}", self.config.timeout))?
            .map_err(|e| e.to_string())?;
        let decoded =
            decode_question(&response.content, request.difficulty).map_err(|e| e.to_string())?;
        Ok(Question::new(decoded.text, decoded.category, decoded.difficulty))
    }
}

#[async_trait]
impl InterviewAi for ModelInterviewer {
    async fn generate_question(&self, request: QuestionRequest) -> Question {
        match self.try_generate(&request).await {
            Ok(question) => {
                debug!(
                    provider = self.provider.name(),
                    question_number = request.question_number,
                    "Generated question"
                );
                question
            }
            Err(cause) => {
                warn!(
                    provider = self.provider.name(),
                    question_number = request.question_number,
                    %cause,
                    "Question generation failed, using fallback question"
                );
                fallback_question(
                    request.interview_type,
                    request.difficulty,
                    request.profile.as_ref(),
                    request.resume.as_ref(),
                )
            }
        }
    }

    fn evaluate_answer(&self, request: EvaluationRequest) -> EvaluationStream {
        let state = if is_too_short(&request.answer) {
            EvalState::Ready(short_answer_evaluation())
        } else {
            EvalState::Connecting {
                provider: Arc::clone(&self.provider),
                chat: self.chat_request(evaluation_prompt(&request)),
                deadline: Instant::now() + self.config.timeout,
            }
        };
        Box::pin(futures_util::stream::unfold(state, step))
    }
}

enum EvalState {
    Connecting {
        provider: Arc<dyn ModelProvider>,
        chat: ChatRequest,
        deadline: Instant,
    },
    Streaming {
        inner: ChatStream,
        buffer: String,
        deadline: Instant,
    },
    Ready(Evaluation),
    Done,
}

fn give_up(cause: impl std::fmt::Display) -> Option<(EvaluationUpdate, EvalState)> {
    warn!(%cause, "Answer evaluation failed, using fallback evaluation");
    Some((
        EvaluationUpdate::Complete(fallback_evaluation()),
        EvalState::Done,
    ))
}

fn finish(buffer: &str) -> Option<(EvaluationUpdate, EvalState)> {
    match decode_evaluation(buffer) {
        Ok(evaluation) => Some((EvaluationUpdate::Complete(evaluation), EvalState::Done)),
        Err(e) => give_up(e),
    }
}

async fn step(state: EvalState) -> Option<(EvaluationUpdate, EvalState)> {
    let mut state = state;
    loop {
        state = match state {
            EvalState::Done => return None,
            EvalState::Ready(evaluation) => {
                return Some((EvaluationUpdate::Complete(evaluation), EvalState::Done));
            }
            EvalState::Connecting {
                provider,
                chat,
                deadline,
            } => match tokio::time::timeout_at(deadline, provider.chat_stream(chat)).await {
                Ok(Ok(inner)) => EvalState::Streaming {
                    inner,
                    buffer: String::new(),
                    deadline,
                },
                Ok(Err(e)) => return give_up(e),
                Err(_) => return give_up("timed out waiting for the model"),
            },
            EvalState::Streaming {
                mut inner,
                mut buffer,
                deadline,
            } => match tokio::time::timeout_at(deadline, inner.next()).await {
                Ok(Some(Ok(chunk))) => {
                    if let Some(delta) = chunk.delta.filter(|d| !d.is_empty()) {
                        buffer.push_str(&delta);
                        return Some((
                            EvaluationUpdate::Chunk(delta),
                            EvalState::Streaming {
                                inner,
                                buffer,
                                deadline,
                            },
                        ));
                    }
                    if chunk.done {
                        return finish(&buffer);
                    }
                    EvalState::Streaming {
                        inner,
                        buffer,
                        deadline,
                    }
                }
                Ok(Some(Err(e))) => return give_up(e),
                Ok(None) => return finish(&buffer),
                Err(_) => return give_up("timed out while streaming"),
            },
        };
    }
}
