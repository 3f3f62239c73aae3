//! Interview state machine
//!
//! [`InterviewService`] validates every command against the stored session,
//! drives the AI collaborator, and writes events to the caller's
//! [`EventSink`] in the order they are produced.
//!
//! ```text
//! start ──► in-progress ──submit/skip──► in-progress ── … ──► completed
//!               │   ▲
//!         pause │   │ resume
//!               ▼   │
//!              paused            (any non-terminal) ──► abandoned
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::StreamExt;
use tracing::{debug, error, info, warn};

use crate::ai::{EvaluationRequest, EvaluationUpdate, InterviewAi, QuestionRequest, fallback_evaluation};
use crate::error::{InterviewError, StoreError};
use crate::events::{EventSink, InterviewEvent};
use crate::pacing::{AdvanceSlot, PacingGuard};
use crate::profile::ProfileProvider;
use crate::scoring;
use crate::store::SessionStore;

use super::types::{
    Difficulty, DurationTier, Evaluation, InterviewType, SKIPPED_ANSWER, Session, SessionStatus,
};

/// Tunables for the state machine
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Wait between an evaluation and the next question or final report
    pub pacing_delay: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            pacing_delay: Duration::from_secs(3),
        }
    }
}

/// `start_interview` arguments as received from a client
#[derive(Debug, Clone)]
pub struct StartInterview {
    pub interview_type: String,
    pub difficulty: String,
    pub duration_tier: Option<String>,
}

/// `submit_answer` arguments as received from a client
#[derive(Debug, Clone)]
pub struct SubmitAnswer {
    pub session_id: String,
    pub question_id: String,
    pub answer: String,
    pub time_spent: Option<u64>,
}

fn emit(events: &EventSink, event: InterviewEvent) {
    // A closed sink means the connection is gone; state is already persisted
    let _ = events.send(event);
}

/// Interview session state machine
#[derive(Clone)]
pub struct InterviewService {
    store: Arc<dyn SessionStore>,
    ai: Arc<dyn InterviewAi>,
    profiles: Arc<dyn ProfileProvider>,
    pacing: PacingGuard,
    config: ServiceConfig,
}

impl InterviewService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        ai: Arc<dyn InterviewAi>,
        profiles: Arc<dyn ProfileProvider>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            ai,
            profiles,
            pacing: PacingGuard::new(),
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn pacing(&self) -> &PacingGuard {
        &self.pacing
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Create a session and emit its first question
    pub async fn start(
        &self,
        user_id: &str,
        command: StartInterview,
        events: &EventSink,
    ) -> Result<Session, InterviewError> {
        let interview_type: InterviewType = command.interview_type.parse()?;
        let difficulty: Difficulty = command.difficulty.parse()?;
        let tier = DurationTier::parse_or_default(command.duration_tier.as_deref());

        let profile = self
            .profiles
            .profile(user_id)
            .await
            .ok_or_else(|| InterviewError::NotFound("User profile not found".to_string()))?;
        let resume = self.profiles.resume(user_id).await;

        if interview_type == InterviewType::RoleSpecific
            && !resume.as_ref().is_some_and(|r| r.is_confirmed())
        {
            return Err(InterviewError::Validation(
                "Resume required: upload and confirm your resume before starting a role-specific interview"
                    .to_string(),
            ));
        }

        let question = self
            .ai
            .generate_question(QuestionRequest {
                interview_type,
                difficulty,
                profile: Some(profile),
                resume,
                question_number: 1,
                previous_questions: Vec::new(),
            })
            .await;

        let draft = Session::new(user_id, interview_type, difficulty, tier, question.clone());
        let session = self.create(&draft).await?;

        info!(
            session_id = %session.id,
            user_id,
            interview_type = %interview_type,
            difficulty = %difficulty,
            total_questions = session.total_questions,
            "Interview started"
        );

        emit(
            events,
            InterviewEvent::InterviewStarted {
                session_id: session.id.clone(),
                question,
                question_number: 1,
                total_questions: session.total_questions,
            },
        );
        Ok(session)
    }

    /// Evaluate an answer, record it, and schedule the advance
    ///
    /// Returns once the evaluation is persisted. The next question or final
    /// report follows on `events` after the pacing delay.
    pub async fn submit_answer(
        &self,
        user_id: &str,
        command: SubmitAnswer,
        events: &EventSink,
    ) -> Result<(), InterviewError> {
        let slot = self.pacing.begin(&command.session_id)?;
        let mut session = self.load_owned(&command.session_id, user_id).await?;
        ensure_in_progress(&session)?;

        let position = session
            .position_of(&command.question_id)
            .ok_or_else(|| InterviewError::NotFound("Question not found".to_string()))?;
        ensure_current(&session, position)?;

        let record = &session.questions[position];
        let answer = command.answer.trim().to_string();
        emit(
            events,
            InterviewEvent::AiThinking {
                session_id: session.id.clone(),
            },
        );

        let mut stream = self.ai.evaluate_answer(EvaluationRequest {
            question: record.text.clone(),
            answer: answer.clone(),
            category: record.category,
            difficulty: record.difficulty,
        });
        let mut evaluation = None;
        while let Some(update) = stream.next().await {
            match update {
                EvaluationUpdate::Chunk(chunk) => emit(
                    events,
                    InterviewEvent::EvaluationStream {
                        session_id: session.id.clone(),
                        chunk,
                    },
                ),
                EvaluationUpdate::Complete(result) => evaluation = Some(result),
            }
        }
        let evaluation = evaluation.unwrap_or_else(fallback_evaluation);

        record_outcome(
            &mut session,
            position,
            answer,
            evaluation.clone(),
            command.time_spent.unwrap_or(0),
        );
        let session = self.persist(&session).await?;

        info!(
            session_id = %session.id,
            user_id,
            question_number = position + 1,
            score = evaluation.score,
            "Answer evaluated"
        );

        emit(
            events,
            InterviewEvent::EvaluationComplete {
                session_id: session.id.clone(),
                question_id: command.question_id,
                evaluation,
            },
        );

        self.schedule_advance(slot, self.config.pacing_delay, events.clone());
        Ok(())
    }

    /// Skip the current question and advance immediately
    pub async fn skip_question(
        &self,
        user_id: &str,
        session_id: &str,
        events: &EventSink,
    ) -> Result<(), InterviewError> {
        let slot = self.pacing.begin(session_id)?;
        let mut session = self.load_owned(session_id, user_id).await?;
        ensure_in_progress(&session)?;

        let Some(question_id) = session
            .current_record()
            .map(|record| record.question_id.clone())
        else {
            // The previous answer is recorded but its advance never landed
            if session.needs_advance() {
                debug!(session_id, "Delivering owed advance instead of skipping");
                return self.advance(&slot, events).await;
            }
            return Err(InterviewError::InvalidState("No question to skip".to_string()));
        };
        let position = session
            .position_of(&question_id)
            .ok_or_else(|| InterviewError::NotFound("Question not found".to_string()))?;

        record_outcome(
            &mut session,
            position,
            SKIPPED_ANSWER.to_string(),
            Evaluation::skipped(),
            0,
        );
        let session = self.persist(&session).await?;
        info!(
            session_id = %session.id,
            user_id,
            question_number = position + 1,
            "Question skipped"
        );

        self.advance(&slot, events).await
    }

    /// Mark a session paused and cancel any pending advance
    pub async fn pause(&self, session_id: &str, events: &EventSink) -> Result<(), InterviewError> {
        let mut session = self.load(session_id).await?;
        ensure_not_terminal(&session)?;

        self.pacing.cancel(session_id);
        session.status = SessionStatus::Paused;
        self.persist(&session).await?;

        info!(session_id, "Interview paused");
        emit(
            events,
            InterviewEvent::InterviewPaused {
                session_id: session_id.to_string(),
            },
        );
        Ok(())
    }

    /// Mark a session in progress and deliver any advance still owed
    pub async fn resume(&self, session_id: &str, events: &EventSink) -> Result<(), InterviewError> {
        let mut session = self.load(session_id).await?;
        ensure_not_terminal(&session)?;

        session.status = SessionStatus::InProgress;
        let session = self.persist(&session).await?;

        info!(session_id, "Interview resumed");
        emit(
            events,
            InterviewEvent::InterviewResumed {
                session_id: session_id.to_string(),
            },
        );

        if session.needs_advance() {
            match self.pacing.begin(session_id) {
                Ok(slot) => {
                    debug!(session_id, "Rescheduling owed advance");
                    self.schedule_advance(slot, Duration::ZERO, events.clone());
                }
                Err(_) => debug!(session_id, "Advance already in flight"),
            }
        }
        Ok(())
    }

    /// Fail with `NotFound` or `Authorization` unless `user_id` owns the session
    pub async fn authorize(&self, session_id: &str, user_id: &str) -> Result<(), InterviewError> {
        let session = self.load(session_id).await?;
        if session.user_id != user_id {
            return Err(InterviewError::Authorization(
                "Not authorized to access this interview session".to_string(),
            ));
        }
        Ok(())
    }

    /// Mark a non-terminal session abandoned
    ///
    /// Returns false if the session had already ended.
    pub async fn abandon(&self, session_id: &str) -> Result<bool, InterviewError> {
        self.pacing.cancel(session_id);
        let mut session = self.load(session_id).await?;
        if session.status.is_terminal() {
            return Ok(false);
        }
        session.status = SessionStatus::Abandoned;
        self.persist(&session).await?;
        info!(session_id, user_id = %session.user_id, "Interview abandoned");
        Ok(true)
    }

    /// Abandon sessions idle for longer than `stale_after`
    pub async fn reap_stale(&self, stale_after: Duration) -> Result<usize, InterviewError> {
        let idle = chrono::Duration::from_std(stale_after)
            .map_err(|e| InterviewError::Validation(format!("Invalid stale threshold: {e}")))?;
        let cutoff = Utc::now() - idle;
        let stale = self.store.find_stale(cutoff).await?;

        let mut reaped = 0;
        for session in stale {
            if self.pacing.is_pending(&session.id) {
                continue;
            }
            match self.abandon(&session.id).await {
                Ok(true) => reaped += 1,
                Ok(false) => {}
                Err(e) => warn!(session_id = %session.id, error = %e, "Failed to reap session"),
            }
        }
        if reaped > 0 {
            info!(reaped, "Reaped stale interview sessions");
        }
        Ok(reaped)
    }

    /// A user's sessions in the given status, newest first
    pub async fn list_sessions(
        &self,
        user_id: &str,
        status: SessionStatus,
    ) -> Result<Vec<Session>, InterviewError> {
        Ok(self.store.find_by_user_and_status(user_id, status).await?)
    }

    /// Run the advance after `delay` on a background task, holding `slot`
    fn schedule_advance(&self, slot: AdvanceSlot, delay: Duration, events: EventSink) {
        let service = self.clone();
        tokio::spawn(async move {
            if !slot.wait(delay).await {
                debug!(session_id = slot.session_id(), "Pending advance cancelled");
                return;
            }
            if let Err(e) = service.advance(&slot, &events).await {
                emit(&events, InterviewEvent::error(Some(slot.session_id()), &e));
            }
        });
    }

    /// Generate the next question or finalize the session
    async fn advance(&self, slot: &AdvanceSlot, events: &EventSink) -> Result<(), InterviewError> {
        let session_id = slot.session_id();
        let session = self.load(session_id).await?;
        if session.status != SessionStatus::InProgress {
            debug!(session_id, status = %session.status, "Advance deferred");
            return Ok(());
        }

        if session.is_finished() {
            return self.complete(session, slot, events).await;
        }

        let index = session.current_question_index as usize;
        if let Some(existing) = session.questions.get(index) {
            emit(
                events,
                InterviewEvent::NextQuestion {
                    session_id: session.id.clone(),
                    question: existing.question(),
                    question_number: session.current_question_index + 1,
                    total_questions: session.total_questions,
                },
            );
            return Ok(());
        }

        let question = self
            .ai
            .generate_question(QuestionRequest {
                interview_type: session.interview_type,
                difficulty: session.difficulty,
                profile: self.profiles.profile(&session.user_id).await,
                resume: self.profiles.resume(&session.user_id).await,
                question_number: session.current_question_index + 1,
                previous_questions: session.questions.iter().map(|q| q.text.clone()).collect(),
            })
            .await;

        if slot.is_cancelled() {
            debug!(session_id, "Advance cancelled during question generation");
            return Ok(());
        }

        let mut updated = session;
        updated.questions.push(question.clone().into());
        let Some(saved) = self.persist_advance(&updated, slot).await? else {
            return Ok(());
        };

        debug!(
            session_id,
            question_number = saved.current_question_index + 1,
            "Next question ready"
        );
        emit(
            events,
            InterviewEvent::NextQuestion {
                session_id: saved.id.clone(),
                question,
                question_number: saved.current_question_index + 1,
                total_questions: saved.total_questions,
            },
        );
        Ok(())
    }

    async fn complete(
        &self,
        mut session: Session,
        slot: &AdvanceSlot,
        events: &EventSink,
    ) -> Result<(), InterviewError> {
        let overall_score = scoring::overall_score(&session);
        let mut report = self.ai.generate_final_report(&session).await;
        report.category_scores = scoring::category_breakdown(&session);

        if slot.is_cancelled() {
            return Ok(());
        }

        session.status = SessionStatus::Completed;
        session.completed_at = Some(Utc::now());
        session.overall_score = overall_score;
        session.final_report = Some(report.clone());
        session.recompute_total_time();

        let Some(saved) = self.persist_advance(&session, slot).await? else {
            return Ok(());
        };

        info!(
            session_id = %saved.id,
            user_id = %saved.user_id,
            overall_score,
            "Interview completed"
        );
        emit(
            events,
            InterviewEvent::InterviewComplete {
                session_id: saved.id.clone(),
                overall_score,
                report,
                questions_answered: saved.answered_count(),
                total_questions: saved.total_questions,
                total_time_spent: saved.total_time_spent,
            },
        );
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Session, InterviewError> {
        self.store
            .find_by_id(session_id)
            .await?
            .ok_or_else(InterviewError::session_not_found)
    }

    async fn load_owned(&self, session_id: &str, user_id: &str) -> Result<Session, InterviewError> {
        self.store
            .find_by_id_and_user(session_id, user_id)
            .await?
            .ok_or_else(InterviewError::session_not_found)
    }

    async fn create(&self, session: &Session) -> Result<Session, InterviewError> {
        let result = match self.store.create(session).await {
            Err(e) if e.is_retryable() => {
                warn!(session_id = %session.id, error = %e, "Session create failed, retrying");
                self.store.create(session).await
            }
            other => other,
        };
        result.map_err(|e| {
            error!(session_id = %session.id, error = %e, "Failed to create session");
            InterviewError::from(e)
        })
    }

    /// Save with one retry on transient failure
    ///
    /// A retry that conflicts with exactly the write it repeats means the
    /// first attempt landed and only its acknowledgement was lost.
    async fn save(&self, session: &Session) -> Result<Session, StoreError> {
        match self.store.save(session).await {
            Err(e) if e.is_retryable() => {
                warn!(session_id = %session.id, error = %e, "Session save failed, retrying");
                let retried = self.store.save(session).await;
                if let Err(StoreError::VersionConflict { .. }) = &retried {
                    if let Ok(Some(stored)) = self.store.find_by_id(&session.id).await {
                        if is_landed_write(&stored, session) {
                            debug!(session_id = %session.id, "Earlier save attempt had landed");
                            return Ok(stored);
                        }
                    }
                }
                retried
            }
            other => other,
        }
    }

    async fn persist(&self, session: &Session) -> Result<Session, InterviewError> {
        self.save(session).await.map_err(|e| {
            error!(session_id = %session.id, error = %e, "Failed to save session");
            InterviewError::from(e)
        })
    }

    /// Save the result of an advance
    ///
    /// A version conflict caused by a concurrent pause, resume or abandon is
    /// not an error: the advance is dropped and `resume` reschedules it.
    async fn persist_advance(
        &self,
        session: &Session,
        slot: &AdvanceSlot,
    ) -> Result<Option<Session>, InterviewError> {
        match self.save(session).await {
            Ok(saved) => Ok(Some(saved)),
            Err(StoreError::VersionConflict { .. }) => {
                let current = self.load(&session.id).await?;
                if current.status != SessionStatus::InProgress {
                    debug!(session_id = %session.id, status = %current.status, "Advance superseded");
                    return Ok(None);
                }
                if slot.is_cancelled() || !current.needs_advance() {
                    debug!(session_id = %session.id, "Advance superseded by a newer one");
                    return Ok(None);
                }
                error!(session_id = %session.id, "Concurrent write to in-progress session");
                Err(InterviewError::Persistence(
                    "Interview session was modified concurrently".to_string(),
                ))
            }
            Err(e) => {
                error!(session_id = %session.id, error = %e, "Failed to save session");
                Err(e.into())
            }
        }
    }
}

/// `stored` is `attempted` as the store commits it: same content, next version
fn is_landed_write(stored: &Session, attempted: &Session) -> bool {
    if stored.version != attempted.version + 1 {
        return false;
    }
    let mut normalized = stored.clone();
    normalized.version = attempted.version;
    normalized.updated_at = attempted.updated_at;
    normalized == *attempted
}

fn ensure_in_progress(session: &Session) -> Result<(), InterviewError> {
    match session.status {
        SessionStatus::InProgress => Ok(()),
        SessionStatus::Paused => Err(InterviewError::InvalidState(
            "Interview is paused".to_string(),
        )),
        SessionStatus::Completed | SessionStatus::Abandoned => Err(InterviewError::InvalidState(
            "Interview is not in progress".to_string(),
        )),
    }
}

fn ensure_not_terminal(session: &Session) -> Result<(), InterviewError> {
    if session.status.is_terminal() {
        return Err(InterviewError::InvalidState(format!(
            "Interview is already {}",
            session.status
        )));
    }
    Ok(())
}

/// Only the question at the current pointer accepts an answer
fn ensure_current(session: &Session, position: usize) -> Result<(), InterviewError> {
    if position == session.current_question_index as usize {
        Ok(())
    } else {
        Err(InterviewError::InvalidState(
            "Question has already been answered".to_string(),
        ))
    }
}

fn record_outcome(
    session: &mut Session,
    position: usize,
    answer: String,
    evaluation: Evaluation,
    time_spent: u64,
) {
    let record = &mut session.questions[position];
    record.answer = answer;
    record.evaluation = evaluation;
    record.time_spent = time_spent;
    record.answered_at = Some(Utc::now());
    session.current_question_index = position as u32 + 1;
    session.recompute_total_time();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{InterviewerConfig, ModelInterviewer};
    use crate::profile::{CandidateProfile, MemoryProfileDirectory, ResumeData, ResumeStatus};
    use crate::session::{Category, Question};
    use crate::store::MemorySessionStore;
    use mockview_models::ScriptedProvider;
    use tokio::sync::mpsc;

    const LONG_ANSWER: &str = "Iterate once, flipping each next pointer.";

    struct Harness {
        service: InterviewService,
        store: Arc<MemorySessionStore>,
        provider: Arc<ScriptedProvider>,
        profiles: Arc<MemoryProfileDirectory>,
        events: EventSink,
        rx: mpsc::UnboundedReceiver<InterviewEvent>,
    }

    impl Harness {
        async fn new() -> Self {
            let store = Arc::new(MemorySessionStore::new());
            let provider = Arc::new(ScriptedProvider::new());
            let profiles = Arc::new(MemoryProfileDirectory::new());
            profiles
                .set_profile(
                    "u1",
                    CandidateProfile {
                        name: "Asha".into(),
                        target_role: "Backend Engineer".into(),
                        ..Default::default()
                    },
                )
                .await;
            let ai = Arc::new(ModelInterviewer::new(
                Arc::clone(&provider) as Arc<dyn mockview_models::ModelProvider>,
                InterviewerConfig::default(),
            ));
            let service = InterviewService::new(
                Arc::clone(&store) as Arc<dyn SessionStore>,
                ai,
                Arc::clone(&profiles) as Arc<dyn ProfileProvider>,
                ServiceConfig::default(),
            );
            let (events, rx) = mpsc::unbounded_channel();
            Self {
                service,
                store,
                provider,
                profiles,
                events,
                rx,
            }
        }

        async fn start(&mut self, tier: &str) -> Session {
            let session = self
                .service
                .start("u1", start_command("technical", "medium", Some(tier)), &self.events)
                .await
                .unwrap();
            assert!(matches!(
                self.next().await,
                InterviewEvent::InterviewStarted { .. }
            ));
            session
        }

        async fn next(&mut self) -> InterviewEvent {
            self.rx.recv().await.expect("event channel closed")
        }

        async fn stored(&self, id: &str) -> Session {
            self.store.find_by_id(id).await.unwrap().unwrap()
        }

        /// Skip questions 1..=4 of a quick interview, returning the last question's id
        async fn skip_to_last(&mut self, session: &Session) -> String {
            for number in 2..=5u32 {
                self.service
                    .skip_question("u1", &session.id, &self.events)
                    .await
                    .unwrap();
                match self.next().await {
                    InterviewEvent::NextQuestion { question_number, .. } => {
                        assert_eq!(question_number, number)
                    }
                    other => panic!("unexpected event: {other:?}"),
                }
            }
            let stored = self.stored(&session.id).await;
            stored.current_record().unwrap().question_id.clone()
        }

        fn submit(&self, session: &Session, question_id: &str, answer: &str) -> SubmitAnswer {
            SubmitAnswer {
                session_id: session.id.clone(),
                question_id: question_id.to_string(),
                answer: answer.to_string(),
                time_spent: Some(30),
            }
        }
    }

    fn start_command(kind: &str, difficulty: &str, tier: Option<&str>) -> StartInterview {
        StartInterview {
            interview_type: kind.to_string(),
            difficulty: difficulty.to_string(),
            duration_tier: tier.map(str::to_string),
        }
    }

    fn evaluation_json(score: u8) -> String {
        format!(
            r#"{{"score": {score}, "feedback": "Solid.", "strengths": ["Clear"], "improvements": ["Mention complexity"]}}"#
        )
    }

    #[tokio::test]
    async fn start_creates_session_and_emits_first_question() {
        let mut h = Harness::new().await;
        h.provider
            .push_text(r#"{"text": "What is a trie?", "category": "DSA"}"#);

        let session = h
            .service
            .start("u1", start_command("technical", "medium", Some("quick")), &h.events)
            .await
            .unwrap();

        assert_eq!(session.total_questions, 5);
        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.questions.len(), 1);
        match h.next().await {
            InterviewEvent::InterviewStarted {
                session_id,
                question,
                question_number,
                total_questions,
            } => {
                assert_eq!(session_id, session.id);
                assert_eq!(question.text, "What is a trie?");
                assert_eq!(question.category, Category::Dsa);
                assert_eq!(question_number, 1);
                assert_eq!(total_questions, 5);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(h.provider.requests()[0].user_text().contains("technical interview"));
    }

    #[tokio::test]
    async fn start_maps_duration_tiers() {
        let h = Harness::new().await;
        for (tier, expected) in [(Some("full"), 15), (Some("bogus"), 10), (None, 10)] {
            let session = h
                .service
                .start("u1", start_command("behavioral", "easy", tier), &h.events)
                .await
                .unwrap();
            assert_eq!(session.total_questions, expected);
        }
    }

    #[tokio::test]
    async fn start_rejects_unknown_type_and_difficulty() {
        let h = Harness::new().await;
        let err = h
            .service
            .start("u1", start_command("trivia", "medium", None), &h.events)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = h
            .service
            .start("u1", start_command("technical", "insane", None), &h.events)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn start_requires_profile() {
        let h = Harness::new().await;
        let err = h
            .service
            .start("stranger", start_command("technical", "easy", None), &h.events)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn role_specific_requires_confirmed_resume() {
        let h = Harness::new().await;
        let err = h
            .service
            .start("u1", start_command("role-specific", "easy", None), &h.events)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(err.to_string().starts_with("Resume required"));

        h.profiles
            .set_resume(
                "u1",
                ResumeData {
                    skills: vec!["Rust".into()],
                    status: ResumeStatus::Pending,
                    ..Default::default()
                },
            )
            .await;
        assert!(
            h.service
                .start("u1", start_command("role-specific", "easy", None), &h.events)
                .await
                .is_err()
        );

        h.profiles
            .set_resume(
                "u1",
                ResumeData {
                    skills: vec!["Rust".into()],
                    status: ResumeStatus::Confirmed,
                    ..Default::default()
                },
            )
            .await;
        let session = h
            .service
            .start("u1", start_command("role-specific", "medium", None), &h.events)
            .await
            .unwrap();
        // Provider has nothing queued, so the fallback interpolates the first skill
        assert_eq!(
            session.questions[0].text,
            "Describe a project where you used Rust."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn submit_streams_evaluation_then_next_question() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;
        let question_id = session.questions[0].question_id.clone();
        h.provider.push_chunks(["{\"score\": 8, ", "\"feedback\": \"Good.\"}"]);

        h.service
            .submit_answer("u1", h.submit(&session, &question_id, LONG_ANSWER), &h.events)
            .await
            .unwrap();

        assert!(matches!(h.next().await, InterviewEvent::AiThinking { .. }));
        assert!(matches!(h.next().await, InterviewEvent::EvaluationStream { .. }));
        assert!(matches!(h.next().await, InterviewEvent::EvaluationStream { .. }));
        match h.next().await {
            InterviewEvent::EvaluationComplete { evaluation, .. } => {
                assert_eq!(evaluation.score, 8);
                assert_eq!(evaluation.feedback, "Good.");
            }
            other => panic!("unexpected event: {other:?}"),
        }

        let stored = h.stored(&session.id).await;
        assert_eq!(stored.current_question_index, 1);
        assert_eq!(stored.questions[0].answer, LONG_ANSWER);
        assert_eq!(stored.questions[0].time_spent, 30);
        assert!(stored.questions[0].answered_at.is_some());
        assert_eq!(stored.total_time_spent, 30);
        assert!(stored.invariants_hold());

        let before = tokio::time::Instant::now();
        match h.next().await {
            InterviewEvent::NextQuestion {
                question_number,
                total_questions,
                ..
            } => {
                assert_eq!(question_number, 2);
                assert_eq!(total_questions, 5);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(before.elapsed() >= Duration::from_secs(3));

        let stored = h.stored(&session.id).await;
        assert_eq!(stored.questions.len(), 2);
        let prompt = h.provider.requests().last().unwrap().user_text();
        assert!(prompt.contains("DO NOT REPEAT"));
    }

    #[tokio::test(start_paused = true)]
    async fn second_submit_while_advance_pending_is_rejected() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;
        let question_id = session.questions[0].question_id.clone();
        h.provider.push_text(evaluation_json(7));

        h.service
            .submit_answer("u1", h.submit(&session, &question_id, LONG_ANSWER), &h.events)
            .await
            .unwrap();

        let err = h
            .service
            .submit_answer("u1", h.submit(&session, &question_id, LONG_ANSWER), &h.events)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");

        let err = h
            .service
            .skip_question("u1", &session.id, &h.events)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");

        let stored = h.stored(&session.id).await;
        assert_eq!(stored.current_question_index, 1);
    }

    #[tokio::test]
    async fn submit_validates_ownership_status_and_question() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;
        let question_id = session.questions[0].question_id.clone();

        let err = h
            .service
            .submit_answer("u2", h.submit(&session, &question_id, LONG_ANSWER), &h.events)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        let err = h
            .service
            .submit_answer("u1", h.submit(&session, "no-such-question", LONG_ANSWER), &h.events)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");

        h.service.pause(&session.id, &h.events).await.unwrap();
        let err = h
            .service
            .submit_answer("u1", h.submit(&session, &question_id, LONG_ANSWER), &h.events)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");

        let stored = h.stored(&session.id).await;
        assert_eq!(stored.current_question_index, 0);
        assert_eq!(stored.questions[0].answer, "");
    }

    #[tokio::test]
    async fn short_answer_gets_low_score_without_model_call() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;
        let calls_before = h.provider.requests().len();
        let question_id = session.questions[0].question_id.clone();

        h.service
            .submit_answer("u1", h.submit(&session, &question_id, "nope."), &h.events)
            .await
            .unwrap();

        assert!(matches!(h.next().await, InterviewEvent::AiThinking { .. }));
        match h.next().await {
            InterviewEvent::EvaluationComplete { evaluation, .. } => assert_eq!(evaluation.score, 1),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(h.provider.requests().len(), calls_before);
    }

    #[tokio::test]
    async fn skip_records_sentinel_and_advances_immediately() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;

        h.service
            .skip_question("u1", &session.id, &h.events)
            .await
            .unwrap();

        match h.next().await {
            InterviewEvent::NextQuestion { question_number, .. } => assert_eq!(question_number, 2),
            other => panic!("unexpected event: {other:?}"),
        }
        let stored = h.stored(&session.id).await;
        assert_eq!(stored.current_question_index, 1);
        assert_eq!(stored.questions[0].answer, SKIPPED_ANSWER);
        assert_eq!(stored.questions[0].evaluation, Evaluation::skipped());
        assert_eq!(stored.questions.len(), 2);
        assert!(!h.service.pacing().is_pending(&session.id));
    }

    #[tokio::test(start_paused = true)]
    async fn quick_interview_scenario() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;
        let question_id = session.questions[0].question_id.clone();
        h.provider.push_text(evaluation_json(8));

        h.service
            .submit_answer("u1", h.submit(&session, &question_id, LONG_ANSWER), &h.events)
            .await
            .unwrap();
        assert!(matches!(h.next().await, InterviewEvent::AiThinking { .. }));
        assert!(matches!(h.next().await, InterviewEvent::EvaluationStream { .. }));
        assert!(matches!(h.next().await, InterviewEvent::EvaluationComplete { .. }));
        match h.next().await {
            InterviewEvent::NextQuestion { question_number, .. } => assert_eq!(question_number, 2),
            other => panic!("unexpected event: {other:?}"),
        }

        for skip in 1..=4u32 {
            let stored = h.stored(&session.id).await;
            assert_ne!(stored.status, SessionStatus::Completed);
            h.service
                .skip_question("u1", &session.id, &h.events)
                .await
                .unwrap();
            let event = h.next().await;
            if skip < 4 {
                match event {
                    InterviewEvent::NextQuestion { question_number, .. } => {
                        assert_eq!(question_number, skip + 2)
                    }
                    other => panic!("unexpected event: {other:?}"),
                }
            } else {
                match event {
                    InterviewEvent::InterviewComplete {
                        overall_score,
                        questions_answered,
                        total_questions,
                        total_time_spent,
                        report,
                        ..
                    } => {
                        assert_eq!(overall_score, 80);
                        assert_eq!(questions_answered, 1);
                        assert_eq!(total_questions, 5);
                        assert_eq!(total_time_spent, 30);
                        assert_eq!(report.category_scores.get(&Category::Technical), Some(&80));
                    }
                    other => panic!("unexpected event: {other:?}"),
                }
            }
        }

        let stored = h.stored(&session.id).await;
        assert_eq!(stored.status, SessionStatus::Completed);
        assert_eq!(stored.current_question_index, 5);
        assert_eq!(stored.overall_score, 80);
        assert!(stored.completed_at.is_some());
        assert!(stored.final_report.is_some());
        assert!(stored.invariants_hold());

        let err = h
            .service
            .skip_question("u1", &session.id, &h.events)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
        assert!(h.rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_cancels_pending_advance_and_resume_delivers_it() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;
        let question_id = session.questions[0].question_id.clone();
        h.provider.push_text(evaluation_json(6));

        h.service
            .submit_answer("u1", h.submit(&session, &question_id, LONG_ANSWER), &h.events)
            .await
            .unwrap();
        h.service.pause(&session.id, &h.events).await.unwrap();

        assert!(matches!(h.next().await, InterviewEvent::AiThinking { .. }));
        assert!(matches!(h.next().await, InterviewEvent::EvaluationStream { .. }));
        assert!(matches!(h.next().await, InterviewEvent::EvaluationComplete { .. }));
        assert!(matches!(h.next().await, InterviewEvent::InterviewPaused { .. }));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(h.rx.try_recv().is_err());
        let stored = h.stored(&session.id).await;
        assert_eq!(stored.questions.len(), 1);
        assert!(stored.needs_advance());

        h.service.resume(&session.id, &h.events).await.unwrap();
        assert!(matches!(h.next().await, InterviewEvent::InterviewResumed { .. }));
        match h.next().await {
            InterviewEvent::NextQuestion { question_number, .. } => assert_eq!(question_number, 2),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn pause_and_resume_reject_terminal_sessions() {
        let h = Harness::new().await;
        let session = h
            .service
            .start("u1", start_command("technical", "easy", None), &h.events)
            .await
            .unwrap();
        assert!(h.service.abandon(&session.id).await.unwrap());
        assert!(!h.service.abandon(&session.id).await.unwrap());

        let err = h.service.pause(&session.id, &h.events).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
        let err = h.service.resume(&session.id, &h.events).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn authorize_distinguishes_missing_and_foreign_sessions() {
        let h = Harness::new().await;
        let session = h
            .service
            .start("u1", start_command("technical", "easy", None), &h.events)
            .await
            .unwrap();

        assert!(h.service.authorize(&session.id, "u1").await.is_ok());
        let err = h.service.authorize(&session.id, "u2").await.unwrap_err();
        assert_eq!(err.code(), "AUTHORIZATION_ERROR");
        let err = h.service.authorize("missing", "u1").await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn transient_save_failure_is_retried_once() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;
        h.store.fail_next_saves(1);

        h.service
            .skip_question("u1", &session.id, &h.events)
            .await
            .unwrap();
        assert!(matches!(h.next().await, InterviewEvent::NextQuestion { .. }));
    }

    #[tokio::test]
    async fn persistent_save_failure_surfaces_and_leaves_store_unchanged() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;
        h.store.fail_next_saves(2);

        let err = h
            .service
            .skip_question("u1", &session.id, &h.events)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "PERSISTENCE_ERROR");
        assert!(h.rx.try_recv().is_err());

        let stored = h.stored(&session.id).await;
        assert_eq!(stored.current_question_index, 0);
        assert_eq!(stored.questions[0].answer, "");
        assert!(!h.service.pacing().is_pending(&session.id));
    }

    #[tokio::test(start_paused = true)]
    async fn skip_delivers_advance_lost_to_cancelled_timer() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;
        let question_id = session.questions[0].question_id.clone();
        h.provider.push_text(evaluation_json(7));

        h.service
            .submit_answer("u1", h.submit(&session, &question_id, LONG_ANSWER), &h.events)
            .await
            .unwrap();
        assert!(matches!(h.next().await, InterviewEvent::AiThinking { .. }));
        assert!(matches!(h.next().await, InterviewEvent::EvaluationStream { .. }));
        assert!(matches!(h.next().await, InterviewEvent::EvaluationComplete { .. }));

        // A dropped connection cancels the timer without pausing the session
        assert!(h.service.pacing().cancel(&session.id));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(h.rx.try_recv().is_err());
        assert!(h.stored(&session.id).await.needs_advance());

        h.service
            .skip_question("u1", &session.id, &h.events)
            .await
            .unwrap();
        match h.next().await {
            InterviewEvent::NextQuestion { question_number, .. } => assert_eq!(question_number, 2),
            other => panic!("unexpected event: {other:?}"),
        }
        let stored = h.stored(&session.id).await;
        assert_eq!(stored.current_question_index, 1);
        assert_eq!(stored.questions.len(), 2);
        assert_eq!(stored.questions[0].answer, LONG_ANSWER);
        assert_eq!(stored.questions[0].evaluation.score, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn skip_on_finished_session_completes_it() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;
        let last = h.skip_to_last(&session).await;
        h.provider.push_text(evaluation_json(6));

        h.service
            .submit_answer("u1", h.submit(&session, &last, LONG_ANSWER), &h.events)
            .await
            .unwrap();
        assert!(matches!(h.next().await, InterviewEvent::AiThinking { .. }));
        assert!(matches!(h.next().await, InterviewEvent::EvaluationStream { .. }));
        assert!(matches!(h.next().await, InterviewEvent::EvaluationComplete { .. }));
        h.service.pacing().cancel(&session.id);

        h.service
            .skip_question("u1", &session.id, &h.events)
            .await
            .unwrap();
        match h.next().await {
            InterviewEvent::InterviewComplete { overall_score, .. } => assert_eq!(overall_score, 60),
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(h.stored(&session.id).await.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn lost_save_ack_is_treated_as_success() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;
        h.store.lose_next_save_acks(1);

        h.service
            .skip_question("u1", &session.id, &h.events)
            .await
            .unwrap();
        match h.next().await {
            InterviewEvent::NextQuestion { question_number, .. } => assert_eq!(question_number, 2),
            other => panic!("unexpected event: {other:?}"),
        }

        let stored = h.stored(&session.id).await;
        assert_eq!(stored.current_question_index, 1);
        assert_eq!(stored.questions[0].answer, SKIPPED_ANSWER);
        assert_eq!(stored.questions.len(), 2);
        assert!(stored.invariants_hold());
    }

    #[tokio::test]
    async fn retry_conflicting_with_other_write_still_fails() {
        let h = Harness::new().await;
        let session = h
            .service
            .start("u1", start_command("technical", "easy", None), &h.events)
            .await
            .unwrap();
        let mut edited = session.clone();
        edited.status = SessionStatus::Paused;
        h.store.save(&edited).await.unwrap();
        h.store.fail_next_saves(1);

        let mut stale = session;
        stale.current_question_index = 1;
        let err = h.service.save(&stale).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn final_answer_completes_interview_once() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;
        let last = h.skip_to_last(&session).await;
        h.provider.push_text(evaluation_json(9));

        h.service
            .submit_answer("u1", h.submit(&session, &last, LONG_ANSWER), &h.events)
            .await
            .unwrap();
        assert!(matches!(h.next().await, InterviewEvent::AiThinking { .. }));
        assert!(matches!(h.next().await, InterviewEvent::EvaluationStream { .. }));
        assert!(matches!(h.next().await, InterviewEvent::EvaluationComplete { .. }));

        let before = tokio::time::Instant::now();
        match h.next().await {
            InterviewEvent::InterviewComplete {
                overall_score,
                questions_answered,
                total_questions,
                total_time_spent,
                ..
            } => {
                assert_eq!(overall_score, 90);
                assert_eq!(questions_answered, 1);
                assert_eq!(total_questions, 5);
                assert_eq!(total_time_spent, 30);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(before.elapsed() >= Duration::from_secs(3));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(h.rx.try_recv().is_err());
        let stored = h.stored(&session.id).await;
        assert_eq!(stored.status, SessionStatus::Completed);
        assert_eq!(stored.current_question_index, 5);
        assert_eq!(stored.overall_score, 90);
        assert!(stored.final_report.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_during_final_delay_then_resume_completes_once() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;
        let last = h.skip_to_last(&session).await;
        h.provider.push_text(evaluation_json(9));

        h.service
            .submit_answer("u1", h.submit(&session, &last, LONG_ANSWER), &h.events)
            .await
            .unwrap();
        h.service.pause(&session.id, &h.events).await.unwrap();
        assert!(matches!(h.next().await, InterviewEvent::AiThinking { .. }));
        assert!(matches!(h.next().await, InterviewEvent::EvaluationStream { .. }));
        assert!(matches!(h.next().await, InterviewEvent::EvaluationComplete { .. }));
        assert!(matches!(h.next().await, InterviewEvent::InterviewPaused { .. }));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(h.rx.try_recv().is_err());
        let stored = h.stored(&session.id).await;
        assert_eq!(stored.status, SessionStatus::Paused);
        assert_eq!(stored.current_question_index, 5);
        assert!(stored.completed_at.is_none());

        h.service.resume(&session.id, &h.events).await.unwrap();
        assert!(matches!(h.next().await, InterviewEvent::InterviewResumed { .. }));
        match h.next().await {
            InterviewEvent::InterviewComplete { overall_score, .. } => assert_eq!(overall_score, 90),
            other => panic!("unexpected event: {other:?}"),
        }

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(h.rx.try_recv().is_err());
        assert_eq!(h.stored(&session.id).await.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn advance_superseded_by_pause_and_resume_is_dropped() {
        let mut h = Harness::new().await;
        let session = h.start("quick").await;
        let slot = h.service.pacing().begin(&session.id).unwrap();
        let mut late = h.stored(&session.id).await;
        late.questions
            .push(Question::new("Late question", Category::Dsa, Difficulty::Easy).into());

        h.service.pause(&session.id, &h.events).await.unwrap();
        h.service.resume(&session.id, &h.events).await.unwrap();
        assert!(matches!(h.next().await, InterviewEvent::InterviewPaused { .. }));
        assert!(matches!(h.next().await, InterviewEvent::InterviewResumed { .. }));

        let saved = h.service.persist_advance(&late, &slot).await.unwrap();
        assert!(saved.is_none());
        assert_eq!(h.stored(&session.id).await.questions.len(), 1);
    }

    #[tokio::test]
    async fn reap_stale_abandons_idle_sessions() {
        let h = Harness::new().await;
        let session = h
            .service
            .start("u1", start_command("technical", "easy", None), &h.events)
            .await
            .unwrap();

        assert_eq!(h.service.reap_stale(Duration::from_secs(3600)).await.unwrap(), 0);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(h.service.reap_stale(Duration::ZERO).await.unwrap(), 1);
        assert_eq!(h.stored(&session.id).await.status, SessionStatus::Abandoned);
    }

    #[tokio::test]
    async fn list_sessions_by_status() {
        let h = Harness::new().await;
        let session = h
            .service
            .start("u1", start_command("technical", "easy", None), &h.events)
            .await
            .unwrap();
        h.service.abandon(&session.id).await.unwrap();

        let abandoned = h
            .service
            .list_sessions("u1", SessionStatus::Abandoned)
            .await
            .unwrap();
        assert_eq!(abandoned.len(), 1);
        assert!(
            h.service
                .list_sessions("u1", SessionStatus::Completed)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
