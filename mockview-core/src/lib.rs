//! mockview-core: interview session orchestration
//!
//! This crate provides the domain of the mock interview service:
//!
//! - **Sessions** - [`Session`] documents and the [`InterviewService`] state machine
//! - **AI client** - [`InterviewAi`] and [`ModelInterviewer`], with strict output
//!   decoding and deterministic fallback content
//! - **Scoring** - overall score, category breakdown and final report
//! - **Pacing** - [`PacingGuard`], one in-flight advance per session with a
//!   cancellable delay
//! - **Storage** - [`SessionStore`] with compare-and-swap saves
//! - **Identity** - [`TokenValidator`] for HS256 bearer tokens
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  InterviewService                    │
//! │  ┌─────────────┐ ┌──────────────┐ ┌───────────────┐  │
//! │  │ PacingGuard │ │ InterviewAi  │ │ SessionStore  │  │
//! │  └─────────────┘ └──────┬───────┘ └───────────────┘  │
//! │                         │          ┌───────────────┐ │
//! │                 dyn ModelProvider  │ProfileProvider│ │
//! │                                    └───────────────┘ │
//! └──────────────────────────┬───────────────────────────┘
//!                            │ InterviewEvent
//!                            ▼
//!                        EventSink
//! ```

pub mod ai;
pub mod auth;
pub mod error;
pub mod events;
pub mod pacing;
pub mod profile;
pub mod scoring;
pub mod session;
pub mod store;

// Re-export key types for convenience
pub use ai::{
    EvaluationRequest, EvaluationStream, EvaluationUpdate, InterviewAi, InterviewerConfig,
    ModelInterviewer, QuestionRequest,
};
pub use auth::{AuthConfig, AuthContext, AuthError, TokenValidator, UserIdentity};
pub use error::{InterviewError, StoreError};
pub use events::{EventSink, InterviewEvent};
pub use pacing::{AdvanceSlot, PacingGuard};
pub use profile::{CandidateProfile, MemoryProfileDirectory, ProfileProvider, ResumeData};
pub use session::{
    Category, Difficulty, DurationTier, Evaluation, FinalReport, InterviewService, InterviewType,
    Question, QuestionRecord, ServiceConfig, Session, SessionStatus, StartInterview, SubmitAnswer,
};
pub use store::{MemorySessionStore, SessionStore};
