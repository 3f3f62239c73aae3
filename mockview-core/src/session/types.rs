//! Session and question record types
//!
//! These are the documents the session store persists. Field names are
//! camelCase on the wire and in storage.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InterviewError;

/// Answer recorded for a skipped question
pub const SKIPPED_ANSWER: &str = "[SKIPPED]";

/// Kind of interview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterviewType {
    Technical,
    Behavioral,
    RoleSpecific,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::Technical => "technical",
            InterviewType::Behavioral => "behavioral",
            InterviewType::RoleSpecific => "role-specific",
        }
    }
}

impl FromStr for InterviewType {
    type Err = InterviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "technical" => Ok(InterviewType::Technical),
            "behavioral" => Ok(InterviewType::Behavioral),
            "role-specific" => Ok(InterviewType::RoleSpecific),
            other => Err(InterviewError::Validation(format!(
                "Invalid interview type: {other}"
            ))),
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = InterviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(InterviewError::Validation(format!(
                "Invalid difficulty level: {other}"
            ))),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interview length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationTier {
    Quick,
    #[default]
    Standard,
    Full,
}

impl DurationTier {
    /// Parse a tier name, falling back to `Standard` for anything unrecognized
    pub fn parse_or_default(tier: Option<&str>) -> Self {
        match tier {
            Some("quick") => DurationTier::Quick,
            Some("full") => DurationTier::Full,
            _ => DurationTier::Standard,
        }
    }

    /// Number of questions asked in this tier
    pub fn total_questions(&self) -> u32 {
        match self {
            DurationTier::Quick => 5,
            DurationTier::Standard => 10,
            DurationTier::Full => 15,
        }
    }
}

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    InProgress,
    Paused,
    Completed,
    Abandoned,
}

impl SessionStatus {
    /// Completed and abandoned sessions never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Abandoned)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in-progress",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = InterviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-progress" => Ok(SessionStatus::InProgress),
            "paused" => Ok(SessionStatus::Paused),
            "completed" => Ok(SessionStatus::Completed),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(InterviewError::Validation(format!(
                "Invalid session status: {other}"
            ))),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "DSA")]
    Dsa,
    #[serde(rename = "System Design")]
    SystemDesign,
    Behavioral,
    Technical,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Dsa => "DSA",
            Category::SystemDesign => "System Design",
            Category::Behavioral => "Behavioral",
            Category::Technical => "Technical",
            Category::General => "General",
        }
    }
}

impl FromStr for Category {
    type Err = InterviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DSA" => Ok(Category::Dsa),
            "System Design" => Ok(Category::SystemDesign),
            "Behavioral" => Ok(Category::Behavioral),
            "Technical" => Ok(Category::Technical),
            "General" => Ok(Category::General),
            other => Err(InterviewError::Validation(format!(
                "Invalid question category: {other}"
            ))),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated question as shown to the candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub category: Category,
    pub difficulty: Difficulty,
}

impl Question {
    /// Create a question with a fresh id
    pub fn new(text: impl Into<String>, category: Category, difficulty: Difficulty) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            category,
            difficulty,
        }
    }
}

/// Evaluation of one answer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Evaluation {
    /// 0..=10
    pub score: u8,
    pub feedback: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

impl Evaluation {
    /// Zero-score evaluation recorded when a question is skipped
    pub fn skipped() -> Self {
        Self {
            score: 0,
            feedback: "Question was skipped".to_string(),
            strengths: Vec::new(),
            improvements: vec!["Answer the question to get feedback".to_string()],
        }
    }
}

/// One asked question and its outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub question_id: String,
    pub text: String,
    pub category: Category,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub evaluation: Evaluation,
    /// Seconds
    #[serde(default)]
    pub time_spent: u64,
    #[serde(default)]
    pub answered_at: Option<DateTime<Utc>>,
}

impl QuestionRecord {
    /// True once a real (non-skip) answer has been recorded
    pub fn is_answered(&self) -> bool {
        !self.answer.is_empty() && !self.is_skipped()
    }

    pub fn is_skipped(&self) -> bool {
        self.answer == SKIPPED_ANSWER
    }

    /// The candidate-facing view of this record
    pub fn question(&self) -> Question {
        Question {
            id: self.question_id.clone(),
            text: self.text.clone(),
            category: self.category,
            difficulty: self.difficulty,
        }
    }
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        Self {
            question_id: question.id,
            text: question.text,
            category: question.category,
            difficulty: question.difficulty,
            answer: String::new(),
            evaluation: Evaluation::default(),
            time_spent: 0,
            answered_at: None,
        }
    }
}

/// Qualitative summary produced when a session completes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendations: Vec<String>,
    /// Category -> 0..=100
    #[serde(default)]
    pub category_scores: BTreeMap<Category, u32>,
}

/// One interview attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub interview_type: InterviewType,
    pub difficulty: Difficulty,
    pub duration_tier: DurationTier,
    pub status: SessionStatus,
    pub current_question_index: u32,
    pub total_questions: u32,
    pub questions: Vec<QuestionRecord>,
    pub overall_score: u32,
    pub final_report: Option<FinalReport>,
    /// Seconds
    pub total_time_spent: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// Incremented by the store on every successful save
    pub version: u64,
}

impl Session {
    /// Create an in-progress session holding its first question
    pub fn new(
        user_id: impl Into<String>,
        interview_type: InterviewType,
        difficulty: Difficulty,
        duration_tier: DurationTier,
        first_question: Question,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            interview_type,
            difficulty,
            duration_tier,
            status: SessionStatus::InProgress,
            current_question_index: 0,
            total_questions: duration_tier.total_questions(),
            questions: vec![first_question.into()],
            overall_score: 0,
            final_report: None,
            total_time_spent: 0,
            started_at: now,
            completed_at: None,
            updated_at: now,
            version: 0,
        }
    }

    /// Record at the current pointer, if it has been generated
    pub fn current_record(&self) -> Option<&QuestionRecord> {
        self.questions.get(self.current_question_index as usize)
    }

    /// Position of a question by id
    pub fn position_of(&self, question_id: &str) -> Option<usize> {
        self.questions
            .iter()
            .position(|q| q.question_id == question_id)
    }

    /// All questions have been answered or skipped
    pub fn is_finished(&self) -> bool {
        self.current_question_index >= self.total_questions
    }

    /// Number of questions with a real (non-skip) answer
    pub fn answered_count(&self) -> u32 {
        self.questions.iter().filter(|q| q.is_answered()).count() as u32
    }

    /// Recompute `total_time_spent` from the records
    pub fn recompute_total_time(&mut self) {
        self.total_time_spent = self.questions.iter().map(|q| q.time_spent).sum();
    }

    /// An advance is owed: either the next question was never generated or
    /// the session ran out of questions without being finalized
    pub fn needs_advance(&self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        if self.is_finished() {
            return true;
        }
        self.questions.len() == self.current_question_index as usize
    }

    /// `0 <= current <= total` and `questions.len() >= current`
    pub fn invariants_hold(&self) -> bool {
        self.current_question_index <= self.total_questions
            && self.questions.len() >= self.current_question_index as usize
    }
}
