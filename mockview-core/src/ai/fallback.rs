//! Deterministic content used when the model cannot be relied on

use crate::profile::{CandidateProfile, ResumeData};
use crate::session::{Category, Difficulty, Evaluation, InterviewType, Question};

/// Answers shorter than this (after trimming) are not sent to the model
pub const MIN_ANSWER_LEN: usize = 10;

const DEFAULT_ROLE: &str = "Software Developer";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Canned question keyed by interview type and difficulty
pub fn fallback_question(
    interview_type: InterviewType,
    difficulty: Difficulty,
    profile: Option<&CandidateProfile>,
    resume: Option<&ResumeData>,
) -> Question {
    let role = profile
        .map(|p| p.target_role.as_str())
        .filter(|role| !role.is_empty());

    let text = match (interview_type, difficulty) {
        (InterviewType::Technical, Difficulty::Easy) => {
            "What is the difference between let, const, and var in JavaScript?".to_string()
        }
        (InterviewType::Technical, Difficulty::Medium) => {
            "Explain how you would implement a function to reverse a linked list.".to_string()
        }
        (InterviewType::Technical, Difficulty::Hard) => {
            "Design a distributed cache system that can handle millions of requests per second."
                .to_string()
        }
        (InterviewType::Behavioral, Difficulty::Easy) => {
            "Tell me about yourself and your background.".to_string()
        }
        (InterviewType::Behavioral, Difficulty::Medium) => {
            "Describe a time when you had to work under pressure to meet a deadline.".to_string()
        }
        (InterviewType::Behavioral, Difficulty::Hard) => {
            "Tell me about a time when you had to make a difficult decision that affected your team."
                .to_string()
        }
        (InterviewType::RoleSpecific, Difficulty::Easy) => format!(
            "What interests you about the {} role?",
            role.unwrap_or(DEFAULT_ROLE)
        ),
        (InterviewType::RoleSpecific, Difficulty::Medium) => {
            let skill = resume
                .and_then(|r| r.skills.first())
                .map(String::as_str)
                .unwrap_or("your skills");
            format!("Describe a project where you used {skill}.")
        }
        (InterviewType::RoleSpecific, Difficulty::Hard) => format!(
            "How would you architect a scalable {} application?",
            role.map(str::to_lowercase)
                .unwrap_or_else(|| "web".to_string())
        ),
    };

    let category = match interview_type {
        InterviewType::Behavioral => Category::Behavioral,
        _ => Category::Technical,
    };

    Question::new(text, category, difficulty)
}

/// Low score for answers too short to evaluate
pub fn short_answer_evaluation() -> Evaluation {
    Evaluation {
        score: 1,
        feedback: "The answer provided was too brief. Please provide more detailed responses."
            .to_string(),
        strengths: Vec::new(),
        improvements: strings(&[
            "Provide more detailed explanations",
            "Include specific examples",
            "Elaborate on your thought process",
        ]),
    }
}

/// Mid score used when the model fails to evaluate
pub fn fallback_evaluation() -> Evaluation {
    Evaluation {
        score: 5,
        feedback: "Your answer shows understanding of the topic. Consider providing more specific examples and details to strengthen your response."
            .to_string(),
        strengths: strings(&[
            "Attempted to answer the question",
            "Shows basic understanding",
        ]),
        improvements: strings(&[
            "Provide more specific examples",
            "Elaborate on key concepts",
            "Structure your answer more clearly",
        ]),
    }
}

/// Whether an answer is too short to be worth a model call
pub fn is_too_short(answer: &str) -> bool {
    answer.trim().chars().count() < MIN_ANSWER_LEN
}
