//! Prompt construction for question generation and answer evaluation

use std::fmt::Write;

use super::{EvaluationRequest, QuestionRequest};
use crate::session::InterviewType;

const DEFAULT_ROLE: &str = "Software Developer";
const DEFAULT_EXPERIENCE: &str = "Fresher";
const NOT_SPECIFIED: &str = "Not specified";

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() { default } else { value }
}

fn focus_areas(request: &QuestionRequest) -> String {
    match request.interview_type {
        InterviewType::Technical => [
            "Data Structures & Algorithms (arrays, trees, graphs, sorting, searching)",
            "System Design (scalability, databases, caching, load balancing)",
            "Technical concepts (OOP, design patterns, time/space complexity)",
            "Problem-solving and coding logic",
        ]
        .map(|area| format!("- {area}\n"))
        .concat(),
        InterviewType::Behavioral => [
            "STAR method questions (Situation, Task, Action, Result)",
            "Team collaboration and communication",
            "Conflict resolution and leadership",
            "Problem-solving in real scenarios",
            "Time management and prioritization",
        ]
        .map(|area| format!("- {area}\n"))
        .concat(),
        InterviewType::RoleSpecific => {
            let skills = request
                .resume
                .as_ref()
                .map(|r| r.skills.join(", "))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "General programming".to_string());
            let projects = request
                .resume
                .as_ref()
                .map(|r| {
                    r.projects
                        .iter()
                        .map(|p| p.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "None".to_string());
            format!(
                "- Technologies from resume: {skills}\n\
                 - Projects: {projects}\n\
                 - Role: {}\n\
                 - Practical application of their skills\n\
                 - Real-world scenarios related to their experience\n",
                request.target_role()
            )
        }
    }
}

/// Prompt asking for one new question as JSON
pub fn question_prompt(request: &QuestionRequest) -> String {
    let role = request.target_role();
    let experience = request
        .profile
        .as_ref()
        .map(|p| or_default(&p.experience, DEFAULT_EXPERIENCE))
        .unwrap_or(DEFAULT_EXPERIENCE);
    let skills = request
        .resume
        .as_ref()
        .map(|r| r.skills.join(", "))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NOT_SPECIFIED.to_string());
    let degree = request
        .profile
        .as_ref()
        .map(|p| or_default(&p.degree, NOT_SPECIFIED))
        .unwrap_or(NOT_SPECIFIED);
    let college = request
        .profile
        .as_ref()
        .map(|p| or_default(&p.college, NOT_SPECIFIED))
        .unwrap_or(NOT_SPECIFIED);
    let kind = request.interview_type;
    let difficulty = request.difficulty;

    let mut prompt = format!(
        "You are an expert technical interviewer conducting a {kind} interview.\n\n\
         Candidate Context:\n\
         - Target Role: {role}\n\
         - Experience Level: {experience}\n\
         - Skills: {skills}\n\
         - Education: {degree} from {college}\n\n\
         Focus Areas:\n{focus}\n\
         Interview Settings:\n\
         - Difficulty Level: {difficulty}\n\
         - Question Number: {number}\n",
        focus = focus_areas(request),
        number = request.question_number,
    );

    if !request.previous_questions.is_empty() {
        prompt.push_str("\nPreviously Asked Questions (DO NOT REPEAT):\n");
        for (i, text) in request.previous_questions.iter().enumerate() {
            let _ = writeln!(prompt, "{}. {text}", i + 1);
        }
    }

    let _ = write!(
        prompt,
        "\nTask:\n\
         Generate ONE unique, engaging interview question that:\n\
         1. Matches the {difficulty} difficulty level\n\
         2. Is appropriate for {kind} interview\n\
         3. Is relevant to {role} role\n\
         4. Considers candidate's {experience} experience level\n\
         5. Does NOT repeat any previous questions\n\n\
         Return ONLY valid JSON in this format:\n\
         {{\n  \"text\": \"Your question here?\",\n  \
         \"category\": \"DSA\" | \"System Design\" | \"Behavioral\" | \"Technical\" | \"General\",\n  \
         \"difficulty\": \"easy\" | \"medium\" | \"hard\"\n}}\n"
    );
    prompt
}

/// Prompt asking for a JSON evaluation of one answer
pub fn evaluation_prompt(request: &EvaluationRequest) -> String {
    format!(
        "You are an expert interviewer evaluating a candidate's answer.\n\n\
         Question Details:\n\
         - Question: {question}\n\
         - Category: {category}\n\
         - Difficulty: {difficulty}\n\n\
         Candidate's Answer:\n\"{answer}\"\n\n\
         Evaluate this answer and provide:\n\
         1. Score (1-10): 1-3 poor, 4-6 average, 7-8 good, 9-10 excellent\n\
         2. Feedback (2-4 sentences)\n\
         3. Strengths (2-3 specific points)\n\
         4. Areas for improvement (2-3 specific suggestions)\n\n\
         Return ONLY valid JSON in this format:\n\
         {{\n  \"score\": 8,\n  \"feedback\": \"...\",\n  \
         \"strengths\": [\"...\"],\n  \"improvements\": [\"...\"]\n}}\n",
        question = request.question,
        category = request.category,
        difficulty = request.difficulty,
        answer = request.answer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{CandidateProfile, Project, ResumeData};
    use crate::session::{Category, Difficulty};

    fn request(kind: InterviewType) -> QuestionRequest {
        QuestionRequest {
            interview_type: kind,
            difficulty: Difficulty::Hard,
            profile: Some(CandidateProfile {
                target_role: "Platform Engineer".into(),
                college: "IIT Delhi".into(),
                ..Default::default()
            }),
            resume: Some(ResumeData {
                skills: vec!["Rust".into(), "Kubernetes".into()],
                projects: vec![Project {
                    name: "edge-proxy".into(),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            question_number: 3,
            previous_questions: vec!["What is a mutex?".into(), "Explain TCP.".into()],
        }
    }

    #[test]
    fn question_prompt_lists_previous_questions() {
        let prompt = question_prompt(&request(InterviewType::Technical));
        assert!(prompt.contains("DO NOT REPEAT"));
        assert!(prompt.contains("1. What is a mutex?"));
        assert!(prompt.contains("2. Explain TCP."));
        assert!(prompt.contains("Question Number: 3"));
        assert!(prompt.contains("Difficulty Level: hard"));
    }

    #[test]
    fn first_question_prompt_has_no_repeat_section() {
        let mut req = request(InterviewType::Behavioral);
        req.previous_questions.clear();
        let prompt = question_prompt(&req);
        assert!(!prompt.contains("DO NOT REPEAT"));
        assert!(prompt.contains("STAR method"));
    }

    #[test]
    fn role_specific_prompt_uses_resume() {
        let prompt = question_prompt(&request(InterviewType::RoleSpecific));
        assert!(prompt.contains("Technologies from resume: Rust, Kubernetes"));
        assert!(prompt.contains("Projects: edge-proxy"));
        assert!(prompt.contains("Role: Platform Engineer"));
        assert!(prompt.contains("Education: Not specified from IIT Delhi"));
    }

    #[test]
    fn prompt_without_profile_uses_defaults() {
        let req = QuestionRequest {
            profile: None,
            resume: None,
            ..request(InterviewType::Technical)
        };
        let prompt = question_prompt(&req);
        assert!(prompt.contains("Target Role: Software Developer"));
        assert!(prompt.contains("Experience Level: Fresher"));
        assert!(prompt.contains("Skills: Not specified"));
    }

    #[test]
    fn evaluation_prompt_embeds_answer() {
        let prompt = evaluation_prompt(&EvaluationRequest {
            question: "What is a B-tree?".into(),
            answer: "A balanced search tree".into(),
            category: Category::Dsa,
            difficulty: Difficulty::Medium,
        });
        assert!(prompt.contains("Question: What is a B-tree?"));
        assert!(prompt.contains("Category: DSA"));
        assert!(prompt.contains("\"A balanced search tree\""));
    }
}
