//! Score and report aggregation over a session's question records
//!
//! Two filters are in play. `overall_score` and `category_breakdown` count
//! records whose evaluation score is above zero, so a genuine zero-scored
//! answer is excluded along with skips. `final_report` counts records that
//! carry a real answer. Both are kept as-is.

use std::collections::BTreeMap;

use crate::session::{Category, FinalReport, QuestionRecord, Session};

const STRENGTH_THRESHOLD: f64 = 7.0;
const WEAKNESS_THRESHOLD: f64 = 5.0;
const FUNDAMENTALS_THRESHOLD: f64 = 6.0;

fn scored(session: &Session) -> impl Iterator<Item = &QuestionRecord> {
    session.questions.iter().filter(|q| q.evaluation.score > 0)
}

fn mean(scores: &[u8]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let total: u32 = scores.iter().map(|&s| u32::from(s)).sum();
    Some(f64::from(total) / scores.len() as f64)
}

fn to_percent(mean: f64) -> u32 {
    (mean * 10.0).round().clamp(0.0, 100.0) as u32
}

fn group_by_category<'a>(
    records: impl Iterator<Item = &'a QuestionRecord>,
) -> BTreeMap<Category, Vec<u8>> {
    let mut groups: BTreeMap<Category, Vec<u8>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.category)
            .or_default()
            .push(record.evaluation.score);
    }
    groups
}

/// Overall score on a 0..=100 scale; 0 when nothing scored above zero
pub fn overall_score(session: &Session) -> u32 {
    let scores: Vec<u8> = scored(session).map(|q| q.evaluation.score).collect();
    mean(&scores).map(to_percent).unwrap_or(0)
}

/// Per-category score on a 0..=100 scale
pub fn category_breakdown(session: &Session) -> BTreeMap<Category, u32> {
    group_by_category(scored(session))
        .into_iter()
        .filter_map(|(category, scores)| mean(&scores).map(|m| (category, to_percent(m))))
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Qualitative report built from the answered (non-skipped) records
///
/// `category_scores` is left empty; the completion path fills it from
/// [`category_breakdown`].
pub fn final_report(session: &Session) -> FinalReport {
    let answered: Vec<&QuestionRecord> =
        session.questions.iter().filter(|q| q.is_answered()).collect();

    if answered.is_empty() {
        return FinalReport {
            strengths: strings(&["Completed the interview session"]),
            weaknesses: strings(&["No questions were answered"]),
            recommendations: strings(&[
                "Try answering questions next time",
                "Practice interview skills",
            ]),
            category_scores: BTreeMap::new(),
        };
    }

    let all_scores: Vec<u8> = answered.iter().map(|q| q.evaluation.score).collect();
    let average = mean(&all_scores).unwrap_or(0.0);

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    for (category, scores) in group_by_category(answered.iter().copied()) {
        let Some(category_average) = mean(&scores) else {
            continue;
        };
        if category_average >= STRENGTH_THRESHOLD {
            strengths.push(format!("Strong performance in {category} questions"));
        } else if category_average < WEAKNESS_THRESHOLD {
            weaknesses.push(format!("Need improvement in {category} questions"));
        }
    }

    if strengths.is_empty() {
        strengths = strings(&["Completed the interview", "Showed effort in answering questions"]);
    }
    if weaknesses.is_empty() {
        weaknesses = strings(&["Keep practicing to improve further"]);
    }

    let first = if average < FUNDAMENTALS_THRESHOLD {
        "Focus on strengthening fundamental concepts"
    } else {
        "Continue practicing to maintain your skills"
    };

    FinalReport {
        strengths,
        weaknesses,
        recommendations: strings(&[
            first,
            "Review questions you found challenging",
            "Practice more mock interviews to build confidence",
        ]),
        category_scores: BTreeMap::new(),
    }
}
