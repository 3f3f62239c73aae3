//! Strict decoding of model output
//!
//! Model replies are expected to be a single JSON object, optionally
//! wrapped in one markdown code fence. Anything else is a [`DecodeError`],
//! which callers turn into fallback content.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::session::{Category, Difficulty, Evaluation};

const MAX_LIST_ITEMS: usize = 3;
const DEFAULT_FEEDBACK: &str = "Answer evaluated.";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("model returned an empty reply")]
    Empty,

    #[error("unterminated code fence")]
    UnterminatedFence,

    #[error("reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reply is not a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Question fields produced by the model
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedQuestion {
    pub text: String,
    pub category: Category,
    pub difficulty: Difficulty,
}

/// Remove a single surrounding markdown fence, if present
fn strip_fence(raw: &str) -> Result<&str, DecodeError> {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return Ok(trimmed);
    };
    // Drop the info string (e.g. `json`) on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => return Err(DecodeError::UnterminatedFence),
    };
    body.trim_end()
        .strip_suffix("```")
        .map(str::trim)
        .ok_or(DecodeError::UnterminatedFence)
}

fn parse_object(raw: &str) -> Result<Map<String, Value>, DecodeError> {
    let body = strip_fence(raw)?;
    if body.is_empty() {
        return Err(DecodeError::Empty);
    }
    match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(DecodeError::NotAnObject),
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> DecodeError {
    DecodeError::InvalidField {
        field,
        reason: reason.into(),
    }
}

fn string_list(map: &Map<String, Value>, field: &'static str) -> Result<Vec<String>, DecodeError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .take(MAX_LIST_ITEMS)
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| invalid(field, "expected an array of strings"))
            })
            .collect(),
        Some(_) => Err(invalid(field, "expected an array")),
    }
}

/// Decode a generated question
///
/// `difficulty` is used when the model leaves it out.
pub fn decode_question(raw: &str, difficulty: Difficulty) -> Result<DecodedQuestion, DecodeError> {
    let map = parse_object(raw)?;

    let text = match map.get("text") {
        Some(Value::String(text)) if !text.trim().is_empty() => text.trim().to_string(),
        Some(Value::String(_)) => return Err(invalid("text", "empty")),
        Some(_) => return Err(invalid("text", "expected a string")),
        None => return Err(DecodeError::MissingField("text")),
    };

    let category = match map.get("category") {
        Some(Value::String(name)) => name
            .parse::<Category>()
            .map_err(|_| invalid("category", format!("unknown category {name:?}")))?,
        Some(_) => return Err(invalid("category", "expected a string")),
        None => return Err(DecodeError::MissingField("category")),
    };

    let difficulty = match map.get("difficulty") {
        None | Some(Value::Null) => difficulty,
        Some(Value::String(level)) => level
            .parse::<Difficulty>()
            .map_err(|_| invalid("difficulty", format!("unknown level {level:?}")))?,
        Some(_) => return Err(invalid("difficulty", "expected a string")),
    };

    Ok(DecodedQuestion {
        text,
        category,
        difficulty,
    })
}

/// Decode an answer evaluation
pub fn decode_evaluation(raw: &str) -> Result<Evaluation, DecodeError> {
    let map = parse_object(raw)?;

    let score = match map.get("score") {
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| invalid("score", "not representable"))?,
        Some(_) => return Err(invalid("score", "expected a number")),
        None => return Err(DecodeError::MissingField("score")),
    };
    if !score.is_finite() {
        return Err(invalid("score", "not finite"));
    }

    let feedback = match map.get("feedback") {
        Some(Value::String(text)) if !text.trim().is_empty() => text.trim().to_string(),
        None | Some(Value::Null) | Some(Value::String(_)) => DEFAULT_FEEDBACK.to_string(),
        Some(_) => return Err(invalid("feedback", "expected a string")),
    };

    Ok(Evaluation {
        score: score.round().clamp(0.0, 10.0) as u8,
        feedback,
        strengths: string_list(&map, "strengths")?,
        improvements: string_list(&map, "improvements")?,
    })
}
