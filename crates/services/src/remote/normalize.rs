//! Quiz content arrives either as a list of sections or as an object keyed by
//! section id, and each section as a list or as `question1..questionN`. Both
//! shapes are flattened here into ordered sections.

use serde::Deserialize;
use serde_json::{Map, Value};

use study_core::model::{OptionKey, QuestionDraft};

use crate::error::RemoteError;

#[derive(Debug, Deserialize)]
struct WireQuestion {
    question: String,
    opt1: String,
    opt2: String,
    opt3: String,
    opt4: String,
    answer: String,
    #[serde(default)]
    explanation: String,
}

pub(crate) fn sections(content: &Value) -> Result<Vec<Vec<QuestionDraft>>, RemoteError> {
    match content {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.iter().map(section).collect(),
        Value::Object(map) => ordered(map).into_iter().map(section).collect(),
        _ => Err(RemoteError::Decode(
            "quiz content must be a list or an object".into(),
        )),
    }
}

fn section(value: &Value) -> Result<Vec<QuestionDraft>, RemoteError> {
    match value {
        Value::Array(items) => items.iter().map(question).collect(),
        Value::Object(map) => ordered(map).into_iter().map(question).collect(),
        _ => Err(RemoteError::Decode(
            "quiz section must be a list or an object".into(),
        )),
    }
}

fn question(value: &Value) -> Result<QuestionDraft, RemoteError> {
    let wire = WireQuestion::deserialize(value)
        .map_err(|err| RemoteError::Decode(format!("malformed question: {err}")))?;
    let correct = wire
        .answer
        .parse::<OptionKey>()
        .map_err(|err| RemoteError::Decode(err.to_string()))?;
    Ok(QuestionDraft {
        prompt: wire.question,
        options: [wire.opt1, wire.opt2, wire.opt3, wire.opt4],
        correct,
        explanation: wire.explanation,
    })
}

/// Values ordered by the number their key ends with (`question10` after `question2`).
fn ordered(map: &Map<String, Value>) -> Vec<&Value> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|(a, _), (b, _)| {
        trailing_number(a)
            .cmp(&trailing_number(b))
            .then_with(|| a.cmp(b))
    });
    entries.into_iter().map(|(_, value)| value).collect()
}

fn trailing_number(key: &str) -> Option<u64> {
    let digits = key.len() - key.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    key[key.len() - digits..].parse().ok()
}
