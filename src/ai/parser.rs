// src/ai/parser.rs

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::GenerationError;
use crate::models::question::{Difficulty, Question, QuestionSource};

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```json\s*").unwrap());
static BARE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```\s*").unwrap());
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());

const REQUIRED_KEYS: [&str; 4] = ["question", "options", "correct_answer", "explanation"];

/// Strips markdown fences and replaces typographic quotes with ASCII ones.
pub fn clean_response_text(text: &str) -> String {
    let cleaned = JSON_FENCE.replace_all(text, "");
    let cleaned = BARE_FENCE.replace_all(&cleaned, "");

    cleaned
        .trim()
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

/// Extracts a JSON array from model output.
///
/// Tries, in order: the whole text, the first value starting at the first
/// `[`, and the outermost `[...]` slice with trailing commas removed.
pub fn parse_questions_response(text: &str) -> Result<Vec<Value>, GenerationError> {
    let cleaned = clean_response_text(text);

    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&cleaned) {
        return Ok(items);
    }

    let Some(first) = cleaned.find('[') else {
        return Err(GenerationError::Parse("no JSON array found".to_string()));
    };

    let mut stream = serde_json::Deserializer::from_str(&cleaned[first..]).into_iter::<Value>();
    if let Some(Ok(Value::Array(items))) = stream.next() {
        return Ok(items);
    }

    let last = cleaned
        .rfind(']')
        .filter(|last| *last > first)
        .ok_or_else(|| GenerationError::Parse("unterminated JSON array".to_string()))?;
    let candidate = TRAILING_COMMA.replace_all(&cleaned[first..=last], "$1");

    match serde_json::from_str::<Value>(&candidate) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(GenerationError::Parse("response is not a JSON array".to_string())),
        Err(e) => Err(GenerationError::Parse(e.to_string())),
    }
}

/// Turns the first `count` raw items into questions, skipping malformed ones.
pub fn validate_questions(
    items: &[Value],
    topic: &str,
    difficulty: Difficulty,
    count: usize,
) -> Vec<Question> {
    items
        .iter()
        .take(count)
        .enumerate()
        .filter_map(|(i, item)| {
            let question = validate_question(item, topic, difficulty, i + 1);
            if question.is_none() {
                tracing::warn!("Skipping invalid question payload at position {}", i + 1);
            }
            question
        })
        .collect()
}

fn validate_question(item: &Value, topic: &str, difficulty: Difficulty, position: usize) -> Option<Question> {
    let object = item.as_object()?;
    if !REQUIRED_KEYS.iter().all(|key| object.contains_key(*key)) {
        return None;
    }

    let options: Vec<String> = object["options"]
        .as_array()?
        .iter()
        .map(|o| o.as_str().map(str::to_string))
        .collect::<Option<_>>()?;
    if options.len() != 4 {
        return None;
    }

    let correct_answer = object["correct_answer"].as_u64().filter(|a| *a <= 3)?;

    Some(Question {
        id: format!("ai_{}_{}", topic, position),
        topic: topic.to_string(),
        difficulty,
        question: object["question"].as_str()?.to_string(),
        options,
        correct_answer: correct_answer as u8,
        explanation: object["explanation"].as_str()?.to_string(),
        source: QuestionSource::Ai,
    })
}
