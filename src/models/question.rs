// src/models/question.rs

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionSource {
    #[serde(rename = "Static Bank")]
    StaticBank,
    #[serde(rename = "AI Generated")]
    Ai,
    #[serde(rename = "Static Fallback")]
    StaticFallback,
}

/// A four-option multiple-choice question, from the static bank or the AI source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,

    /// Free-text topic label (e.g., "Logical Reasoning").
    pub topic: String,

    pub difficulty: Difficulty,

    pub question: String,

    /// Always exactly four entries.
    pub options: Vec<String>,

    /// Index into `options`, in 0..=3.
    pub correct_answer: u8,

    pub explanation: String,

    pub source: QuestionSource,
}

/// DTO for sending a question to the client (excludes answer and explanation).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: String,
    pub topic: String,
    pub difficulty: Difficulty,
    pub question: String,
    pub options: Vec<String>,
    pub source: QuestionSource,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            topic: q.topic.clone(),
            difficulty: q.difficulty,
            question: q.question.clone(),
            options: q.options.clone(),
            source: q.source,
        }
    }
}
