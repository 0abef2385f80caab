// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'practice_activities' table.
/// One row per answered question. Rows are only ever inserted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub id: i64,
    pub user_id: i64,
    pub question_id: String,
    pub topic: String,
    pub difficulty: String,
    pub selected_option: i64,
    pub correct_answer: i64,
    pub is_correct: bool,

    /// Seconds spent on the question.
    pub time_taken: i64,

    pub attempted_at: chrono::DateTime<chrono::Utc>,
}

/// Insert payload for a new attempt.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub user_id: i64,
    pub question_id: String,
    pub topic: String,
    pub difficulty: String,
    pub selected_option: i64,
    pub correct_answer: i64,
    pub time_taken: i64,
}

impl NewAttempt {
    pub fn is_correct(&self) -> bool {
        self.selected_option == self.correct_answer
    }
}
