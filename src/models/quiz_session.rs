// src/models/quiz_session.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'quiz_sessions' table in the database.
/// One row per finished quiz run that recorded at least one answer.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizSessionRecord {
    pub id: i64,
    pub user_id: i64,

    /// 'static' or 'adaptive'.
    pub mode: String,

    pub total_questions: i64,
    pub correct_answers: i64,
    pub accuracy: f64,

    /// Sum of per-question seconds.
    pub total_time: i64,

    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// Results shown once a run is finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizSummary {
    pub correct_answers: u32,
    pub total_questions: usize,
    pub answered: usize,
    pub accuracy: f64,
    pub total_time: u64,
    pub avg_time: f64,
}
