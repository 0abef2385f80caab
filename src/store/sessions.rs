// src/store/sessions.rs

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::{
    quiz_progress::QuizMode,
    quiz_session::{QuizSessionRecord, QuizSummary},
};

pub async fn insert_session(
    conn: &mut SqliteConnection,
    user_id: i64,
    mode: QuizMode,
    summary: &QuizSummary,
) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO quiz_sessions
            (user_id, mode, total_questions, correct_answers, accuracy, total_time, completed_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(mode.as_str())
    .bind(summary.total_questions as i64)
    .bind(i64::from(summary.correct_answers))
    .bind(summary.accuracy)
    .bind(summary.total_time as i64)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Finished sessions of one user, oldest first.
pub async fn sessions_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<QuizSessionRecord>, sqlx::Error> {
    sqlx::query_as::<_, QuizSessionRecord>(
        r#"
        SELECT id, user_id, mode, total_questions, correct_answers, accuracy, total_time, completed_at
        FROM quiz_sessions
        WHERE user_id = ?
        ORDER BY completed_at ASC, id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
