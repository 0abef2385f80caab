// src/store/attempts.rs

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::attempt::{AttemptRecord, NewAttempt};

pub async fn insert_attempt(conn: &mut SqliteConnection, attempt: &NewAttempt) -> Result<i64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO practice_activities
            (user_id, question_id, topic, difficulty, selected_option, correct_answer, is_correct, time_taken, attempted_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(attempt.user_id)
    .bind(&attempt.question_id)
    .bind(&attempt.topic)
    .bind(&attempt.difficulty)
    .bind(attempt.selected_option)
    .bind(attempt.correct_answer)
    .bind(attempt.is_correct())
    .bind(attempt.time_taken)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Full history of one user, oldest first.
pub async fn attempts_for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<AttemptRecord>, sqlx::Error> {
    sqlx::query_as::<_, AttemptRecord>(
        r#"
        SELECT id, user_id, question_id, topic, difficulty, selected_option,
               correct_answer, is_correct, time_taken, attempted_at
        FROM practice_activities
        WHERE user_id = ?
        ORDER BY attempted_at ASC, id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn has_attempts(pool: &SqlitePool, user_id: i64) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM practice_activities WHERE user_id = ? LIMIT 1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(found.is_some())
}
