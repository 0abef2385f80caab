// src/store/progress.rs

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    error::AppError,
    models::quiz_progress::{QuizMode, QuizProgress},
};

/// A run as read from the database, with the row version it was read at.
#[derive(Debug, Clone)]
pub struct StoredProgress {
    pub progress: QuizProgress,
    pub version: i64,
}

pub async fn load_progress(
    pool: &SqlitePool,
    user_id: i64,
    mode: QuizMode,
) -> Result<Option<StoredProgress>, AppError> {
    let row: Option<(String, i64)> =
        sqlx::query_as("SELECT state, version FROM quiz_progress WHERE user_id = ? AND mode = ?")
            .bind(user_id)
            .bind(mode.as_str())
            .fetch_optional(pool)
            .await?;

    match row {
        Some((json, version)) => match serde_json::from_str(&json) {
            Ok(progress) => Ok(Some(StoredProgress { progress, version })),
            Err(e) => {
                // Unreadable state is dropped so the user can start over.
                tracing::warn!("Discarding corrupt {} progress for user {}: {}", mode.as_str(), user_id, e);
                clear_progress(pool, user_id, mode).await?;
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// Stores a fresh run, replacing any run the user holds in the same mode.
pub async fn save_progress(pool: &SqlitePool, user_id: i64, progress: &QuizProgress) -> Result<(), AppError> {
    let state = serde_json::to_string(progress)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO quiz_progress (user_id, mode, state, version, updated_at)
        VALUES (?, ?, ?, 0, ?)
        ON CONFLICT(user_id, mode) DO UPDATE SET
            state = excluded.state,
            version = quiz_progress.version + 1,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(progress.mode.as_str())
    .bind(state)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Overwrites the run only if its row is still at `expected_version`.
/// Returns `false` when another request changed it first.
pub async fn update_progress(
    conn: &mut SqliteConnection,
    user_id: i64,
    progress: &QuizProgress,
    expected_version: i64,
) -> Result<bool, AppError> {
    let state = serde_json::to_string(progress)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let result = sqlx::query(
        r#"
        UPDATE quiz_progress
        SET state = ?, version = version + 1, updated_at = ?
        WHERE user_id = ? AND mode = ? AND version = ?
        "#,
    )
    .bind(state)
    .bind(Utc::now())
    .bind(user_id)
    .bind(progress.mode.as_str())
    .bind(expected_version)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Deletes the run only if its row is still at `expected_version`.
pub async fn remove_progress(
    conn: &mut SqliteConnection,
    user_id: i64,
    mode: QuizMode,
    expected_version: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM quiz_progress WHERE user_id = ? AND mode = ? AND version = ?")
        .bind(user_id)
        .bind(mode.as_str())
        .bind(expected_version)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn clear_progress(pool: &SqlitePool, user_id: i64, mode: QuizMode) -> Result<(), AppError> {
    sqlx::query("DELETE FROM quiz_progress WHERE user_id = ? AND mode = ?")
        .bind(user_id)
        .bind(mode.as_str())
        .execute(pool)
        .await?;

    Ok(())
}
