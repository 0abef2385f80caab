// src/handlers/dashboard.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    analytics::dashboard::build_dashboard,
    error::AppError,
    store::{
        attempts::{attempts_for_user, has_attempts},
        sessions::sessions_for_user,
    },
    utils::jwt::Claims,
};

pub async fn dashboard(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let attempts = attempts_for_user(&pool, user_id).await?;
    let sessions = sessions_for_user(&pool, user_id).await?;

    Ok(Json(json!({
        "username": claims.username,
        "dashboard": build_dashboard(&attempts, &sessions)
    })))
}

/// First-time users go to the static quiz, returning users to recommendations.
pub async fn practice_entry(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let next = if has_attempts(&pool, claims.user_id()?).await? {
        "recommendations"
    } else {
        "quiz"
    };

    Ok(Json(json!({ "next": next })))
}
