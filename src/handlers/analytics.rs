// src/handlers/analytics.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    analytics::{generate_recommendations, insights::build_insights, topic_statistics},
    error::AppError,
    store::{attempts::attempts_for_user, sessions::sessions_for_user},
    utils::jwt::Claims,
};

/// Per-topic analysis, weakest first, plus recommendations.
pub async fn weak_areas(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = attempts_for_user(&pool, claims.user_id()?).await?;
    let topic_analysis = topic_statistics(&attempts);
    let recommendations = generate_recommendations(&topic_analysis);

    Ok(Json(json!({
        "topic_analysis": topic_analysis,
        "recommendations": recommendations
    })))
}

pub async fn recommendations(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = attempts_for_user(&pool, claims.user_id()?).await?;
    let recommendations = generate_recommendations(&topic_statistics(&attempts));

    Ok(Json(recommendations))
}

pub async fn insights(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let attempts = attempts_for_user(&pool, user_id).await?;
    let sessions = sessions_for_user(&pool, user_id).await?;

    Ok(Json(build_insights(&attempts, &sessions)))
}
