// src/handlers/adaptive.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::SqlitePool;

use super::quiz::{answer_in_mode, finish_in_mode};
use crate::{
    ai::QuestionGenerator,
    analytics::topic_statistics,
    config::ADAPTIVE_QUESTION_COUNT,
    error::AppError,
    models::{
        question::Difficulty,
        quiz_progress::{QuizMode, QuizProgress, SubmitAnswerRequest},
    },
    store::{
        attempts::attempts_for_user,
        progress::{load_progress, save_progress},
    },
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
pub struct AdaptiveStartQuery {
    pub topic: Option<String>,
}

/// Generates a new adaptive run.
///
/// With `?topic=` the run is Easy questions on that topic; otherwise it
/// targets the user's weakest area.
pub async fn start_adaptive(
    State(pool): State<SqlitePool>,
    State(generator): State<Arc<QuestionGenerator>>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<AdaptiveStartQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let topic = query.topic.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let progress = new_adaptive_run(&pool, &generator, user_id, topic).await?;

    Ok(Json(progress.view()))
}

/// Resumes the current adaptive run, generating one if none exists.
pub async fn current_adaptive(
    State(pool): State<SqlitePool>,
    State(generator): State<Arc<QuestionGenerator>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let progress = match load_progress(&pool, user_id, QuizMode::Adaptive).await? {
        Some(stored) => stored.progress,
        None => new_adaptive_run(&pool, &generator, user_id, None).await?,
    };

    Ok(Json(progress.view()))
}

pub async fn submit_adaptive_answer(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let response = answer_in_mode(&pool, user_id, QuizMode::Adaptive, payload).await?;

    Ok(Json(response))
}

pub async fn finish_adaptive(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let response = finish_in_mode(&pool, user_id, QuizMode::Adaptive).await?;

    Ok(Json(response))
}

async fn new_adaptive_run(
    pool: &SqlitePool,
    generator: &QuestionGenerator,
    user_id: i64,
    topic: Option<&str>,
) -> Result<QuizProgress, AppError> {
    let questions = match topic {
        Some(topic) => {
            generator
                .generate_questions(topic, Difficulty::Easy, ADAPTIVE_QUESTION_COUNT)
                .await?
        }
        None => {
            let attempts = attempts_for_user(pool, user_id).await?;
            let stats = topic_statistics(&attempts);
            generator
                .generate_adaptive_questions(&stats, ADAPTIVE_QUESTION_COUNT)
                .await?
        }
    };

    if questions.is_empty() {
        return Err(AppError::ServiceUnavailable(
            "AI returned empty question list".to_string(),
        ));
    }

    let progress = QuizProgress::new(QuizMode::Adaptive, questions);
    save_progress(pool, user_id, &progress).await?;

    tracing::info!(
        "User {} started adaptive run {} with {} questions",
        user_id,
        progress.run_id,
        progress.questions.len()
    );
    Ok(progress)
}
