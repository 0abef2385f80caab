// src/handlers/quiz.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use rand::seq::SliceRandom;
use serde::Serialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    bank,
    error::AppError,
    models::{
        attempt::NewAttempt,
        quiz_progress::{AnswerResponse, QuizMode, QuizProgress, SubmitAnswerRequest},
        quiz_session::QuizSummary,
    },
    store::{
        attempts::insert_attempt,
        progress::{StoredProgress, load_progress, remove_progress, save_progress, update_progress},
        sessions::insert_session,
    },
    utils::jwt::Claims,
};

/// DTO returned when a run is finished.
#[derive(Debug, Serialize)]
pub struct FinishResponse {
    pub mode: QuizMode,
    pub summary: QuizSummary,

    /// `None` when the run had no answers and nothing was recorded.
    pub session_id: Option<i64>,
}

/// Starts a fresh static run over the whole bank in random order.
///
/// Any unfinished static run is replaced.
pub async fn start_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let progress = new_static_run(&pool, user_id).await?;

    Ok(Json(progress.view()))
}

/// Resumes the current static run, starting one if none exists.
pub async fn current_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let progress = match load_progress(&pool, user_id, QuizMode::Static).await? {
        Some(stored) => stored.progress,
        None => new_static_run(&pool, user_id).await?,
    };

    Ok(Json(progress.view()))
}

pub async fn submit_answer(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let response = answer_in_mode(&pool, user_id, QuizMode::Static, payload).await?;

    Ok(Json(response))
}

pub async fn finish_quiz(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let response = finish_in_mode(&pool, user_id, QuizMode::Static).await?;

    Ok(Json(response))
}

async fn new_static_run(pool: &SqlitePool, user_id: i64) -> Result<QuizProgress, AppError> {
    let mut questions = bank::all_questions().to_vec();
    questions.shuffle(&mut rand::rng());

    let progress = QuizProgress::new(QuizMode::Static, questions);
    save_progress(pool, user_id, &progress).await?;

    tracing::info!("User {} started static quiz run {}", user_id, progress.run_id);
    Ok(progress)
}

/// Grades one answer against the user's run in `mode`, records the attempt
/// and advances the run.
///
/// The attempt and the new run state are written in one transaction, and
/// the state write only applies to the version that was graded. A request
/// that loses the race gets a 409 and records nothing.
pub(crate) async fn answer_in_mode(
    pool: &SqlitePool,
    user_id: i64,
    mode: QuizMode,
    payload: SubmitAnswerRequest,
) -> Result<AnswerResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let StoredProgress {
        mut progress,
        version,
    } = load_progress(pool, user_id, mode)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No {} quiz in progress", mode.as_str())))?;

    let entry = progress.record_answer(
        payload.run_id,
        &payload.question_id,
        payload.selected_option,
        payload.time_taken,
    )?;

    let (explanation, difficulty) = progress
        .questions
        .iter()
        .find(|q| q.id == entry.question_id)
        .map(|q| (q.explanation.clone(), q.difficulty))
        .ok_or_else(|| AppError::InternalServerError("Answered question missing from run".to_string()))?;

    let mut tx = pool.begin().await?;

    // The state write goes first so the transaction takes the write lock
    // before anything else.
    if !update_progress(&mut *tx, user_id, &progress, version).await? {
        return Err(run_changed());
    }

    insert_attempt(
        &mut *tx,
        &NewAttempt {
            user_id,
            question_id: entry.question_id.clone(),
            topic: entry.topic.clone(),
            difficulty: difficulty.as_str().to_string(),
            selected_option: i64::from(entry.selected_option),
            correct_answer: i64::from(entry.correct_answer),
            time_taken: i64::from(entry.time_taken),
        },
    )
    .await?;

    tx.commit().await?;

    Ok(AnswerResponse {
        is_correct: entry.is_correct,
        correct_answer: entry.correct_answer,
        explanation,
        completed: progress.is_complete(),
        next: progress.view(),
    })
}

/// Closes the user's run in `mode`. A session row is written only if the
/// run has at least one answer.
pub(crate) async fn finish_in_mode(
    pool: &SqlitePool,
    user_id: i64,
    mode: QuizMode,
) -> Result<FinishResponse, AppError> {
    let StoredProgress { progress, version } = load_progress(pool, user_id, mode)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No {} quiz in progress", mode.as_str())))?;

    let mut tx = pool.begin().await?;

    if !remove_progress(&mut *tx, user_id, mode, version).await? {
        return Err(run_changed());
    }

    let summary = progress.summary();
    let session_id = if progress.answers.is_empty() {
        None
    } else {
        Some(insert_session(&mut *tx, user_id, mode, &summary).await?)
    };

    tx.commit().await?;

    tracing::info!(
        "User {} finished {} run {}: {}/{} correct",
        user_id,
        mode.as_str(),
        progress.run_id,
        summary.correct_answers,
        summary.total_questions
    );

    Ok(FinishResponse {
        mode,
        summary,
        session_id,
    })
}

fn run_changed() -> AppError {
    AppError::Conflict("Quiz run changed by another request. Reload the current question.".to_string())
}
