// src/handlers/auth.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::{Config, OTP_TTL_MINUTES},
    error::AppError,
    models::user::{EmailOtp, LoginRequest, RegisterRequest, ResendOtpRequest, User, VerifyOtpRequest},
    utils::{
        jwt::sign_jwt,
        mail::{Email, Mailer},
        otp::{OtpVerdict, check_otp, generate_otp},
        password::{hash_password, validate_password_strength, verify_password},
        redirect::safe_redirect_target,
    },
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Registers a new, inactive user and emails a verification code.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created. If the code cannot be delivered the user is removed again.
pub async fn register(
    State(pool): State<SqlitePool>,
    State(mailer): State<Arc<dyn Mailer>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_lowercase();

    if username.is_empty() || email.is_empty() || payload.password.is_empty() || payload.password2.is_empty() {
        return Err(AppError::BadRequest("All fields are required.".to_string()));
    }
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    if payload.password != payload.password2 {
        return Err(AppError::BadRequest("Passwords do not match.".to_string()));
    }

    let problems = validate_password_strength(&payload.password, &username);
    if !problems.is_empty() {
        return Err(AppError::BadRequest(problems.join(" ")));
    }

    let taken: Option<(String, String)> =
        sqlx::query_as("SELECT username, email FROM users WHERE username = ? OR email = ?")
            .bind(&username)
            .bind(&email)
            .fetch_optional(&pool)
            .await?;

    if let Some((existing_username, _)) = taken {
        return Err(if existing_username.eq_ignore_ascii_case(&username) {
            AppError::Conflict(format!("Username '{}' already exists", username))
        } else {
            AppError::Conflict("Email is already registered".to_string())
        });
    }

    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password, is_active, created_at)
        VALUES (?, ?, ?, 0, ?)
        RETURNING id, username, email, password, is_active, created_at
        "#,
    )
    .bind(&username)
    .bind(&email)
    .bind(&hashed_password)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            AppError::Conflict(format!("Username '{}' already exists", username))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    if let Err(e) = issue_otp(&pool, mailer.as_ref(), &user).await {
        tracing::error!("Failed to deliver verification code to {}: {:?}", user.email, e);
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user.id)
            .execute(&pool)
            .await?;
        return Err(AppError::ServiceUnavailable(
            "Could not send verification email. Please try again.".to_string(),
        ));
    }

    tracing::info!("Registered user {} (pending verification)", user.username);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Account created. OTP sent to your email. Please verify to continue.",
            "user": user,
            "verification_required": true
        })),
    ))
}

/// Confirms a registration code and activates the account.
pub async fn verify_otp(
    State(pool): State<SqlitePool>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = find_user(&pool, &payload.username)
        .await?
        .ok_or_else(|| AppError::NotFound("No pending verification for this user".to_string()))?;

    let pending = sqlx::query_as::<_, EmailOtp>(
        "SELECT user_id, code, expires_at, attempts FROM email_otps WHERE user_id = ?",
    )
    .bind(user.id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("No pending verification for this user".to_string()))?;

    // Expired codes are rejected without spending an attempt.
    let now = Utc::now();
    if now > pending.expires_at {
        return Err(otp_expired());
    }

    // The counter is bumped in the database so parallel guesses each see
    // their own count.
    let otp = sqlx::query_as::<_, EmailOtp>(
        r#"
        UPDATE email_otps SET attempts = attempts + 1
        WHERE user_id = ?
        RETURNING user_id, code, expires_at, attempts
        "#,
    )
    .bind(user.id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("No pending verification for this user".to_string()))?;

    match check_otp(&otp, &payload.otp, now) {
        OtpVerdict::Accepted => {
            let mut tx = pool.begin().await?;
            sqlx::query("UPDATE users SET is_active = 1 WHERE id = ?")
                .bind(user.id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM email_otps WHERE user_id = ?")
                .bind(user.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;

            tracing::info!("User {} verified their email", user.username);
            Ok(Json(json!({ "message": "Email verified successfully! Please log in." })))
        }
        OtpVerdict::Mismatch => Err(AppError::BadRequest("Invalid OTP. Please try again.".to_string())),
        OtpVerdict::Expired => Err(otp_expired()),
        OtpVerdict::TooManyAttempts => Err(AppError::BadRequest(
            "Too many attempts. Please request a new OTP.".to_string(),
        )),
    }
}

/// Issues a fresh code unless the account is already active.
pub async fn resend_otp(
    State(pool): State<SqlitePool>,
    State(mailer): State<Arc<dyn Mailer>>,
    Json(payload): Json<ResendOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = find_user(&pool, &payload.username)
        .await?
        .ok_or_else(|| AppError::NotFound("No verification session found. Please register again.".to_string()))?;

    if user.is_active {
        clear_otp(&pool, user.id).await?;
        return Ok(Json(json!({
            "message": "Account already verified. Please log in.",
            "already_verified": true
        })));
    }

    issue_otp(&pool, mailer.as_ref(), &user).await.map_err(|e| {
        tracing::error!("Failed to resend verification code: {:?}", e);
        AppError::ServiceUnavailable("Could not resend OTP right now. Please try again.".to_string())
    })?;

    Ok(Json(json!({
        "message": "New OTP sent to your email.",
        "already_verified": false
    })))
}

/// Authenticates a user and returns a JWT token.
///
/// Unverified accounts with a correct password get a fresh code and a 403.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    State(mailer): State<Arc<dyn Mailer>>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let username = payload.username.trim();
    if username.is_empty() || payload.password.is_empty() {
        return Err(AppError::BadRequest("Username and password are required.".to_string()));
    }

    let user = find_user(&pool, username)
        .await?
        .ok_or_else(|| AppError::AuthError(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
    }

    if !user.is_active {
        issue_otp(&pool, mailer.as_ref(), &user).await.map_err(|e| {
            tracing::error!("Failed to send verification code on login: {:?}", e);
            AppError::ServiceUnavailable(
                "Account not verified and OTP could not be sent. Please try again.".to_string(),
            )
        })?;

        return Err(AppError::VerificationRequired(
            "Account not verified. OTP sent to your email.".to_string(),
        ));
    }

    let token = sign_jwt(user.id, &user.username, &config.jwt_secret, config.jwt_expiration)?;

    let host = headers.get(header::HOST).and_then(|h| h.to_str().ok());
    let redirect_to = safe_redirect_target(payload.next.as_deref(), host);

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "redirect_to": redirect_to
    })))
}

async fn find_user(pool: &SqlitePool, username: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password, is_active, created_at FROM users WHERE username = ?",
    )
    .bind(username.trim())
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Replaces any pending code for `user` and mails the new one.
async fn issue_otp(pool: &SqlitePool, mailer: &dyn Mailer, user: &User) -> Result<(), AppError> {
    let code = generate_otp();
    let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);

    sqlx::query(
        r#"
        INSERT INTO email_otps (user_id, code, expires_at, attempts)
        VALUES (?, ?, ?, 0)
        ON CONFLICT(user_id) DO UPDATE SET code = excluded.code, expires_at = excluded.expires_at, attempts = 0
        "#,
    )
    .bind(user.id)
    .bind(&code)
    .bind(expires_at)
    .execute(pool)
    .await?;

    mailer
        .send(Email::verification_code(&user.email, &code))
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))
}

fn otp_expired() -> AppError {
    AppError::BadRequest("OTP has expired. Please request a new one.".to_string())
}

async fn clear_otp(pool: &SqlitePool, user_id: i64) -> Result<(), AppError> {
    sqlx::query("DELETE FROM email_otps WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}
