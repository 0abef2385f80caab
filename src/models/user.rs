// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username (case-insensitive).
    pub username: String,

    /// Unique email address, stored lowercase.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// False until the registration OTP has been confirmed.
    pub is_active: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'email_otps' table. At most one pending code per user.
#[derive(Debug, Clone, FromRow)]
pub struct EmailOtp {
    pub user_id: i64,
    pub code: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub attempts: i64,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    #[serde(default)]
    pub username: String,

    #[validate(email(message = "Enter a valid email address."))]
    #[serde(default)]
    pub email: String,

    #[validate(length(max = 128, message = "Password must be at most 128 characters."))]
    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub password2: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,

    /// Where the client wants to land after login. Only same-host targets are honoured.
    pub next: Option<String>,
}

/// DTO for confirming a registration OTP.
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 12))]
    pub otp: String,
}

/// DTO for requesting a fresh OTP.
#[derive(Debug, Deserialize, Validate)]
pub struct ResendOtpRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
}
