// src/utils/password.rs

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::AppError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Lowercased passwords rejected outright.
const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "passw0rd", "12345678", "123456789",
    "1234567890", "qwerty123", "qwertyuiop", "iloveyou", "sunshine", "princess",
    "football", "baseball", "welcome1", "welcome123", "abc12345", "letmein1",
    "admin123", "trustno1", "superman", "starwars", "whatever", "dragon123",
    "monkey123", "1q2w3e4r", "zaq12wsx", "aa123456", "changeme", "computer",
];

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);

    match result {
        Ok(_) => Ok(true),
        Err(_) => Ok(false),
    }
}

/// Returns every rule the password breaks, empty when it is acceptable.
pub fn validate_password_strength(password: &str, username: &str) -> Vec<String> {
    let mut problems = Vec::new();
    let lowered = password.to_lowercase();
    let user = username.to_lowercase();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        problems.push("This password is too common.".to_string());
    }
    if !user.is_empty() && !lowered.is_empty() && (lowered.contains(&user) || user.contains(&lowered)) {
        problems.push("The password is too similar to the username.".to_string());
    }

    problems
}
