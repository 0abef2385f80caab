// src/utils/otp.rs

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::{config::OTP_MAX_ATTEMPTS, models::user::EmailOtp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpVerdict {
    Accepted,
    Mismatch,
    Expired,
    TooManyAttempts,
}

/// Six random digits, zero-padded.
pub fn generate_otp() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000))
}

/// Judges a submitted code. `otp.attempts` must already count this submission.
pub fn check_otp(otp: &EmailOtp, submitted: &str, now: DateTime<Utc>) -> OtpVerdict {
    if now > otp.expires_at {
        OtpVerdict::Expired
    } else if otp.attempts > OTP_MAX_ATTEMPTS {
        OtpVerdict::TooManyAttempts
    } else if otp.code == submitted.trim() {
        OtpVerdict::Accepted
    } else {
        OtpVerdict::Mismatch
    }
}
