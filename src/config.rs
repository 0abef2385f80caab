// src/config.rs

use std::{env, fmt, str::FromStr};

use dotenvy::dotenv;

/// Lifetime of a registration OTP.
pub const OTP_TTL_MINUTES: i64 = 10;

/// Wrong guesses allowed before an OTP must be re-issued.
pub const OTP_MAX_ATTEMPTS: i64 = 5;

/// Questions per adaptive quiz run.
pub const ADAPTIVE_QUESTION_COUNT: usize = 5;

/// Topics below this accuracy count as weak areas on the dashboard.
pub const DASHBOARD_WEAK_ACCURACY: f64 = 60.0;

/// Oldest sessions plotted in the dashboard accuracy trend.
pub const TREND_SESSION_LIMIT: usize = 10;

/// Latest sessions listed on the dashboard.
pub const RECENT_SESSION_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub ai: AiConfig,
    pub mail_from: String,
}

/// Settings for the hosted LLM question source.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// No key means every generation request is served from the static bank.
    pub api_key: Option<String>,
    pub base_url: String,
    /// Tried in order; each model gets `attempts_per_model` calls.
    pub models: Vec<String>,
    pub attempts_per_model: u32,
    pub timeout_secs: u64,
    pub fallback_enabled: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            models: vec!["llama-3.3-70b-versatile".to_string()],
            attempts_per_model: 3,
            timeout_secs: 30,
            fallback_enabled: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value } => write!(f, "{} has invalid value '{}'", key, value),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://quiz.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiration = parse_var("JWT_EXPIRATION", 86_400)?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let defaults = AiConfig::default();
        let ai = AiConfig {
            api_key: env::var("GROQ_API_KEY").ok().filter(|key| !key.trim().is_empty()),
            base_url: env::var("GROQ_BASE_URL").unwrap_or(defaults.base_url),
            models: env::var("AI_MODELS")
                .ok()
                .map(|raw| parse_model_list(&raw))
                .filter(|models| !models.is_empty())
                .unwrap_or(defaults.models),
            attempts_per_model: parse_var("AI_ATTEMPTS_PER_MODEL", defaults.attempts_per_model)?,
            timeout_secs: parse_var("AI_TIMEOUT_SECS", defaults.timeout_secs)?,
            fallback_enabled: parse_var("AI_FALLBACK_ENABLED", defaults.fallback_enabled)?,
        };

        let mail_from =
            env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@example.com".to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            ai,
            mail_from,
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
