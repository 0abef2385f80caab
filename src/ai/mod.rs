// src/ai/mod.rs

//! AI-backed question generation with a static-bank fallback.

pub mod client;
pub mod generator;
pub mod parser;

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

pub use client::GroqClient;
pub use generator::{GeneratorSettings, QuestionGenerator};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of an OpenAI-compatible chat completion call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A hosted chat model. Returns the raw text of the first choice.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// No provider is configured.
    Unavailable,

    /// Transport failure, timeout or non-success status.
    Provider(String),

    /// The response did not contain a JSON array.
    Parse(String),

    /// The array parsed but no item passed validation.
    NoValidQuestions,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Unavailable => f.write_str("AI provider is not configured"),
            GenerationError::Provider(msg) => write!(f, "AI provider error: {}", msg),
            GenerationError::Parse(msg) => write!(f, "unparseable AI response: {}", msg),
            GenerationError::NoValidQuestions => f.write_str("AI returned no valid question objects"),
        }
    }
}

impl std::error::Error for GenerationError {}
