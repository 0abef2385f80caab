// src/ai/client.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{ChatProvider, ChatRequest, GenerationError};

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client for Groq or any OpenAI-compatible endpoint.
pub struct GroqClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GroqClient {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GenerationError::Provider(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl ChatProvider for GroqClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GenerationError::Provider(e.to_string()))?;

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Provider(e.to_string()))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(content.trim().to_string())
    }
}
