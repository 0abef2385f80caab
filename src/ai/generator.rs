// src/ai/generator.rs

use std::sync::Arc;

use super::{
    ChatMessage, ChatProvider, ChatRequest, GenerationError, GroqClient,
    parser::{parse_questions_response, validate_questions},
};
use crate::{
    analytics::{Status, TopicSummary},
    bank,
    config::AiConfig,
    models::question::{Difficulty, Question, QuestionSource},
    utils::html::clean_html,
};

const SYSTEM_PROMPT: &str = "You are an expert question generator for analytical aptitude tests. \
Respond with valid JSON array only. No markdown, no commentary, \
no trailing commas, and keep all strings properly escaped.";

const FIRST_TEMPERATURE: f32 = 0.7;
const RETRY_TEMPERATURE: f32 = 0.2;
const MAX_TOKENS: u32 = 2600;

/// Characters of the last response logged after a parse failure.
const RESPONSE_SAMPLE_CHARS: usize = 250;

/// Topic used when a user has no history yet.
pub const DEFAULT_TOPIC: &str = "Logical Reasoning";

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub models: Vec<String>,
    pub attempts_per_model: u32,
    pub fallback_enabled: bool,
}

impl From<&AiConfig> for GeneratorSettings {
    fn from(config: &AiConfig) -> Self {
        Self {
            models: config.models.clone(),
            attempts_per_model: config.attempts_per_model,
            fallback_enabled: config.fallback_enabled,
        }
    }
}

pub struct QuestionGenerator {
    provider: Option<Arc<dyn ChatProvider>>,
    settings: GeneratorSettings,
}

impl QuestionGenerator {
    pub fn new(provider: Option<Arc<dyn ChatProvider>>, settings: GeneratorSettings) -> Self {
        Self { provider, settings }
    }

    /// Builds a Groq-backed generator. Without an API key every request is
    /// served from the static bank.
    pub fn from_config(config: &AiConfig) -> Self {
        let provider = config.api_key.as_deref().and_then(|key| {
            match GroqClient::new(&config.base_url, key, config.timeout_secs) {
                Ok(client) => Some(Arc::new(client) as Arc<dyn ChatProvider>),
                Err(e) => {
                    tracing::error!("Failed to initialize AI client: {}", e);
                    None
                }
            }
        });

        Self::new(provider, GeneratorSettings::from(config))
    }

    pub fn is_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Asks the provider for `count` questions, retrying across models and
    /// attempts, then falls back to the static bank.
    pub async fn generate_questions(
        &self,
        topic: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Result<Vec<Question>, GenerationError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let Some(provider) = &self.provider else {
            tracing::warn!("AI provider unavailable. Falling back to static questions.");
            return self.fall_back(topic, count, GenerationError::Unavailable);
        };

        let messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_prompt(topic, difficulty, count)),
        ];
        let total_attempts = self.settings.models.len() * self.settings.attempts_per_model as usize;

        let mut last_error = GenerationError::Unavailable;
        let mut last_response = String::new();
        let mut attempt = 0;

        for model in &self.settings.models {
            for _ in 0..self.settings.attempts_per_model {
                attempt += 1;
                if attempt > 1 {
                    tracing::info!("Retrying AI generation (attempt {}/{})", attempt, total_attempts);
                }

                let request = ChatRequest {
                    model: model.clone(),
                    messages: messages.clone(),
                    temperature: if attempt == 1 { FIRST_TEMPERATURE } else { RETRY_TEMPERATURE },
                    max_tokens: MAX_TOKENS,
                };

                let text = match provider.complete(&request).await {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(
                            "AI provider error during generation (attempt {}/{}, model {}): {}",
                            attempt,
                            total_attempts,
                            model,
                            e
                        );
                        last_error = e;
                        continue;
                    }
                };

                let items = match parse_questions_response(&text) {
                    Ok(items) => items,
                    Err(e) => {
                        tracing::warn!(
                            "JSON parse error during AI generation (attempt {}/{}): {}",
                            attempt,
                            total_attempts,
                            e
                        );
                        last_response = text;
                        last_error = e;
                        continue;
                    }
                };

                let questions = validate_questions(&items, topic, difficulty, count);
                if questions.is_empty() {
                    last_error = GenerationError::NoValidQuestions;
                    continue;
                }

                tracing::info!("Generated {} questions with model {}", questions.len(), model);
                return Ok(questions.into_iter().map(sanitize).collect());
            }
        }

        if matches!(last_error, GenerationError::Parse(_)) {
            let sample: String = last_response.chars().take(RESPONSE_SAMPLE_CHARS).collect();
            tracing::warn!("AI response sample after parse failure: {}", sample);
        } else {
            tracing::error!("Final AI generation failure: {}", last_error);
        }

        self.fall_back(topic, count, last_error)
    }

    /// Targets the user's weakest topic at a difficulty matched to their accuracy.
    pub async fn generate_adaptive_questions(
        &self,
        topic_stats: &[TopicSummary],
        count: usize,
    ) -> Result<Vec<Question>, GenerationError> {
        let (topic, difficulty) = adaptive_target(topic_stats);
        tracing::info!("Generating {} {} questions for {}", count, difficulty, topic);

        self.generate_questions(&topic, difficulty, count).await
    }

    fn fall_back(
        &self,
        topic: &str,
        count: usize,
        error: GenerationError,
    ) -> Result<Vec<Question>, GenerationError> {
        if self.settings.fallback_enabled {
            Ok(static_fallback(topic, count))
        } else {
            Err(error)
        }
    }
}

/// `topic_stats` must be weakest first, as returned by `topic_statistics`.
pub fn adaptive_target(topic_stats: &[TopicSummary]) -> (String, Difficulty) {
    let Some(weakest) = topic_stats.first() else {
        return (DEFAULT_TOPIC.to_string(), Difficulty::Easy);
    };

    match topic_stats
        .iter()
        .find(|t| matches!(t.status, Status::Weak | Status::Moderate))
    {
        Some(target) => {
            let difficulty = if target.accuracy < 40.0 {
                Difficulty::Easy
            } else if target.accuracy < 70.0 {
                Difficulty::Medium
            } else {
                Difficulty::Hard
            };
            (target.topic.clone(), difficulty)
        }
        None => (weakest.topic.clone(), Difficulty::Medium),
    }
}

/// Bank questions for `topic` (case-insensitive), or the whole bank when the
/// topic has none. Entries keep their bank topic and difficulty.
pub fn static_fallback(topic: &str, count: usize) -> Vec<Question> {
    let mut pool = bank::questions_for_topic(topic);
    if pool.is_empty() {
        pool = bank::all_questions().iter().collect();
    }

    pool.into_iter()
        .take(count)
        .enumerate()
        .map(|(i, q)| Question {
            id: format!("fallback_{}_{}", topic, i + 1),
            source: QuestionSource::StaticFallback,
            ..q.clone()
        })
        .collect()
}

fn sanitize(question: Question) -> Question {
    Question {
        question: clean_html(&question.question),
        options: question.options.iter().map(|o| clean_html(o)).collect(),
        explanation: clean_html(&question.explanation),
        ..question
    }
}

fn build_prompt(topic: &str, difficulty: Difficulty, count: usize) -> String {
    format!(
        r#"Generate {count} multiple-choice questions for a CSE analytics test.

Topic: {topic}
Difficulty: {difficulty}

Requirements:
1. Each question should have exactly 4 options
2. Provide the correct answer as an index (0, 1, 2, or 3)
3. Include a brief explanation
4. Questions should test analytical and problem-solving skills

Return ONLY a valid JSON array in this exact format (no markdown, no extra text):
[
  {{
    "question": "Question text here",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correct_answer": 0,
    "explanation": "Brief explanation here"
  }}
]"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{aggregator::tests::history, topic_statistics};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const GOOD: &str = r#"[
        {"question": "What comes next: 1, 4, 9, 16?", "options": ["20", "25", "24", "36"], "correct_answer": 1, "explanation": "Squares of 1 to 5."},
        {"question": "Odd one out?", "options": ["2", "3", "5", "9"], "correct_answer": 3, "explanation": "9 is not prime."}
    ]"#;

    struct FailingProvider;

    #[async_trait]
    impl ChatProvider for FailingProvider {
        async fn complete(&self, _request: &ChatRequest) -> Result<String, GenerationError> {
            Err(GenerationError::Provider("connection refused".to_string()))
        }
    }

    /// Replays canned responses in order and records each request.
    struct ScriptedProvider {
        responses: Mutex<Vec<String>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn new(responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.iter().rev().map(|r| r.to_string()).collect()),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn complete(&self, request: &ChatRequest) -> Result<String, GenerationError> {
            self.requests.lock().unwrap().push(request.clone());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| GenerationError::Provider("script exhausted".to_string()))
        }
    }

    fn settings(fallback_enabled: bool) -> GeneratorSettings {
        GeneratorSettings {
            models: vec!["primary".to_string()],
            attempts_per_model: 3,
            fallback_enabled,
        }
    }

    #[tokio::test]
    async fn test_failing_provider_falls_back_to_static_bank() {
        let generator = QuestionGenerator::new(Some(Arc::new(FailingProvider) as Arc<dyn ChatProvider>), settings(true));

        let questions = generator
            .generate_questions("Pattern Recognition", Difficulty::Hard, 5)
            .await
            .unwrap();

        assert_eq!(questions.len(), 2);
        assert!(questions.iter().all(|q| q.source == QuestionSource::StaticFallback));
        assert_eq!(questions[0].id, "fallback_Pattern Recognition_1");
    }

    #[tokio::test]
    async fn test_unknown_topic_falls_back_to_whole_bank() {
        let generator = QuestionGenerator::new(None, settings(true));

        let questions = generator
            .generate_questions("Astrophysics", Difficulty::Easy, 5)
            .await
            .unwrap();

        assert_eq!(questions.len(), 5);
        assert_eq!(questions[4].id, "fallback_Astrophysics_5");
    }

    #[tokio::test]
    async fn test_fallback_disabled_returns_last_error() {
        let generator = QuestionGenerator::new(Some(Arc::new(FailingProvider) as Arc<dyn ChatProvider>), settings(false));

        let result = generator.generate_questions("Logic", Difficulty::Easy, 5).await;
        assert!(matches!(result, Err(GenerationError::Provider(_))));

        let no_provider = QuestionGenerator::new(None, settings(false));
        let result = no_provider.generate_questions("Logic", Difficulty::Easy, 5).await;
        assert_eq!(result, Err(GenerationError::Unavailable));
    }

    #[tokio::test]
    async fn test_malformed_then_valid_response_succeeds_on_retry() {
        let provider = ScriptedProvider::new(&["I'm sorry, I can't do that", GOOD]);
        let generator = QuestionGenerator::new(Some(provider.clone() as Arc<dyn ChatProvider>), settings(false));

        let questions = generator
            .generate_questions("Number Series", Difficulty::Medium, 5)
            .await
            .unwrap();

        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].id, "ai_Number Series_1");
        assert_eq!(questions[1].correct_answer, 3);
        assert!(questions.iter().all(|q| q.source == QuestionSource::Ai));

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].temperature, FIRST_TEMPERATURE);
        assert_eq!(requests[1].temperature, RETRY_TEMPERATURE);
        assert_eq!(requests[0].max_tokens, MAX_TOKENS);
        assert!(requests[0].messages[1].content.contains("Difficulty: Medium"));
    }

    #[tokio::test]
    async fn test_models_are_tried_in_order() {
        let provider = ScriptedProvider::new(&["[]", "[]", GOOD]);
        let generator = QuestionGenerator::new(
            Some(provider.clone() as Arc<dyn ChatProvider>),
            GeneratorSettings {
                models: vec!["big".to_string(), "small".to_string()],
                attempts_per_model: 2,
                fallback_enabled: false,
            },
        );

        generator
            .generate_questions("Logic", Difficulty::Easy, 2)
            .await
            .unwrap();

        let models: Vec<String> = provider
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.model.clone())
            .collect();
        assert_eq!(models, vec!["big", "big", "small"]);
    }

    #[tokio::test]
    async fn test_ai_text_is_sanitized() {
        let provider = ScriptedProvider::new(&[
            r#"[{"question": "Pick one<script>alert(1)</script>", "options": ["a", "b", "c", "d"], "correct_answer": 0, "explanation": "<b>a</b> is first"}]"#,
        ]);
        let generator = QuestionGenerator::new(Some(provider as Arc<dyn ChatProvider>), settings(false));

        let questions = generator
            .generate_questions("Logic", Difficulty::Easy, 1)
            .await
            .unwrap();

        assert_eq!(questions[0].question, "Pick one");
        assert_eq!(questions[0].explanation, "<b>a</b> is first");
    }

    #[test]
    fn test_adaptive_target_without_history() {
        assert_eq!(
            adaptive_target(&[]),
            ("Logical Reasoning".to_string(), Difficulty::Easy)
        );
    }

    #[test]
    fn test_adaptive_target_picks_weak_topic_and_scales_difficulty() {
        // Series: 1/4 correct and slow, Logic: all correct and fast.
        let stats = topic_statistics(&history(&[
            ("Logic", true, 10),
            ("Logic", true, 10),
            ("Series", false, 100),
            ("Series", false, 100),
            ("Series", true, 100),
            ("Series", false, 100),
        ]));

        assert_eq!(adaptive_target(&stats), ("Series".to_string(), Difficulty::Easy));
    }

    #[test]
    fn test_adaptive_target_all_strong_uses_medium() {
        let stats = topic_statistics(&history(&[
            ("Logic", true, 10),
            ("Logic", true, 10),
            ("Series", true, 20),
        ]));

        let (topic, difficulty) = adaptive_target(&stats);
        assert_eq!(topic, stats[0].topic);
        assert_eq!(difficulty, Difficulty::Medium);
    }
}
