// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use adaptive_quiz::{
    ai::{GeneratorSettings, QuestionGenerator},
    config::{AiConfig, Config},
    routes,
    state::AppState,
    utils::mail::MemoryMailer,
};
use sqlx::sqlite::SqlitePoolOptions;

pub const PASSWORD: &str = "Orbit-Lantern-42";

pub struct TestApp {
    pub address: String,
    pub mailer: Arc<MemoryMailer>,
    pub client: reqwest::Client,
}

/// Generator with no provider: every request is served from the static bank.
pub fn offline_generator(fallback_enabled: bool) -> QuestionGenerator {
    QuestionGenerator::new(
        None,
        GeneratorSettings {
            models: vec!["llama-3.3-70b-versatile".to_string()],
            attempts_per_model: 3,
            fallback_enabled,
        },
    )
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(offline_generator(true)).await
}

/// Spawns the app on a random port backed by an in-memory SQLite database.
pub async fn spawn_app_with(generator: QuestionGenerator) -> TestApp {
    // One connection that never idles out, so the in-memory database lives
    // as long as the pool.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        ai: AiConfig::default(),
        mail_from: "noreply@example.com".to_string(),
    };

    let mailer = Arc::new(MemoryMailer::new());
    let state = AppState {
        pool,
        config,
        generator: Arc::new(generator),
        mailer: mailer.clone(),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        mailer,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, username: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": PASSWORD,
                "password2": PASSWORD
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Code from the most recent mail sent to `username`'s address.
    pub fn last_otp(&self, username: &str) -> String {
        let email = self
            .mailer
            .last_to(&format!("{}@example.com", username))
            .expect("No verification mail sent");
        email
            .body
            .split(|c: char| !c.is_ascii_digit())
            .find(|part| part.len() == 6)
            .expect("No code in mail body")
            .to_string()
    }

    pub async fn verify(&self, username: &str, otp: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/verify-otp"))
            .json(&serde_json::json!({ "username": username, "otp": otp }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, username: &str, next: Option<&str>) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({
                "username": username,
                "password": PASSWORD,
                "next": next
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Registers, verifies and logs in; returns the bearer token.
    pub async fn signed_in_user(&self, username: &str) -> String {
        assert_eq!(self.register(username).await.status().as_u16(), 201);
        let otp = self.last_otp(username);
        assert_eq!(self.verify(username, &otp).await.status().as_u16(), 200);

        let body: serde_json::Value = self.login(username, None).await.json().await.unwrap();
        body["token"].as_str().expect("Token not found").to_string()
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, token: &str, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
