// tests/api_tests.rs

mod common;

use adaptive_quiz::bank;
use common::{PASSWORD, offline_generator, spawn_app, spawn_app_with};
use serde_json::{Value, json};
use tokio::task::JoinSet;

#[tokio::test]
async fn health_check_404() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_verify_login_flow() {
    let app = spawn_app().await;

    let response = app.register("alice").await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["verification_required"], true);
    assert!(body["user"].get("password").is_none());

    // Not verified yet: correct password still gets a 403 and a new code.
    let response = app.login("alice", None).await;
    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["verification_required"], true);
    assert_eq!(app.mailer.sent().len(), 2);

    let otp = app.last_otp("alice");
    let response = app.verify("alice", &otp).await;
    assert_eq!(response.status().as_u16(), 200);

    let response = app.login("ALICE", Some("/quiz")).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["type"], "Bearer");
    assert_eq!(body["redirect_to"], "/quiz");
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn login_ignores_offsite_redirect() {
    let app = spawn_app().await;
    app.signed_in_user("bob").await;

    let body: Value = app
        .login("bob", Some("https://evil.example/steal"))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["redirect_to"], "/dashboard");
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = spawn_app().await;
    app.signed_in_user("carol").await;

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "username": "carol", "password": "not-the-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "username": "carol" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn register_rejects_weak_or_mismatched_passwords() {
    let app = spawn_app().await;

    for (password, password2) in [("12345678", "12345678"), ("dave-secret", "dave-secret"), (PASSWORD, "Different-99")] {
        let response = app
            .client
            .post(app.url("/api/auth/register"))
            .json(&json!({
                "username": "dave",
                "email": "dave@example.com",
                "password": password,
                "password2": password2
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), 400, "password {:?}", password);
    }

    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn register_rejects_duplicates_case_insensitively() {
    let app = spawn_app().await;
    assert_eq!(app.register("erin").await.status().as_u16(), 201);

    let response = app
        .client
        .post(app.url("/api/auth/register"))
        .json(&json!({
            "username": "ERIN",
            "email": "someone-else@example.com",
            "password": PASSWORD,
            "password2": PASSWORD
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn failed_mail_delivery_rolls_back_registration() {
    let app = spawn_app().await;
    app.mailer.set_failing(true);

    assert_eq!(app.register("frank").await.status().as_u16(), 503);

    // The username is free again once mail works.
    app.mailer.set_failing(false);
    assert_eq!(app.register("frank").await.status().as_u16(), 201);
}

#[tokio::test]
async fn otp_attempts_are_limited() {
    let app = spawn_app().await;
    app.register("grace").await;
    let otp = app.last_otp("grace");
    let wrong = if otp == "000000" { "111111" } else { "000000" };

    for _ in 0..5 {
        assert_eq!(app.verify("grace", wrong).await.status().as_u16(), 400);
    }

    // Sixth attempt is over the limit even with the right code.
    let response = app.verify("grace", &otp).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Too many attempts"));

    // A resent code resets the counter.
    let response = app
        .client
        .post(app.url("/api/auth/resend-otp"))
        .json(&json!({ "username": "grace" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let otp = app.last_otp("grace");
    assert_eq!(app.verify("grace", &otp).await.status().as_u16(), 200);

    // Already active: resend reports it instead of mailing.
    let sent = app.mailer.sent().len();
    let body: Value = app
        .client
        .post(app.url("/api/auth/resend-otp"))
        .json(&json!({ "username": "grace" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["already_verified"], true);
    assert_eq!(app.mailer.sent().len(), sent);
}

#[tokio::test]
async fn parallel_otp_guesses_share_one_attempt_budget() {
    let app = spawn_app().await;
    app.register("heidi").await;
    let otp = app.last_otp("heidi");
    let wrong = if otp == "000000" { "111111" } else { "000000" };

    let mut guesses = JoinSet::new();
    for _ in 0..30 {
        let client = app.client.clone();
        let url = app.url("/api/auth/verify-otp");
        guesses.spawn(async move {
            client
                .post(url)
                .json(&json!({ "username": "heidi", "otp": wrong }))
                .send()
                .await
                .expect("Failed to execute request")
                .status()
                .as_u16()
        });
    }
    while let Some(status) = guesses.join_next().await {
        assert_eq!(status.unwrap(), 400);
    }

    let response = app.verify("heidi", &otp).await;
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Too many attempts"));
}

#[tokio::test]
async fn verify_without_pending_code_is_404() {
    let app = spawn_app().await;
    assert_eq!(app.verify("nobody", "123456").await.status().as_u16(), 404);
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = spawn_app().await;

    for path in ["/api/dashboard", "/api/quiz/current", "/api/analytics/weak-areas"] {
        let response = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 401, "{}", path);
    }

    let response = app.get("/api/dashboard", "not-a-jwt").await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn new_user_has_empty_analytics() {
    let app = spawn_app().await;
    let token = app.signed_in_user("heidi").await;

    let body: Value = app.get("/api/analytics/weak-areas", &token).await.json().await.unwrap();
    assert_eq!(body["topic_analysis"], json!([]));
    assert_eq!(
        body["recommendations"]["message"],
        "Start practicing to get personalized recommendations!"
    );
    assert_eq!(body["recommendations"]["high_priority"], json!([]));

    let body: Value = app.get("/api/practice", &token).await.json().await.unwrap();
    assert_eq!(body["next"], "quiz");

    let body: Value = app.get("/api/dashboard", &token).await.json().await.unwrap();
    assert_eq!(body["dashboard"]["total_attempted"], 0);
    assert_eq!(body["dashboard"]["accuracy"], 0.0);

    let body: Value = app.get("/api/analytics/insights", &token).await.json().await.unwrap();
    assert_eq!(body["features"], json!([]));
    assert!(body["progress"].is_null());
}

#[tokio::test]
async fn static_quiz_flow_records_history() {
    let app = spawn_app().await;
    let token = app.signed_in_user("ivan").await;

    let state: Value = app.post("/api/quiz/start", &token, json!({})).await.json().await.unwrap();
    assert_eq!(state["total_questions"], 10);
    assert_eq!(state["current_question_num"], 1);
    assert!(state["question"].get("correct_answer").is_none());

    // Resuming returns the same run.
    let resumed: Value = app.get("/api/quiz/current", &token).await.json().await.unwrap();
    assert_eq!(resumed["run_id"], state["run_id"]);

    let run_id = state["run_id"].clone();
    let mut current = state;
    let mut answered_right = 0;

    for i in 0..10 {
        let question_id = current["question"]["id"].as_str().unwrap().to_string();
        let correct = bank::question_by_id(&question_id).unwrap().correct_answer;
        // Get the first half right, the rest wrong.
        let selected = if i < 5 { correct } else { (correct + 1) % 4 };

        let response = app
            .post(
                "/api/quiz/answer",
                &token,
                json!({
                    "run_id": run_id,
                    "question_id": question_id,
                    "selected_option": selected,
                    "time_taken": 20
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["correct_answer"], correct);
        if body["is_correct"] == true {
            answered_right += 1;
        }
        current = body["next"].clone();
    }

    assert_eq!(answered_right, 5);
    assert_eq!(current["completed"], true);

    let body: Value = app.post("/api/quiz/finish", &token, json!({})).await.json().await.unwrap();
    assert_eq!(body["summary"]["correct_answers"], 5);
    assert_eq!(body["summary"]["total_questions"], 10);
    assert_eq!(body["summary"]["accuracy"], 50.0);
    assert_eq!(body["summary"]["total_time"], 200);
    assert!(body["session_id"].is_i64());

    let body: Value = app.get("/api/practice", &token).await.json().await.unwrap();
    assert_eq!(body["next"], "recommendations");

    let body: Value = app.get("/api/analytics/weak-areas", &token).await.json().await.unwrap();
    let topics = body["topic_analysis"].as_array().unwrap();
    assert_eq!(topics.len(), 4);
    let total: u64 = topics.iter().map(|t| t["total_attempts"].as_u64().unwrap()).sum();
    assert_eq!(total, 10);

    let body: Value = app.get("/api/dashboard", &token).await.json().await.unwrap();
    assert_eq!(body["dashboard"]["total_attempted"], 10);
    assert_eq!(body["dashboard"]["accuracy"], 50.0);
    assert_eq!(body["dashboard"]["recent_sessions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn stale_answers_are_rejected() {
    let app = spawn_app().await;
    let token = app.signed_in_user("judy").await;

    let first: Value = app.post("/api/quiz/start", &token, json!({})).await.json().await.unwrap();
    let second: Value = app.post("/api/quiz/start", &token, json!({})).await.json().await.unwrap();
    assert_ne!(first["run_id"], second["run_id"]);

    // Answer aimed at the replaced run.
    let response = app
        .post(
            "/api/quiz/answer",
            &token,
            json!({
                "run_id": first["run_id"],
                "question_id": first["question"]["id"],
                "selected_option": 0
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);

    // Right run, wrong question.
    let response = app
        .post(
            "/api/quiz/answer",
            &token,
            json!({
                "run_id": second["run_id"],
                "question_id": "not-the-current-question",
                "selected_option": 0
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);

    // Out-of-range option.
    let response = app
        .post(
            "/api/quiz/answer",
            &token,
            json!({
                "run_id": second["run_id"],
                "question_id": second["question"]["id"],
                "selected_option": 7
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn parallel_identical_answers_record_one_attempt() {
    let app = spawn_app().await;
    let token = app.signed_in_user("mallory").await;

    let state: Value = app.post("/api/quiz/start", &token, json!({})).await.json().await.unwrap();
    let answer = json!({
        "run_id": state["run_id"],
        "question_id": state["question"]["id"],
        "selected_option": 0,
        "time_taken": 12
    });

    let mut submissions = JoinSet::new();
    for _ in 0..8 {
        let client = app.client.clone();
        let url = app.url("/api/quiz/answer");
        let token = token.clone();
        let answer = answer.clone();
        submissions.spawn(async move {
            client
                .post(url)
                .bearer_auth(token)
                .json(&answer)
                .send()
                .await
                .expect("Failed to execute request")
                .status()
                .as_u16()
        });
    }

    let mut statuses = Vec::new();
    while let Some(status) = submissions.join_next().await {
        statuses.push(status.unwrap());
    }
    assert_eq!(statuses.iter().filter(|s| **s == 200).count(), 1, "{:?}", statuses);
    assert!(statuses.iter().all(|s| *s == 200 || *s == 409), "{:?}", statuses);

    let current: Value = app.get("/api/quiz/current", &token).await.json().await.unwrap();
    assert_eq!(current["current_question_num"], 2);

    let body: Value = app.get("/api/dashboard", &token).await.json().await.unwrap();
    assert_eq!(body["dashboard"]["total_attempted"], 1);
}

#[tokio::test]
async fn parallel_finishes_write_one_session() {
    let app = spawn_app().await;
    let token = app.signed_in_user("niaj").await;

    let state: Value = app.post("/api/quiz/start", &token, json!({})).await.json().await.unwrap();
    let response = app
        .post(
            "/api/quiz/answer",
            &token,
            json!({
                "run_id": state["run_id"],
                "question_id": state["question"]["id"],
                "selected_option": 1,
                "time_taken": 9
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let mut finishes = JoinSet::new();
    for _ in 0..6 {
        let client = app.client.clone();
        let url = app.url("/api/quiz/finish");
        let token = token.clone();
        finishes.spawn(async move {
            client
                .post(url)
                .bearer_auth(token)
                .json(&json!({}))
                .send()
                .await
                .expect("Failed to execute request")
                .status()
                .as_u16()
        });
    }

    let mut statuses = Vec::new();
    while let Some(status) = finishes.join_next().await {
        statuses.push(status.unwrap());
    }
    assert_eq!(statuses.iter().filter(|s| **s == 200).count(), 1, "{:?}", statuses);
    assert!(statuses.iter().all(|s| matches!(s, 200 | 404 | 409)), "{:?}", statuses);

    let body: Value = app.get("/api/dashboard", &token).await.json().await.unwrap();
    assert_eq!(body["dashboard"]["recent_sessions"].as_array().unwrap().len(), 1);
    assert_eq!(body["dashboard"]["total_attempted"], 1);
}

#[tokio::test]
async fn finishing_unanswered_run_writes_no_session() {
    let app = spawn_app().await;
    let token = app.signed_in_user("ken").await;

    app.post("/api/quiz/start", &token, json!({})).await;
    let body: Value = app.post("/api/quiz/finish", &token, json!({})).await.json().await.unwrap();
    assert!(body["session_id"].is_null());
    assert_eq!(body["summary"]["answered"], 0);

    // Progress is gone.
    let response = app.post("/api/quiz/finish", &token, json!({})).await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn adaptive_quiz_falls_back_to_static_bank() {
    let app = spawn_app().await;
    let token = app.signed_in_user("leo").await;

    // No history: targets Logical Reasoning.
    let state: Value = app.post("/api/adaptive/start", &token, json!({})).await.json().await.unwrap();
    assert_eq!(state["mode"], "adaptive");
    assert_eq!(state["total_questions"], 3);
    assert_eq!(state["question"]["source"], "Static Fallback");
    assert_eq!(state["question"]["topic"], "Logical Reasoning");

    let question_id = state["question"]["id"].as_str().unwrap().to_string();
    assert!(question_id.starts_with("fallback_Logical Reasoning_"));

    let response = app
        .post(
            "/api/adaptive/answer",
            &token,
            json!({
                "run_id": state["run_id"],
                "question_id": question_id,
                "selected_option": 1,
                "time_taken": 15
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let body: Value = app.post("/api/adaptive/finish", &token, json!({})).await.json().await.unwrap();
    assert_eq!(body["mode"], "adaptive");
    assert_eq!(body["summary"]["answered"], 1);

    // A requested topic is honoured.
    let state: Value = app
        .post("/api/adaptive/start?topic=Pattern%20Recognition", &token, json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(state["total_questions"], 2);
    assert_eq!(state["question"]["topic"], "Pattern Recognition");
}

#[tokio::test]
async fn adaptive_quiz_without_fallback_is_unavailable() {
    let app = spawn_app_with(offline_generator(false)).await;
    let token = app.signed_in_user("mallory").await;

    let response = app.post("/api/adaptive/start", &token, json!({})).await;
    assert_eq!(response.status().as_u16(), 503);
}
