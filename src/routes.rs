// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{adaptive, analytics, auth, dashboard, quiz},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Auth routes are public; everything else sits behind `auth_middleware`.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, question generator, mailer).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/verify-otp", post(auth::verify_otp))
        .route("/resend-otp", post(auth::resend_otp))
        .route("/login", post(auth::login));

    let quiz_routes = Router::new()
        .route("/start", post(quiz::start_quiz))
        .route("/current", get(quiz::current_quiz))
        .route("/answer", post(quiz::submit_answer))
        .route("/finish", post(quiz::finish_quiz));

    let adaptive_routes = Router::new()
        .route("/start", post(adaptive::start_adaptive))
        .route("/current", get(adaptive::current_adaptive))
        .route("/answer", post(adaptive::submit_adaptive_answer))
        .route("/finish", post(adaptive::finish_adaptive));

    let analytics_routes = Router::new()
        .route("/weak-areas", get(analytics::weak_areas))
        .route("/recommendations", get(analytics::recommendations))
        .route("/insights", get(analytics::insights));

    let protected_routes = Router::new()
        .route("/dashboard", get(dashboard::dashboard))
        .route("/practice", get(dashboard::practice_entry))
        .nest("/quiz", quiz_routes)
        .nest("/adaptive", adaptive_routes)
        .nest("/analytics", analytics_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
