// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, attempt, auth, quiz, results},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, quizzes, attempts, results, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store, config, live sessions).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        // Protected quiz routes
        .merge(
            Router::new()
                .route("/{id}/attempts", post(quiz::start_attempt))
                .layer(require_auth.clone()),
        );

    let attempt_routes = Router::new()
        .route("/{token}", get(attempt::get_attempt))
        .route("/{token}/question", get(attempt::current_question))
        .route("/{token}/answers", post(attempt::submit_answer))
        .route("/{token}/end", post(attempt::end_attempt))
        .route("/{token}/submit", post(attempt::submit_attempt))
        .layer(require_auth.clone());

    let result_routes = Router::new()
        .route("/", get(results::my_results))
        .route("/{id}", get(results::get_result))
        .route("/{id}/report.csv", get(results::result_csv))
        .layer(require_auth.clone());

    let admin_routes = Router::new()
        .route("/quizzes", post(admin::create_quiz))
        .route("/quizzes/{id}", delete(admin::delete_quiz))
        .route("/quizzes/{id}/questions", post(admin::add_question))
        .route("/quizzes/{id}/results", get(admin::quiz_results))
        .route("/quizzes/{id}/report.csv", get(admin::quiz_report_csv))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(require_auth);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/results", result_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
