// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    engine,
    error::AppError,
    handlers::attempt::AttemptView,
    sessions::SessionRegistry,
    storage::SharedStore,
    utils::jwt::Claims,
};

/// Lists the quizzes that can currently be attempted.
pub async fn list_quizzes(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    let quizzes = store.list_active_quizzes().await.map_err(|e| {
        tracing::error!("Failed to list quizzes: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(quizzes))
}

/// Starts a new attempt for the caller.
///
/// * Loads the quiz and its question pool.
/// * Draws `question_count` questions in random order with a fresh generator.
/// * Starts the clock and registers the live session under a new token.
pub async fn start_attempt(
    State(store): State<SharedStore>,
    State(sessions): State<Arc<SessionRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let now = Utc::now();
    let mut rng = StdRng::from_entropy();

    let session = engine::start_attempt(store.as_ref(), user_id, quiz_id, &mut rng, now).await?;
    let view = AttemptView::of(&session, now);
    sessions.insert(session)?;

    Ok((StatusCode::CREATED, Json(view)))
}
